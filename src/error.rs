use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// The body decoded as JSON but matched no known comparison shape.
    #[error(transparent)]
    Results(#[from] ResultsError),
}

impl ApiError {
    pub fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, resp) => {
                let body = resp.into_string().unwrap_or_default();
                ApiError::Transport(format!("HTTP {code}: {body}"))
            }
            other => ApiError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResultsError {
    #[error("No results available")]
    NoData,

    #[error("Unrecognized response shape: {0}")]
    UnrecognizedShape(String),

    #[error("Radar charts support exactly one dataset")]
    UnsupportedCombination,

    #[error("No candidates to rank")]
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select at least one disease and one algorithm")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("Frame error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
