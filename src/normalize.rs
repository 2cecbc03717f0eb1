use crate::error::ResultsError;
use crate::models::{ComparisonResponse, DatasetResult, NormalizedDataset};
use serde_json::Value;
use tracing::{debug, warn};

impl ComparisonResponse {
    pub fn from_value(value: Value) -> Result<Self, ResultsError> {
        let object = match value {
            Value::Null => return Err(ResultsError::NoData),
            Value::Object(map) => map,
            other => {
                return Err(ResultsError::UnrecognizedShape(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )));
            }
        };

        if object.is_empty() {
            return Err(ResultsError::NoData);
        }

        if object.contains_key("results") {
            if !object.get("results").is_some_and(Value::is_array) {
                return Err(ResultsError::UnrecognizedShape(
                    "`results` is not an array".to_string(),
                ));
            }
            let single: DatasetResult = serde_json::from_value(Value::Object(object))
                .map_err(|e| ResultsError::UnrecognizedShape(e.to_string()))?;
            if single.results.is_empty() {
                return Err(ResultsError::NoData);
            }
            debug!(results = single.results.len(), "single-dataset response");
            return Ok(ComparisonResponse::Single(single));
        }

        if object.contains_key("disease") {
            return Err(ResultsError::UnrecognizedShape(
                "`disease` present without `results`".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(object.len());
        let mut empty = Vec::new();
        for (key, entry) in object {
            if !entry.get("results").is_some_and(Value::is_array) {
                return Err(ResultsError::UnrecognizedShape(format!(
                    "entry `{key}` has no `results` array"
                )));
            }
            let dataset: DatasetResult = serde_json::from_value(entry)
                .map_err(|e| ResultsError::UnrecognizedShape(format!("entry `{key}`: {e}")))?;
            if dataset.results.is_empty() {
                warn!(dataset = %key, "dataset returned no algorithm results");
                empty.push(dataset.disease_name.unwrap_or(key));
                continue;
            }
            entries.push((key, dataset));
        }

        if entries.is_empty() {
            return Err(ResultsError::NoData);
        }
        debug!(datasets = entries.len(), empty = empty.len(), "multi-dataset response");
        Ok(ComparisonResponse::Multi { entries, empty })
    }

    pub fn empty_labels(&self) -> &[String] {
        match self {
            ComparisonResponse::Single(_) => &[],
            ComparisonResponse::Multi { empty, .. } => empty.as_slice(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn normalize(response: ComparisonResponse) -> Vec<NormalizedDataset> {
    match response {
        ComparisonResponse::Single(dataset) => vec![NormalizedDataset {
            label: dataset.disease_name.or(dataset.disease).unwrap_or_default(),
            results: dataset.results,
        }],
        ComparisonResponse::Multi { entries, .. } => entries
            .into_iter()
            .map(|(key, dataset)| NormalizedDataset {
                label: dataset.disease_name.unwrap_or(key),
                results: dataset.results,
            })
            .collect(),
    }
}

pub fn normalize_value(value: Value) -> Result<Vec<NormalizedDataset>, ResultsError> {
    ComparisonResponse::from_value(value).map(normalize)
}
