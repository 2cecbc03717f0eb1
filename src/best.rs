use crate::error::ResultsError;
use crate::models::{AlgorithmResult, ConfusionMatrix};

/// Highest `f1_score` wins; ties keep their original order, so the earliest
/// tied entry is returned. The input is left untouched.
pub fn select_best(results: &[AlgorithmResult]) -> Result<&AlgorithmResult, ResultsError> {
    let mut ranked: Vec<&AlgorithmResult> = results.iter().collect();
    // sort_by is stable; NaN ranks last
    let score = |r: &AlgorithmResult| match r.metrics.f1_score {
        f1 if f1.is_nan() => f64::NEG_INFINITY,
        f1 => f1,
    };
    ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));
    ranked.first().copied().ok_or(ResultsError::NoCandidates)
}

pub fn best_with_confusion(
    results: &[AlgorithmResult],
) -> Result<(&AlgorithmResult, Option<ConfusionMatrix>), ResultsError> {
    let best = select_best(results)?;
    Ok((best, best.metrics.confusion_matrix))
}
