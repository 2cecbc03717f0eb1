use crate::error::ExportError;
use crate::models::{ConfusionMatrix, MetricSet, NormalizedDataset};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One row per (dataset, algorithm). Missing `roc_auc` and confusion counts
/// stay null.
pub fn results_frame(datasets: &[NormalizedDataset]) -> Result<DataFrame, ExportError> {
    let rows: Vec<_> = datasets
        .iter()
        .flat_map(|d| d.results.iter().map(move |r| (d.label.as_str(), r)))
        .collect();
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let dataset: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
    let algorithm: Vec<&str> = rows.iter().map(|(_, r)| r.algorithm.as_str()).collect();
    let algorithm_name: Vec<&str> = rows.iter().map(|(_, r)| r.algorithm_name.as_str()).collect();
    let metric = |f: fn(&MetricSet) -> f64| -> Vec<f64> {
        rows.iter().map(|(_, r)| f(&r.metrics)).collect()
    };
    let roc_auc: Vec<Option<f64>> = rows.iter().map(|(_, r)| r.metrics.roc_auc).collect();
    let count = |f: fn(&ConfusionMatrix) -> u64| -> Vec<Option<u64>> {
        rows.iter()
            .map(|(_, r)| r.metrics.confusion_matrix.as_ref().map(f))
            .collect()
    };

    let df = DataFrame::new(vec![
        Column::new(PlSmallStr::from("dataset"), dataset),
        Column::new(PlSmallStr::from("algorithm"), algorithm),
        Column::new(PlSmallStr::from("algorithm_name"), algorithm_name),
        Column::new(PlSmallStr::from("accuracy"), metric(|m| m.accuracy)),
        Column::new(PlSmallStr::from("precision"), metric(|m| m.precision)),
        Column::new(PlSmallStr::from("recall"), metric(|m| m.recall)),
        Column::new(PlSmallStr::from("f1_score"), metric(|m| m.f1_score)),
        Column::new(PlSmallStr::from("roc_auc"), roc_auc),
        Column::new(PlSmallStr::from("true_positive"), count(|c| c.true_positive)),
        Column::new(PlSmallStr::from("true_negative"), count(|c| c.true_negative)),
        Column::new(PlSmallStr::from("false_positive"), count(|c| c.false_positive)),
        Column::new(PlSmallStr::from("false_negative"), count(|c| c.false_negative)),
    ])?;

    Ok(df)
}

pub fn write_results_csv<P: AsRef<Path>>(
    file_path: P,
    datasets: &[NormalizedDataset],
) -> Result<usize, ExportError> {
    let mut df = results_frame(datasets)?;
    let mut file = File::create(file_path.as_ref())?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!(rows = df.height(), path = %file_path.as_ref().display(), "exported results");
    Ok(df.height())
}
