use crate::error::ResultsError;
use crate::models::{AlgorithmResult, ChartStyle, MetricName, NormalizedDataset};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

pub const BAR_FILL_ALPHA: f32 = 0.7;
pub const RADAR_FILL_ALPHA: f32 = 0.2;
pub const BORDER_ALPHA: f32 = 1.0;
pub const BAR_BORDER_WIDTH: f32 = 1.0;
pub const RADAR_BORDER_WIDTH: f32 = 2.0;

pub const PALETTE: [Rgba; 7] = [
    Rgba::new(54, 162, 235, BAR_FILL_ALPHA),  // blue
    Rgba::new(255, 99, 132, BAR_FILL_ALPHA),  // red
    Rgba::new(75, 192, 192, BAR_FILL_ALPHA),  // green
    Rgba::new(255, 159, 64, BAR_FILL_ALPHA),  // orange
    Rgba::new(153, 102, 255, BAR_FILL_ALPHA), // purple
    Rgba::new(255, 205, 86, BAR_FILL_ALPHA),  // yellow
    Rgba::new(201, 203, 207, BAR_FILL_ALPHA), // grey
];

pub fn palette_color(index: usize) -> Rgba {
    PALETTE[index % PALETTE.len()]
}

pub fn border_color(index: usize) -> Rgba {
    palette_color(index).with_alpha(BORDER_ALPHA)
}

pub fn radar_fill_color(index: usize) -> Rgba {
    palette_color(index).with_alpha(RADAR_FILL_ALPHA)
}

/// `f1_score` -> `F1 SCORE`. Display only.
pub fn metric_label(key: &str) -> String {
    key.replace('_', " ").to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Uniform(Rgba),
    PerPoint(Vec<Rgba>),
}

impl Paint {
    pub fn at(&self, index: usize) -> Rgba {
        match self {
            Paint::Uniform(c) => *c,
            Paint::PerPoint(colors) => colors
                .get(index)
                .copied()
                .unwrap_or_else(|| palette_color(index)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// One slot per chart label. `None` means "not reported", never zero.
    pub values: Vec<Option<f64>>,
    pub fill: Paint,
    pub border: Paint,
    pub border_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub style: ChartStyle,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

pub fn build_chart_data(
    datasets: &[NormalizedDataset],
    style: ChartStyle,
    metric: MetricName,
) -> Result<ChartData, ResultsError> {
    if datasets.is_empty() {
        return Err(ResultsError::NoData);
    }
    match (style, datasets) {
        (ChartStyle::Bar, [single]) => Ok(single_bar(single, metric)),
        (ChartStyle::Bar, many) => Ok(grouped_bar(many, metric)),
        (ChartStyle::Radar, [single]) => Ok(radar(single)),
        (ChartStyle::Radar, _) => Err(ResultsError::UnsupportedCombination),
    }
}

fn single_bar(dataset: &NormalizedDataset, metric: MetricName) -> ChartData {
    let results = &dataset.results;
    let series = Series {
        label: metric_label(metric.key()),
        values: results.iter().map(|r| r.metrics.get(metric)).collect(),
        fill: Paint::PerPoint((0..results.len()).map(palette_color).collect()),
        border: Paint::PerPoint((0..results.len()).map(border_color).collect()),
        border_width: BAR_BORDER_WIDTH,
    };

    ChartData {
        style: ChartStyle::Bar,
        labels: results.iter().map(|r| r.algorithm_name.clone()).collect(),
        series: vec![series],
    }
}

pub fn distinct_algorithms(datasets: &[NormalizedDataset]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for result in datasets.iter().flat_map(|d| d.results.iter()) {
        if !seen.contains(&result.algorithm.as_str()) {
            seen.push(&result.algorithm);
        }
    }
    seen
}

fn grouped_bar(datasets: &[NormalizedDataset], metric: MetricName) -> ChartData {
    let series = distinct_algorithms(datasets)
        .into_iter()
        .enumerate()
        .map(|(index, algorithm)| {
            let values = datasets
                .iter()
                .map(|d| match d.results.iter().find(|r| r.algorithm == algorithm) {
                    Some(result) => result.metrics.get(metric),
                    None => Some(0.0),
                })
                .collect();
            Series {
                label: metric_label(algorithm),
                values,
                fill: Paint::Uniform(palette_color(index)),
                border: Paint::Uniform(border_color(index)),
                border_width: BAR_BORDER_WIDTH,
            }
        })
        .collect();

    ChartData {
        style: ChartStyle::Bar,
        labels: datasets.iter().map(|d| d.label.clone()).collect(),
        series,
    }
}

pub fn radar_metrics(results: &[AlgorithmResult]) -> Vec<MetricName> {
    let mut metrics = MetricName::CORE.to_vec();
    if !results.is_empty() && results.iter().all(|r| r.metrics.roc_auc.is_some()) {
        metrics.push(MetricName::RocAuc);
    }
    metrics
}

fn radar(dataset: &NormalizedDataset) -> ChartData {
    let metrics = radar_metrics(&dataset.results);
    let series = dataset
        .results
        .iter()
        .enumerate()
        .map(|(index, result)| Series {
            label: result.algorithm_name.clone(),
            values: metrics.iter().map(|&m| result.metrics.get(m)).collect(),
            fill: Paint::Uniform(radar_fill_color(index)),
            border: Paint::Uniform(border_color(index)),
            border_width: RADAR_BORDER_WIDTH,
        })
        .collect();

    ChartData {
        style: ChartStyle::Radar,
        labels: metrics.iter().map(|m| metric_label(m.key())).collect(),
        series,
    }
}

pub fn metric_options(datasets: &[NormalizedDataset]) -> Vec<MetricName> {
    let mut options = MetricName::CORE.to_vec();
    let first_has_auc = datasets
        .first()
        .and_then(|d| d.results.first())
        .is_some_and(|r| r.metrics.roc_auc.is_some());
    if first_has_auc {
        options.push(MetricName::RocAuc);
    }
    options
}
