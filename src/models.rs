use crate::api::{self, ApiClient, Catalog, EpochCounter, PendingComparison, RequestEpoch};
use crate::chart;
use crate::config::{AppConfig, RunOptions};
use crate::error::{ApiError, ResultsError};
use crate::normalize::normalize;
use crate::selection::Selection;
use poll_promise::Promise;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Disease {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiseaseList {
    pub diseases: Vec<Disease>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Algorithm {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AlgorithmList {
    pub algorithms: Vec<Algorithm>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
}

#[derive(Deserialize)]
struct PartialConfusion {
    true_positive: Option<u64>,
    true_negative: Option<u64>,
    false_positive: Option<u64>,
    false_negative: Option<u64>,
}

/// A matrix missing any of its four counts is treated as absent.
fn complete_confusion<'de, D>(deserializer: D) -> Result<Option<ConfusionMatrix>, D::Error>
where
    D: Deserializer<'de>,
{
    let partial = Option::<PartialConfusion>::deserialize(deserializer)?;
    Ok(partial.and_then(|p| {
        match (p.true_positive, p.true_negative, p.false_positive, p.false_negative) {
            (Some(tp), Some(tn), Some(fp), Some(fn_)) => Some(ConfusionMatrix {
                true_positive: tp,
                true_negative: tn,
                false_positive: fp,
                false_negative: fn_,
            }),
            _ => {
                warn!("dropping incomplete confusion matrix");
                None
            }
        }
    }))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricSet {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_auc: Option<f64>,
    #[serde(
        default,
        deserialize_with = "complete_confusion",
        skip_serializing_if = "Option::is_none"
    )]
    pub confusion_matrix: Option<ConfusionMatrix>,
}

impl MetricSet {
    pub fn get(&self, metric: MetricName) -> Option<f64> {
        match metric {
            MetricName::Accuracy => Some(self.accuracy),
            MetricName::Precision => Some(self.precision),
            MetricName::Recall => Some(self.recall),
            MetricName::F1Score => Some(self.f1_score),
            MetricName::RocAuc => self.roc_auc,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AlgorithmResult {
    pub algorithm: String,
    pub algorithm_name: String,
    pub metrics: MetricSet,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    pub results: Vec<AlgorithmResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonResponse {
    Single(DatasetResult),
    /// Keyed by dataset id, in the order the backend sent them. `empty`
    /// holds the labels of entries that came back without any results.
    Multi {
        entries: Vec<(String, DatasetResult)>,
        empty: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    pub label: String,
    pub results: Vec<AlgorithmResult>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrainRequest {
    pub disease: String,
    pub algorithms: Vec<String>,
    pub test_size: f64,
    pub random_state: u64,
}

impl TrainRequest {
    pub fn new(disease: &str, algorithms: &[String]) -> Self {
        Self::with_options(disease, algorithms, RunOptions::default())
    }

    pub fn with_options(disease: &str, algorithms: &[String], options: RunOptions) -> Self {
        TrainRequest {
            disease: disease.to_string(),
            algorithms: algorithms.to_vec(),
            test_size: options.test_size,
            random_state: options.random_state,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompareRequest {
    pub diseases: Vec<String>,
    pub algorithms: Vec<String>,
    pub test_size: f64,
    pub random_state: u64,
}

impl CompareRequest {
    pub fn new(diseases: &[String], algorithms: &[String]) -> Self {
        Self::with_options(diseases, algorithms, RunOptions::default())
    }

    pub fn with_options(diseases: &[String], algorithms: &[String], options: RunOptions) -> Self {
        CompareRequest {
            diseases: diseases.to_vec(),
            algorithms: algorithms.to_vec(),
            test_size: options.test_size,
            random_state: options.random_state,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum MetricName {
    Accuracy,
    Precision,
    Recall,
    F1Score,
    RocAuc,
}

impl MetricName {
    pub const CORE: [MetricName; 4] = [
        MetricName::Accuracy,
        MetricName::Precision,
        MetricName::Recall,
        MetricName::F1Score,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MetricName::Accuracy => "accuracy",
            MetricName::Precision => "precision",
            MetricName::Recall => "recall",
            MetricName::F1Score => "f1_score",
            MetricName::RocAuc => "roc_auc",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MetricName::Accuracy => "Accuracy",
            MetricName::Precision => "Precision",
            MetricName::Recall => "Recall",
            MetricName::F1Score => "F1 Score",
            MetricName::RocAuc => "ROC AUC",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ChartStyle {
    Bar,
    Radar,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Tab {
    Chart,
    Details,
}

pub struct AppState {
    pub config: AppConfig,
    pub client: ApiClient,
    pub diseases: Vec<Disease>,
    pub algorithms: Vec<Algorithm>,
    pub selection: Selection,
    pub catalog_promise: Option<Promise<Result<Catalog, ApiError>>>,
    pub in_flight: Vec<PendingComparison>,
    pub epochs: EpochCounter,
    /// `None` until a comparison has completed.
    pub results: Option<Result<Vec<NormalizedDataset>, ResultsError>>,
    pub empty_datasets: Vec<String>,
    pub error: Option<String>,
    pub catalog_failed: bool,
    pub selected_tab: Tab,
    pub chart_style: ChartStyle,
    pub chart_metric: MetricName,
    pub export_status: Option<String>,
    pub debug_output: String,
    pub debug_panel_height: f32,
    pub debug_panel_visible: bool,
}

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load initial data. Please try again later.";
pub const COMPARE_FAILED_MESSAGE: &str = "An error occurred while comparing models. Please try again.";

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = ApiClient::from_config(&config);
        AppState {
            config,
            client,
            diseases: vec![],
            algorithms: vec![],
            selection: Selection::default(),
            catalog_promise: None,
            in_flight: vec![],
            epochs: EpochCounter::default(),
            results: None,
            empty_datasets: vec![],
            error: None,
            catalog_failed: false,
            selected_tab: Tab::Chart,
            chart_style: ChartStyle::Bar,
            chart_metric: MetricName::F1Score,
            export_status: None,
            debug_output: String::new(),
            debug_panel_height: 150.0,
            debug_panel_visible: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.catalog_promise.is_some() || !self.in_flight.is_empty()
    }

    pub fn start_initial_load(&mut self) {
        if self.catalog_promise.is_some() {
            return;
        }
        if self.catalog_failed {
            self.catalog_failed = false;
            self.error = None;
        }
        info!(api_url = %self.client.base_url(), "loading diseases and algorithms");
        self.catalog_promise = Some(api::catalog_promise(self.client.clone()));
    }

    pub fn start_comparison(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        let plan = match self.selection.plan() {
            Ok(plan) => plan,
            Err(err) => {
                self.error = Some(err.to_string());
                return false;
            }
        };

        self.error = None;
        self.results = None;
        self.empty_datasets.clear();
        self.export_status = None;
        let epoch = self.epochs.next();
        info!(?epoch, ?plan, "starting comparison");
        self.in_flight.push(api::comparison_promise(
            self.client.clone(),
            plan,
            self.config.run_options,
            epoch,
        ));
        true
    }

    pub fn apply_catalog(&mut self, result: Result<Catalog, ApiError>) {
        match result {
            Ok(catalog) => {
                self.selection = Selection::with_defaults(&catalog.diseases, &catalog.algorithms);
                self.diseases = catalog.diseases;
                self.algorithms = catalog.algorithms;
            }
            Err(err) => {
                error!(error = %err, "initial load failed");
                self.catalog_failed = true;
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub fn apply_comparison(
        &mut self,
        epoch: RequestEpoch,
        result: Result<ComparisonResponse, ApiError>,
    ) {
        if !self.epochs.is_current(epoch) {
            info!(?epoch, "discarding stale comparison result");
            return;
        }
        match result {
            Ok(response) => {
                self.empty_datasets = response.empty_labels().to_vec();
                let datasets = normalize(response);
                if !chart::metric_options(&datasets).contains(&self.chart_metric) {
                    self.chart_metric = MetricName::F1Score;
                }
                self.results = Some(Ok(datasets));
            }
            Err(ApiError::Results(err)) => {
                warn!(error = %err, "comparison returned no usable results");
                self.results = Some(Err(err));
            }
            Err(err) => {
                error!(error = %err, "comparison failed");
                self.error = Some(COMPARE_FAILED_MESSAGE.to_string());
            }
        }
    }

    pub fn poll_requests(&mut self) -> bool {
        let mut resolved = false;

        if let Some(promise) = self.catalog_promise.take() {
            match promise.try_take() {
                Ok(result) => {
                    self.apply_catalog(result);
                    resolved = true;
                }
                Err(promise) => self.catalog_promise = Some(promise),
            }
        }

        for pending in std::mem::take(&mut self.in_flight) {
            let PendingComparison { epoch, promise } = pending;
            match promise.try_take() {
                Ok(result) => {
                    self.apply_comparison(epoch, result);
                    resolved = true;
                }
                Err(promise) => self.in_flight.push(PendingComparison { epoch, promise }),
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metric_set_optional_fields() {
        let m: MetricSet = serde_json::from_value(json!({
            "accuracy": 0.9, "precision": 0.8, "recall": 0.7, "f1_score": 0.75,
            "roc_auc": null
        }))
        .unwrap();
        assert_eq!(m.get(MetricName::RocAuc), None);
        assert_eq!(m.get(MetricName::F1Score), Some(0.75));
        assert!(m.confusion_matrix.is_none());
    }

    #[test]
    fn incomplete_confusion_matrix_is_absent() {
        let m: MetricSet = serde_json::from_value(json!({
            "accuracy": 0.9, "precision": 0.8, "recall": 0.7, "f1_score": 0.75,
            "confusion_matrix": {"true_positive": 1, "true_negative": 2, "false_positive": 3}
        }))
        .unwrap();
        assert!(m.confusion_matrix.is_none());

        let m: MetricSet = serde_json::from_value(json!({
            "accuracy": 0.9, "precision": 0.8, "recall": 0.7, "f1_score": 0.75,
            "confusion_matrix": {
                "true_positive": 50, "true_negative": 40,
                "false_positive": 5, "false_negative": 5
            }
        }))
        .unwrap();
        assert_eq!(m.confusion_matrix.map(|c| c.true_positive), Some(50));
    }

    #[test]
    fn train_request_body() {
        let algos = vec!["random_forest".to_string(), "svm".to_string()];
        let body = serde_json::to_value(TrainRequest::new("diabetes", &algos)).unwrap();
        assert_eq!(
            body,
            json!({
                "disease": "diabetes",
                "algorithms": ["random_forest", "svm"],
                "test_size": 0.2,
                "random_state": 42
            })
        );
    }

    #[test]
    fn compare_request_honors_options() {
        let diseases = vec!["diabetes".to_string(), "heart_disease".to_string()];
        let algos = vec!["svm".to_string()];
        let opts = RunOptions {
            test_size: 0.3,
            random_state: 7,
        };
        let body = serde_json::to_value(CompareRequest::with_options(&diseases, &algos, opts)).unwrap();
        assert_eq!(body["diseases"], json!(["diabetes", "heart_disease"]));
        assert_eq!(body["test_size"], json!(0.3));
        assert_eq!(body["random_state"], json!(7));
    }

    fn offline_state() -> AppState {
        AppState::new(AppConfig {
            api_url: "http://127.0.0.1:9/api".into(),
            ..AppConfig::default()
        })
    }

    fn rf_response() -> ComparisonResponse {
        ComparisonResponse::from_value(json!({
            "disease": "diabetes",
            "disease_name": "Diabetes",
            "results": [{
                "algorithm": "rf",
                "algorithm_name": "Random Forest",
                "metrics": {
                    "accuracy": 0.9, "precision": 0.85, "recall": 0.88, "f1_score": 0.86,
                    "confusion_matrix": {
                        "true_positive": 50, "true_negative": 40,
                        "false_positive": 5, "false_negative": 5
                    }
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn empty_selection_issues_no_request() {
        let mut state = offline_state();
        assert!(!state.start_comparison());
        assert!(state.in_flight.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Please select at least one disease and one algorithm")
        );
    }

    #[test]
    fn catalog_sets_default_selection() {
        let mut state = offline_state();
        state.apply_catalog(Ok(Catalog {
            diseases: vec![
                Disease { id: "diabetes".into(), name: "Diabetes".into(), description: String::new() },
                Disease { id: "brain_stroke".into(), name: "Brain Stroke".into(), description: String::new() },
            ],
            algorithms: vec![
                Algorithm { id: "svm".into(), name: "Svm".into() },
                Algorithm { id: "rf".into(), name: "Random Forest".into() },
            ],
        }));
        assert_eq!(state.selection.diseases, ["diabetes"]);
        assert_eq!(state.selection.algorithms, ["svm", "rf"]);
    }

    #[test]
    fn catalog_failure_is_generic_message() {
        let mut state = offline_state();
        state.apply_catalog(Err(ApiError::Transport("HTTP 500: boom".into())));
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    }

    #[test]
    fn failed_catalog_can_be_retried() {
        let mut state = offline_state();
        state.apply_catalog(Err(ApiError::Transport("connection refused".into())));
        assert!(state.catalog_failed);
        assert!(!state.is_loading());
        assert!(state.diseases.is_empty());

        state.start_initial_load();
        assert!(state.catalog_promise.is_some());
        assert!(state.is_loading());
        assert!(!state.catalog_failed);
        assert!(state.error.is_none());
    }

    #[test]
    fn empty_datasets_are_reported_alongside_results() {
        let mut state = offline_state();
        let response = ComparisonResponse::from_value(json!({
            "diabetes": {"disease_name": "Diabetes", "results": []},
            "heart_disease": {
                "disease_name": "Heart Disease",
                "results": [{
                    "algorithm": "svm",
                    "algorithm_name": "Svm",
                    "metrics": {"accuracy": 0.8, "precision": 0.8, "recall": 0.8, "f1_score": 0.8}
                }]
            }
        }))
        .unwrap();
        let epoch = state.epochs.next();
        state.apply_comparison(epoch, Ok(response));
        assert_eq!(state.empty_datasets, ["Diabetes"]);
        let datasets = state.results.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].label, "Heart Disease");

        let epoch = state.epochs.next();
        state.apply_comparison(epoch, Ok(rf_response()));
        assert!(state.empty_datasets.is_empty());
    }

    #[test]
    fn stale_result_is_dropped() {
        let mut state = offline_state();
        let old = state.epochs.next();
        let current = state.epochs.next();

        state.apply_comparison(old, Ok(rf_response()));
        assert!(state.results.is_none());

        state.apply_comparison(current, Ok(rf_response()));
        let datasets = state.results.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(datasets[0].label, "Diabetes");
        assert_eq!(datasets[0].results[0].algorithm_name, "Random Forest");
    }

    #[test]
    fn unrecognized_shape_becomes_no_results() {
        let mut state = offline_state();
        let epoch = state.epochs.next();
        state.apply_comparison(
            epoch,
            Err(ApiError::Results(ResultsError::UnrecognizedShape("x".into()))),
        );
        assert!(matches!(state.results, Some(Err(ResultsError::UnrecognizedShape(_)))));
        assert!(state.error.is_none());
    }

    #[test]
    fn transport_failure_keeps_state_retriggerable() {
        let mut state = offline_state();
        let epoch = state.epochs.next();
        state.apply_comparison(epoch, Err(ApiError::Transport("refused".into())));
        assert_eq!(state.error.as_deref(), Some(COMPARE_FAILED_MESSAGE));
        assert!(!state.is_loading());
    }

    #[test]
    fn unavailable_metric_resets_to_f1() {
        let mut state = offline_state();
        state.chart_metric = MetricName::RocAuc;
        let epoch = state.epochs.next();
        state.apply_comparison(epoch, Ok(rf_response()));
        assert_eq!(state.chart_metric, MetricName::F1Score);
    }
}
