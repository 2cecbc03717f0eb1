use crate::config::{AppConfig, RunOptions};
use crate::error::ApiError;
use crate::models::{
    Algorithm, AlgorithmList, CompareRequest, ComparisonResponse, Disease, DiseaseList,
    TrainRequest,
};
use crate::selection::ComparisonPlan;
use poll_promise::Promise;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub diseases: Vec<Disease>,
    pub algorithms: Vec<Algorithm>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let started = Instant::now();
        let response = self.agent.get(&url).call();
        self.finish("GET", &url, started, response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let started = Instant::now();
        let response = self.agent.post(&url).send_json(body);
        self.finish("POST", &url, started, response)
    }

    fn finish<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        started: Instant,
        response: Result<ureq::Response, ureq::Error>,
    ) -> Result<T, ApiError> {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match response {
            Ok(resp) => {
                info!(method, url, status = resp.status(), elapsed_ms, "request completed");
                resp.into_json::<T>()
                    .map_err(|e| ApiError::Decode(format!("{method} {url}: {e}")))
            }
            Err(err) => {
                let err = ApiError::from_ureq(err);
                warn!(method, url, elapsed_ms, error = %err, "request failed");
                Err(err)
            }
        }
    }

    pub fn fetch_diseases(&self) -> Result<Vec<Disease>, ApiError> {
        let list: DiseaseList = self.get_json("/diseases")?;
        Ok(list.diseases)
    }

    pub fn fetch_algorithms(&self) -> Result<Vec<Algorithm>, ApiError> {
        let list: AlgorithmList = self.get_json("/algorithms")?;
        Ok(list.algorithms)
    }

    pub fn load_catalog(&self) -> Result<Catalog, ApiError> {
        let diseases = self.fetch_diseases()?;
        let algorithms = self.fetch_algorithms()?;
        debug!(
            diseases = diseases.len(),
            algorithms = algorithms.len(),
            "catalog loaded"
        );
        Ok(Catalog {
            diseases,
            algorithms,
        })
    }

    pub fn train_models(
        &self,
        disease: &str,
        algorithms: &[String],
        options: RunOptions,
    ) -> Result<ComparisonResponse, ApiError> {
        let body = TrainRequest::with_options(disease, algorithms, options);
        let raw: Value = self.post_json("/train", &body)?;
        Ok(ComparisonResponse::from_value(raw)?)
    }

    pub fn compare_models(
        &self,
        diseases: &[String],
        algorithms: &[String],
        options: RunOptions,
    ) -> Result<ComparisonResponse, ApiError> {
        let body = CompareRequest::with_options(diseases, algorithms, options);
        let raw: Value = self.post_json("/compare", &body)?;
        Ok(ComparisonResponse::from_value(raw)?)
    }

    pub fn run_plan(
        &self,
        plan: &ComparisonPlan,
        options: RunOptions,
    ) -> Result<ComparisonResponse, ApiError> {
        match plan {
            ComparisonPlan::Train {
                disease,
                algorithms,
            } => self.train_models(disease, algorithms, options),
            ComparisonPlan::Compare {
                diseases,
                algorithms,
            } => self.compare_models(diseases, algorithms, options),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestEpoch(u64);

#[derive(Debug, Default)]
pub struct EpochCounter {
    latest: u64,
}

impl EpochCounter {
    pub fn next(&mut self) -> RequestEpoch {
        self.latest += 1;
        RequestEpoch(self.latest)
    }

    pub fn is_current(&self, epoch: RequestEpoch) -> bool {
        epoch.0 == self.latest
    }
}

pub struct PendingComparison {
    pub epoch: RequestEpoch,
    pub promise: Promise<Result<ComparisonResponse, ApiError>>,
}

pub fn catalog_promise(client: ApiClient) -> Promise<Result<Catalog, ApiError>> {
    Promise::spawn_thread("catalog_request", move || client.load_catalog())
}

pub fn comparison_promise(
    client: ApiClient,
    plan: ComparisonPlan,
    options: RunOptions,
    epoch: RequestEpoch,
) -> PendingComparison {
    let promise = Promise::spawn_thread("comparison_request", move || {
        client.run_plan(&plan, options)
    });
    PendingComparison { epoch, promise }
}
