//! Runtime configuration loaded from the environment (and `.env`, if present).

use dotenv::dotenv;
use std::env;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_RANDOM_STATE: u64 = 42;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Parameters sent with every train/compare request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            random_state: DEFAULT_RANDOM_STATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub run_options: RunOptions,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            run_options: RunOptions::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let test_size = match lookup("TEST_SIZE") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v > 0.0 && v < 1.0 => v,
                _ => {
                    warn!("TEST_SIZE={raw:?} is not in (0, 1); using {DEFAULT_TEST_SIZE}");
                    DEFAULT_TEST_SIZE
                }
            },
            None => DEFAULT_TEST_SIZE,
        };

        let random_state = match lookup("RANDOM_STATE") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!("RANDOM_STATE={raw:?} is not an integer; using {DEFAULT_RANDOM_STATE}");
                DEFAULT_RANDOM_STATE
            }),
            None => DEFAULT_RANDOM_STATE,
        };

        Self {
            api_url,
            run_options: RunOptions {
                test_size,
                random_state,
            },
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(cfg(&[]), AppConfig::default());
    }

    #[test]
    fn trailing_slash_trimmed() {
        let c = cfg(&[("API_URL", "http://ml.internal:8080/api/")]);
        assert_eq!(c.api_url, "http://ml.internal:8080/api");
    }

    #[test]
    fn out_of_range_test_size_falls_back() {
        assert_eq!(cfg(&[("TEST_SIZE", "1.5")]).run_options.test_size, 0.2);
        assert_eq!(cfg(&[("TEST_SIZE", "abc")]).run_options.test_size, 0.2);
        assert_eq!(cfg(&[("TEST_SIZE", "0.3")]).run_options.test_size, 0.3);
    }

    #[test]
    fn random_state_parsed() {
        assert_eq!(cfg(&[("RANDOM_STATE", "7")]).run_options.random_state, 7);
        assert_eq!(cfg(&[("RANDOM_STATE", "-1")]).run_options.random_state, 42);
    }
}
