//! Service configuration

use anyhow::Result;
use estimator_lib::predictor::TrainerConfig;
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Name reported by the health endpoint and in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Address the API server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Largest accepted dataset upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Trees per company model
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Seed for train/test splitting and bootstrap sampling
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Share of rows held out for the test score
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
}

fn default_service_name() -> String {
    "cost-estimator".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_n_estimators() -> usize {
    100
}

fn default_random_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            bind_address: default_bind_address(),
            api_port: default_api_port(),
            max_upload_bytes: default_max_upload_bytes(),
            n_estimators: default_n_estimators(),
            random_seed: default_random_seed(),
            test_fraction: default_test_fraction(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `ESTIMATOR_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ESTIMATOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid configuration, using defaults");
            ServiceConfig::default()
        }))
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            n_estimators: self.n_estimators,
            random_seed: self.random_seed,
            test_fraction: self.test_fraction,
            ..TrainerConfig::default()
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        let trainer = config.trainer_config();
        assert_eq!(trainer.n_estimators, 100);
        assert_eq!(trainer.random_seed, 42);
        assert_eq!(trainer.test_fraction, 0.2);
    }

    #[test]
    fn test_partial_source_fills_defaults() {
        let config: ServiceConfig = config::Config::builder()
            .set_override("api_port", 9000)
            .unwrap()
            .set_override("n_estimators", 10)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.trainer_config().n_estimators, 10);
        assert_eq!(config.service_name, "cost-estimator");
    }
}
