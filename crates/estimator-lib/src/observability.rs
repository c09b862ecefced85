//! Observability infrastructure for the cost estimator
//!
//! Provides:
//! - Prometheus metrics (ingestion/prediction latency, prediction paths, loaded companies)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use crate::predictor::TrainedModel;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Histogram buckets for ingestion and training latency (in seconds)
const INGESTION_BUCKETS: &[f64] = &[0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

struct EstimatorMetricsInner {
    ingestion_latency_seconds: Histogram,
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    scenario_runs_total: IntCounter,
    ingestion_failures_total: IntCounter,
    companies_loaded: IntGauge,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            ingestion_latency_seconds: register_histogram!(
                "cost_estimator_ingestion_latency_seconds",
                "Time spent analyzing a dataset and training its company model",
                INGESTION_BUCKETS.to_vec()
            )
            .expect("Failed to register ingestion_latency_seconds"),

            prediction_latency_seconds: register_histogram!(
                "cost_estimator_prediction_latency_seconds",
                "Time spent producing a cost prediction",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "cost_estimator_predictions_total",
                "Predictions served, by estimation path",
                &["source"]
            )
            .expect("Failed to register predictions_total"),

            scenario_runs_total: register_int_counter!(
                "cost_estimator_scenario_runs_total",
                "Scenario simulations run"
            )
            .expect("Failed to register scenario_runs_total"),

            ingestion_failures_total: register_int_counter!(
                "cost_estimator_ingestion_failures_total",
                "Dataset ingestions that failed and left the registry unchanged"
            )
            .expect("Failed to register ingestion_failures_total"),

            companies_loaded: register_int_gauge!(
                "cost_estimator_companies_loaded",
                "Companies with a trained model"
            )
            .expect("Failed to register companies_loaded"),
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new)
    }

    pub fn observe_ingestion_latency(&self, duration_secs: f64) {
        self.inner().ingestion_latency_seconds.observe(duration_secs);
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Count a prediction served by `source` (`company_model` or `fallback`)
    pub fn inc_predictions(&self, source: &str) {
        self.inner().predictions_total.with_label_values(&[source]).inc();
    }

    pub fn inc_scenario_runs(&self) {
        self.inner().scenario_runs_total.inc();
    }

    pub fn inc_ingestion_failures(&self) {
        self.inner().ingestion_failures_total.inc();
    }

    pub fn set_companies_loaded(&self, count: i64) {
        self.inner().companies_loaded.set(count);
    }
}

/// Structured logger for estimator events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_dataset_ingested(
        &self,
        company: &str,
        projects: usize,
        success_rate: f64,
        train_score: f64,
        test_score: f64,
        model_version: &str,
    ) {
        info!(
            event = "dataset_ingested",
            service = %self.service,
            company = %company,
            projects = projects,
            success_rate = success_rate,
            train_score = train_score,
            test_score = test_score,
            model_version = %model_version,
            "Company dataset ingested and model trained"
        );
    }

    pub fn log_model_trained(&self, company: &str, model: &TrainedModel, elapsed_ms: u64) {
        info!(
            event = "model_trained",
            service = %self.service,
            company = %company,
            model_version = %model.model_version,
            train_rows = model.train_rows,
            test_rows = model.test_rows,
            train_score = model.train_score,
            test_score = model.test_score,
            elapsed_ms = elapsed_ms,
            "Company model trained"
        );
    }

    pub fn log_ingestion_failed(&self, company: &str, reason: &str) {
        warn!(
            event = "ingestion_failed",
            service = %self.service,
            company = %company,
            reason = %reason,
            "Dataset ingestion failed, keeping previous company state"
        );
    }

    pub fn log_prediction(
        &self,
        company: Option<&str>,
        source: &str,
        predicted_cost: f64,
        base_cost: f64,
        contingency_percent: f64,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            company = ?company,
            source = %source,
            predicted_cost = predicted_cost,
            base_cost = base_cost,
            contingency_percent = contingency_percent,
            "Generated cost prediction"
        );
    }

    pub fn log_scenarios(&self, company: Option<&str>, worst_case: &str, recommended_budget: f64) {
        info!(
            event = "scenarios_simulated",
            service = %self.service,
            company = ?company,
            worst_case = %worst_case,
            recommended_budget = recommended_budget,
            "Scenario analysis complete"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            "Cost estimator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Cost estimator shutting down"
        );
    }
}
