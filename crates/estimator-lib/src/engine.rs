//! The estimation engine's boundary operations
//!
//! [`CostEngine`] ties the registry, trainer and predictors together and is
//! the single entry point the transport layer talks to.

use crate::dataset::{analyze, HistoricalDataset};
use crate::error::{EstimatorError, Result};
use crate::insights::generate_insights;
use crate::models::{
    CompanyAnalysis, CompanySummary, PredictionResult, PredictionSource, ProjectInput, ScenarioSet,
};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::predictor::{CostPredictor, FallbackPredictor, ResultFormatter, Trainer, TrainerConfig};
use crate::registry::{CompanyState, ModelRegistry};
use crate::scenario;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Insight attached to predictions made without company history
pub const FALLBACK_INSIGHT: &str = "Using general industry data for prediction";

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub company: String,
    pub projects_loaded: usize,
    pub features: Vec<String>,
    pub train_score: f64,
    pub test_score: f64,
    pub model_version: String,
}

/// Estimation engine owning the process-wide company registry
pub struct CostEngine {
    registry: ModelRegistry,
    trainer: Trainer,
    formatter: ResultFormatter,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
}

impl Default for CostEngine {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

impl CostEngine {
    pub fn new(trainer_config: TrainerConfig) -> Self {
        Self::with_logger(trainer_config, StructuredLogger::new("cost-estimator"))
    }

    pub fn with_logger(trainer_config: TrainerConfig, logger: StructuredLogger) -> Self {
        Self {
            registry: ModelRegistry::new(),
            trainer: Trainer::new(trainer_config),
            formatter: ResultFormatter::new(),
            metrics: EstimatorMetrics::new(),
            logger,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Parse a CSV table and ingest it for `company`
    pub fn ingest_csv(&self, company: &str, data: &str) -> Result<IngestReport> {
        match HistoricalDataset::from_csv_str(data) {
            Ok(dataset) => self.ingest(company, dataset),
            Err(e) => {
                self.record_ingestion_failure(company, &e);
                Err(e)
            }
        }
    }

    /// Analyze the dataset, train the company model and commit both
    ///
    /// Any failure leaves the company's previous state in place.
    pub fn ingest(&self, company: &str, dataset: HistoricalDataset) -> Result<IngestReport> {
        let start = Instant::now();
        let outcome = self.registry.replace_with(company, || {
            let analysis = analyze(&dataset)?;
            let train_start = Instant::now();
            let model = self.trainer.train(company, &dataset)?;
            self.logger
                .log_model_trained(company, &model, train_start.elapsed().as_millis() as u64);
            Ok(CompanyState {
                dataset: Arc::new(dataset),
                analysis,
                model: Arc::new(model),
            })
        });
        self.metrics.observe_ingestion_latency(start.elapsed().as_secs_f64());

        let state = match outcome {
            Ok(state) => state,
            Err(e) => {
                self.record_ingestion_failure(company, &e);
                return Err(e);
            }
        };
        self.metrics.set_companies_loaded(self.registry.len() as i64);

        let model = &state.model;
        self.logger.log_dataset_ingested(
            company,
            state.analysis.total_projects,
            state.analysis.success_rate,
            model.train_score,
            model.test_score,
            &model.model_version,
        );

        Ok(IngestReport {
            company: company.to_string(),
            projects_loaded: state.analysis.total_projects,
            features: model.feature_names().iter().map(|s| s.to_string()).collect(),
            train_score: model.train_score,
            test_score: model.test_score,
            model_version: model.model_version.clone(),
        })
    }

    fn record_ingestion_failure(&self, company: &str, err: &EstimatorError) {
        self.metrics.inc_ingestion_failures();
        self.logger.log_ingestion_failed(company, &err.to_string());
    }

    /// Estimate a project's cost, personalized when the company has a model
    pub fn predict(&self, company: Option<&str>, input: &ProjectInput) -> Result<PredictionResult> {
        let missing = input.missing_required_fields();
        if !missing.is_empty() {
            return Err(EstimatorError::MissingFields(missing));
        }

        let start = Instant::now();
        let (predicted_cost, insights, source) =
            self.with_state(company, |state| match state {
                Some(state) => {
                    let predicted = state.model.predict(input);
                    let insights = generate_insights(&state.analysis, input, predicted);
                    let source = PredictionSource::CompanyModel {
                        model_version: state.model.model_version().to_string(),
                    };
                    (predicted, insights, source)
                }
                None => {
                    debug!(company = ?company, "No company model, using fallback predictor");
                    let predicted = FallbackPredictor.predict(input);
                    (predicted, vec![FALLBACK_INSIGHT.to_string()], PredictionSource::Fallback)
                }
            });

        let result = self.formatter.format(input, predicted_cost, insights, source);

        let source_label = match result.source {
            PredictionSource::CompanyModel { .. } => "company_model",
            PredictionSource::Fallback => "fallback",
        };
        self.metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions(source_label);
        self.logger.log_prediction(
            company,
            source_label,
            result.predicted_cost,
            result.base_cost,
            result.contingency_percent,
        );

        Ok(result)
    }

    /// Run the fixed what-if scenarios, sized by the company's overrun history
    pub fn simulate_scenarios(&self, company: Option<&str>, input: &ProjectInput) -> ScenarioSet {
        let overrun = self.with_state(company, |state| {
            state.and_then(|s| s.analysis.avg_cost_overrun)
        });
        let set = scenario::simulate(input, overrun);

        self.metrics.inc_scenario_runs();
        self.logger
            .log_scenarios(company, &set.worst_case_scenario, set.total_recommended_budget);
        set
    }

    /// Summary of every company with a trained model
    pub fn list_companies(&self) -> BTreeMap<String, CompanySummary> {
        self.registry.summaries()
    }

    /// Names of companies with a trained model, sorted
    pub fn loaded_companies(&self) -> Vec<String> {
        self.registry.companies()
    }

    /// Full analysis snapshot of a company with a trained model
    pub fn company_analysis(&self, company: &str) -> Result<CompanyAnalysis> {
        self.registry
            .get(company)
            .map(|s| s.analysis)
            .ok_or_else(|| EstimatorError::UnknownCompany(company.to_string()))
    }

    fn with_state<T>(
        &self,
        company: Option<&str>,
        f: impl FnOnce(Option<&CompanyState>) -> T,
    ) -> T {
        match company {
            Some(name) => self.registry.with_company(name, f),
            None => f(None),
        }
    }
}
