//! Per-company model training
//!
//! Fits a bagged regression-tree model on a company's history. The split
//! and the bootstrap samples come from one seeded generator, so retraining
//! on the same dataset yields the same model.

use super::features::FeatureEncoder;
use super::forest::{train_test_split, ForestParams, RandomForest, TreeParams};
use crate::dataset::HistoricalDataset;
use crate::error::{EstimatorError, Result};
use crate::models::{Field, ProjectInput};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::debug;

/// Fewest labelled rows that still leave one row on each side of the split
pub const MIN_TRAINING_ROWS: usize = 2;

/// Configuration for model training
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Trees in the ensemble
    pub n_estimators: usize,
    /// Share of rows held out for the test score
    pub test_fraction: f64,
    /// Seed for the split and bootstrap sampling
    pub random_seed: u64,
    /// Maximum tree depth (unlimited when `None`)
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples are not split further
    pub min_samples_split: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            test_fraction: 0.2,
            random_seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// A fitted company model and everything needed to query it consistently
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub company: String,
    pub model_version: String,
    pub encoder: FeatureEncoder,
    pub forest: RandomForest,
    pub train_score: f64,
    pub test_score: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Feature names in the order the model was fitted with
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.encoder.feature_names()
    }

    /// Point estimate for an input
    pub fn estimate(&self, input: &ProjectInput) -> f64 {
        self.forest.predict(&self.encoder.encode(input))
    }
}

/// Trains company models with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a model for `company` against `final_project_cost`
    pub fn train(&self, company: &str, dataset: &HistoricalDataset) -> Result<TrainedModel> {
        if !dataset.has_column(Field::FinalProjectCost) {
            return Err(EstimatorError::MissingColumn {
                column: Field::FinalProjectCost.name(),
                context: "model training",
            });
        }

        let labelled: Vec<_> = dataset
            .records()
            .iter()
            .filter_map(|r| r.final_project_cost.map(|y| (&r.input, y)))
            .collect();
        if labelled.len() < MIN_TRAINING_ROWS {
            return Err(EstimatorError::TrainingDataInsufficient {
                rows: labelled.len(),
                required: MIN_TRAINING_ROWS,
            });
        }

        let start = Instant::now();
        let encoder = FeatureEncoder::fit(dataset);
        let x = encoder.encode_batch(labelled.iter().map(|(input, _)| *input));
        let y: Vec<f64> = labelled.iter().map(|(_, y)| *y).collect();

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let (train_idx, test_idx) = train_test_split(x.len(), self.config.test_fraction, &mut rng);
        let (x_train, y_train) = select(&x, &y, &train_idx);
        let (x_test, y_test) = select(&x, &y, &test_idx);

        let params = ForestParams {
            n_estimators: self.config.n_estimators,
            tree: TreeParams {
                max_depth: self.config.max_depth,
                min_samples_split: self.config.min_samples_split,
            },
            seed: self.config.random_seed,
        };
        let forest = RandomForest::fit_with_rng(&x_train, &y_train, params, &mut rng);

        let train_score = forest.score(&x_train, &y_train);
        let test_score = forest.score(&x_test, &y_test);
        let trained_at = Utc::now();

        debug!(
            company = %company,
            features = ?encoder.feature_names(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Forest fitted"
        );

        Ok(TrainedModel {
            company: company.to_string(),
            model_version: format!("{}@{}", company, trained_at.timestamp_millis()),
            encoder,
            forest,
            train_score,
            test_score,
            train_rows: y_train.len(),
            test_rows: y_test.len(),
            trained_at,
        })
    }
}

fn select(x: &[Vec<f64>], y: &[f64], idx: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    idx.iter().map(|&i| (x[i].clone(), y[i])).unzip()
}
