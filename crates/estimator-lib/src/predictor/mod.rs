//! Cost prediction engine

mod features;
mod forest;
mod inference;
mod output;
mod trainer;

pub use features::{
    default_value, CategoryTable, FeatureEncoder, UNKNOWN_CATEGORY, UNKNOWN_CODE,
};
pub use forest::{
    r2_score, train_test_split, ForestParams, RandomForest, RegressionTree, TreeParams,
};
pub use inference::{
    FallbackPredictor, DELAY_WEIGHT, INFLATION_WEIGHT, REWORK_WEIGHT, SAFETY_WEIGHT,
};
pub use output::{contingency_percent, ResultFormatter, RiskThresholds};
pub use trainer::{TrainedModel, Trainer, TrainerConfig, MIN_TRAINING_ROWS};

use crate::models::ProjectInput;

/// Trait for cost prediction implementations
pub trait CostPredictor: Send + Sync {
    /// Point estimate of a project's total cost
    fn predict(&self, input: &ProjectInput) -> f64;

    /// Identifier of the model answering the prediction
    fn model_version(&self) -> &str;
}
