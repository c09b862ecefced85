//! Cost inference
//!
//! Company models answer through their frozen encoder; everything else
//! goes through the heuristic fallback formula.

use super::trainer::TrainedModel;
use super::CostPredictor;
use crate::models::{Field, ProjectInput};
use std::time::Instant;
use tracing::debug;

/// Cost increase per day of delay
pub const DELAY_WEIGHT: f64 = 0.015;
/// Cost increase per percentage point of rework
pub const REWORK_WEIGHT: f64 = 0.025;
/// Cost increase per safety incident
pub const SAFETY_WEIGHT: f64 = 0.04;
/// Cost increase per percentage point of inflation
pub const INFLATION_WEIGHT: f64 = 0.01;

impl CostPredictor for TrainedModel {
    fn predict(&self, input: &ProjectInput) -> f64 {
        let start = Instant::now();
        let estimate = self.estimate(input);
        debug!(
            company = %self.company,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Company model inference completed"
        );
        estimate
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

/// Heuristic predictor used when no company model exists
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPredictor;

impl FallbackPredictor {
    /// 1.0 plus weighted delay, rework, safety and inflation risk
    pub fn risk_multiplier(input: &ProjectInput) -> f64 {
        1.0 + input.number_or_zero(Field::Delays) * DELAY_WEIGHT
            + input.number_or_zero(Field::ReworkPercent) * REWORK_WEIGHT
            + input.number_or_zero(Field::SafetyIncidents) * SAFETY_WEIGHT
            + input.number_or_zero(Field::InflationRate) * INFLATION_WEIGHT
    }
}

impl CostPredictor for FallbackPredictor {
    fn predict(&self, input: &ProjectInput) -> f64 {
        input.base_cost() * Self::risk_multiplier(input)
    }

    fn model_version(&self) -> &str {
        "fallback"
    }
}
