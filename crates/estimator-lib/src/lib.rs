//! Estimation library for construction project costs
//!
//! This crate provides the core functionality for:
//! - Historical dataset ingestion and company analysis
//! - Per-company regression model training
//! - Cost prediction with a heuristic fallback
//! - Risk insights and what-if scenario simulation
//! - Health checks and observability

pub mod dataset;
pub mod engine;
pub mod error;
pub mod health;
pub mod insights;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;
pub mod scenario;

pub use dataset::HistoricalDataset;
pub use engine::{CostEngine, IngestReport, FALLBACK_INSIGHT};
pub use error::{EstimatorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use registry::{CompanyState, ModelRegistry};
