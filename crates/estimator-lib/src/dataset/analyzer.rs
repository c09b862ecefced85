//! Descriptive statistics over a company's project history

use super::HistoricalDataset;
use crate::error::{EstimatorError, Result};
use crate::models::{CompanyAnalysis, Field, ProjectRecord};
use std::collections::BTreeMap;
use tracing::info;

/// A project succeeded if its final cost stayed within 15% of its estimate
pub const SUCCESS_VARIANCE_THRESHOLD: f64 = 0.15;

/// Compute the analysis snapshot for one company's dataset
pub fn analyze(dataset: &HistoricalDataset) -> Result<CompanyAnalysis> {
    let mut project_types = BTreeMap::new();
    if dataset.has_column(Field::ProjectType) {
        for record in dataset.records() {
            if let Some(t) = record.input.project_type.as_deref() {
                *project_types.entry(t.to_string()).or_insert(0) += 1;
            }
        }
    }

    let analysis = CompanyAnalysis {
        total_projects: dataset.len(),
        avg_project_cost: dataset.column_mean(Field::FinalProjectCost).unwrap_or(0.0),
        avg_duration: dataset.column_mean(Field::ProjectDuration).unwrap_or(0.0),
        success_rate: success_rate(dataset)?,
        avg_delays: dataset.column_mean(Field::Delays),
        avg_rework: dataset.column_mean(Field::ReworkPercent),
        avg_cost_overrun: avg_cost_overrun(dataset),
        project_types,
    };

    info!(
        projects = analysis.total_projects,
        avg_cost = analysis.avg_project_cost,
        success_rate = analysis.success_rate,
        "Company analysis complete"
    );

    Ok(analysis)
}

/// Percentage of projects whose final cost was within 15% of the component sum
///
/// Rows without a final cost, or whose estimated cost is zero, are left out
/// of the denominator. Returns 0 when no row qualifies.
pub fn success_rate(dataset: &HistoricalDataset) -> Result<f64> {
    if !dataset.has_column(Field::FinalProjectCost) {
        return Ok(0.0);
    }
    require_cost_columns(dataset)?;

    let variances: Vec<f64> = dataset.records().iter().filter_map(cost_variance).collect();
    if variances.is_empty() {
        return Ok(0.0);
    }
    let successes = variances
        .iter()
        .filter(|v| **v <= SUCCESS_VARIANCE_THRESHOLD)
        .count();
    Ok(successes as f64 / variances.len() as f64 * 100.0)
}

fn avg_cost_overrun(dataset: &HistoricalDataset) -> Option<f64> {
    if !dataset.has_column(Field::FinalProjectCost) || require_cost_columns(dataset).is_err() {
        return None;
    }
    let overruns: Vec<f64> = dataset
        .records()
        .iter()
        .filter_map(|r| {
            let (final_cost, estimated) = actual_and_estimated(r)?;
            Some((final_cost - estimated) / estimated * 100.0)
        })
        .collect();
    if overruns.is_empty() {
        return None;
    }
    Some(overruns.iter().sum::<f64>() / overruns.len() as f64)
}

fn require_cost_columns(dataset: &HistoricalDataset) -> Result<()> {
    for column in [Field::LaborCost, Field::MaterialCost] {
        if !dataset.has_column(column) {
            return Err(EstimatorError::MissingColumn {
                column: column.name(),
                context: "success rate analysis",
            });
        }
    }
    Ok(())
}

/// Final cost and non-zero estimated cost of a row
fn actual_and_estimated(record: &ProjectRecord) -> Option<(f64, f64)> {
    let final_cost = record.final_project_cost?;
    let estimated = record.input.base_cost();
    if estimated == 0.0 {
        return None;
    }
    Some((final_cost, estimated))
}

fn cost_variance(record: &ProjectRecord) -> Option<f64> {
    let (final_cost, estimated) = actual_and_estimated(record)?;
    Some((final_cost - estimated).abs() / estimated)
}
