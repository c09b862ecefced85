//! Core data models for the cost estimator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Columns recognized in historical tables and project inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProjectSize,
    ProjectDuration,
    LaborCost,
    MaterialCost,
    EquipmentCost,
    OverheadCost,
    InflationRate,
    Region,
    Year,
    Delays,
    ReworkPercent,
    SafetyIncidents,
    ProjectType,
    FinalProjectCost,
}

/// Whether a column holds numbers or category labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

impl Field {
    /// Candidate model features, in the order they are laid out in a feature vector
    pub const FEATURE_CANDIDATES: [Field; 13] = [
        Field::ProjectSize,
        Field::ProjectDuration,
        Field::LaborCost,
        Field::MaterialCost,
        Field::EquipmentCost,
        Field::OverheadCost,
        Field::InflationRate,
        Field::Region,
        Field::Year,
        Field::Delays,
        Field::ReworkPercent,
        Field::SafetyIncidents,
        Field::ProjectType,
    ];

    /// The four components that make up a project's base cost
    pub const BASE_COST_FIELDS: [Field; 4] = [
        Field::LaborCost,
        Field::MaterialCost,
        Field::EquipmentCost,
        Field::OverheadCost,
    ];

    /// Fields a prediction request must carry
    pub const REQUIRED_FOR_PREDICTION: [Field; 9] = [
        Field::ProjectType,
        Field::ProjectSize,
        Field::ProjectDuration,
        Field::LaborCost,
        Field::MaterialCost,
        Field::EquipmentCost,
        Field::OverheadCost,
        Field::Region,
        Field::Year,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::ProjectSize => "project_size",
            Field::ProjectDuration => "project_duration",
            Field::LaborCost => "labor_cost",
            Field::MaterialCost => "material_cost",
            Field::EquipmentCost => "equipment_cost",
            Field::OverheadCost => "overhead_cost",
            Field::InflationRate => "inflation_rate",
            Field::Region => "region",
            Field::Year => "year",
            Field::Delays => "delays",
            Field::ReworkPercent => "rework_percent",
            Field::SafetyIncidents => "safety_incidents",
            Field::ProjectType => "project_type",
            Field::FinalProjectCost => "final_project_cost",
        }
    }

    /// Look up a column by its exact header name
    pub fn from_name(name: &str) -> Option<Field> {
        Self::FEATURE_CANDIDATES
            .iter()
            .chain(std::iter::once(&Field::FinalProjectCost))
            .find(|f| f.name() == name)
            .copied()
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Region | Field::ProjectType => FieldKind::Categorical,
            _ => FieldKind::Numeric,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Category(String),
}

/// A project to be estimated
///
/// Every field is optional on the wire; which ones are required depends on
/// the operation (see [`ProjectInput::missing_required_fields`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overhead_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delays: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rework_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_incidents: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}

impl ProjectInput {
    /// Value of a feature column, if the input carries it
    pub fn value(&self, field: Field) -> Option<FieldValue> {
        match field.kind() {
            FieldKind::Categorical => self
                .category(field)
                .map(|s| FieldValue::Category(s.to_string())),
            FieldKind::Numeric => self.number(field).map(FieldValue::Number),
        }
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::ProjectSize => self.project_size,
            Field::ProjectDuration => self.project_duration,
            Field::LaborCost => self.labor_cost,
            Field::MaterialCost => self.material_cost,
            Field::EquipmentCost => self.equipment_cost,
            Field::OverheadCost => self.overhead_cost,
            Field::InflationRate => self.inflation_rate,
            Field::Year => self.year,
            Field::Delays => self.delays,
            Field::ReworkPercent => self.rework_percent,
            Field::SafetyIncidents => self.safety_incidents,
            Field::Region | Field::ProjectType | Field::FinalProjectCost => None,
        }
    }

    pub fn category(&self, field: Field) -> Option<&str> {
        match field {
            Field::Region => self.region.as_deref(),
            Field::ProjectType => self.project_type.as_deref(),
            _ => None,
        }
    }

    /// Numeric value or zero when absent
    pub fn number_or_zero(&self, field: Field) -> f64 {
        self.number(field).unwrap_or(0.0)
    }

    /// Assign a parsed cell; `FinalProjectCost` is not part of an input and is ignored
    pub fn set(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::Region, FieldValue::Category(s)) => self.region = Some(s),
            (Field::ProjectType, FieldValue::Category(s)) => self.project_type = Some(s),
            (field, FieldValue::Number(n)) => {
                let slot = match field {
                    Field::ProjectSize => &mut self.project_size,
                    Field::ProjectDuration => &mut self.project_duration,
                    Field::LaborCost => &mut self.labor_cost,
                    Field::MaterialCost => &mut self.material_cost,
                    Field::EquipmentCost => &mut self.equipment_cost,
                    Field::OverheadCost => &mut self.overhead_cost,
                    Field::InflationRate => &mut self.inflation_rate,
                    Field::Year => &mut self.year,
                    Field::Delays => &mut self.delays,
                    Field::ReworkPercent => &mut self.rework_percent,
                    Field::SafetyIncidents => &mut self.safety_incidents,
                    _ => return,
                };
                *slot = Some(n);
            }
            _ => {}
        }
    }

    /// Sum of the four cost components, treating absent ones as zero
    pub fn base_cost(&self) -> f64 {
        Field::BASE_COST_FIELDS
            .iter()
            .map(|f| self.number_or_zero(*f))
            .sum()
    }

    /// Names of required prediction fields that are absent, in declaration order
    pub fn missing_required_fields(&self) -> Vec<String> {
        Field::REQUIRED_FOR_PREDICTION
            .iter()
            .filter(|f| self.value(**f).is_none())
            .map(|f| f.name().to_string())
            .collect()
    }
}

/// One row of a company's historical table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRecord {
    pub input: ProjectInput,
    pub final_project_cost: Option<f64>,
}

/// Summary statistics derived from a company's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub total_projects: usize,
    pub avg_project_cost: f64,
    pub avg_duration: f64,
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_delays: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_rework: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cost_overrun: Option<f64>,
    pub project_types: BTreeMap<String, usize>,
}

impl CompanyAnalysis {
    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            total_projects: self.total_projects,
            avg_project_cost: self.avg_project_cost,
            avg_duration: self.avg_duration,
            success_rate: self.success_rate,
        }
    }
}

/// Compact per-company view used by company listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub total_projects: usize,
    pub avg_project_cost: f64,
    pub avg_duration: f64,
    pub success_rate: f64,
}

/// Areas flagged as high risk for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskArea {
    Timeline,
    Quality,
    Safety,
    Budget,
}

/// Which estimator produced a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionSource {
    CompanyModel { model_version: String },
    Fallback,
}

/// Full outcome of a cost prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_cost: f64,
    pub base_cost: f64,
    pub risk_adjustment: f64,
    pub contingency_percent: f64,
    pub high_risk_areas: Vec<RiskArea>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: PredictionSource,
}

/// A single what-if cost shock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub cost: f64,
    pub difference: f64,
    pub percent_change: f64,
}

/// Outcome of a scenario simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub baseline_cost: f64,
    pub scenarios: Vec<Scenario>,
    pub worst_case_scenario: String,
    pub max_increase: f64,
    pub avg_cost_overrun: f64,
    pub risk_adjusted_contingency: f64,
    pub total_recommended_budget: f64,
}
