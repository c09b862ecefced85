//! Historical project datasets
//!
//! This module provides:
//! - CSV ingestion of a company's historical project table
//! - Statistical analysis of that history (see [`analyze`])

mod analyzer;

pub use analyzer::{analyze, success_rate, SUCCESS_VARIANCE_THRESHOLD};

use crate::error::{EstimatorError, Result};
use crate::models::{Field, FieldKind, FieldValue, ProjectRecord};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// An ordered table of past projects for one company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalDataset {
    columns: Vec<Field>,
    records: Vec<ProjectRecord>,
}

impl HistoricalDataset {
    /// Build a dataset from already-parsed records and the columns they came from
    pub fn new(columns: Vec<Field>, records: Vec<ProjectRecord>) -> Self {
        Self { columns, records }
    }

    /// Parse a delimited table with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mapping: Vec<(usize, Field)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| Field::from_name(name).map(|f| (idx, f)))
            .collect();

        if mapping.is_empty() {
            return Err(EstimatorError::DatasetLoad(
                "no recognized columns in header".to_string(),
            ));
        }
        let ignored = headers.len() - mapping.len();
        if ignored > 0 {
            debug!(ignored_columns = ignored, "Ignoring unrecognized columns");
        }

        let mut records = Vec::new();
        for (row_idx, result) in rdr.records().enumerate() {
            let row = result?;
            let mut record = ProjectRecord::default();

            for (col_idx, field) in &mapping {
                let cell = row.get(*col_idx).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                match parse_cell(*field, cell) {
                    Some(FieldValue::Number(n)) if *field == Field::FinalProjectCost => {
                        record.final_project_cost = Some(n);
                    }
                    Some(value) => record.input.set(*field, value),
                    None => {
                        return Err(EstimatorError::DatasetLoad(format!(
                            "row {}: column '{}' has non-numeric or non-finite value '{}'",
                            row_idx + 1,
                            field,
                            cell
                        )));
                    }
                }
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(EstimatorError::DatasetLoad("dataset has no rows".to_string()));
        }

        let columns = mapping.into_iter().map(|(_, f)| f).collect();
        Ok(Self { columns, records })
    }

    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| EstimatorError::DatasetLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_csv_reader(file)
    }

    /// Recognized columns, in header order
    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    pub fn has_column(&self, field: Field) -> bool {
        self.columns.contains(&field)
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Present values of a numeric column
    pub fn numeric_values(&self, field: Field) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().filter_map(move |r| match field {
            Field::FinalProjectCost => r.final_project_cost,
            _ => r.input.number(field),
        })
    }

    /// Arithmetic mean of a numeric column; `None` when the column is absent
    pub fn column_mean(&self, field: Field) -> Option<f64> {
        if !self.has_column(field) {
            return None;
        }
        let (sum, count) = self
            .numeric_values(field)
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        Some(if count == 0 { 0.0 } else { sum / count as f64 })
    }
}

fn parse_cell(field: Field, cell: &str) -> Option<FieldValue> {
    match field.kind() {
        FieldKind::Categorical => Some(FieldValue::Category(cell.to_string())),
        FieldKind::Numeric => cell
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number),
    }
}
