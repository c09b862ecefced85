//! Feature encoding for cost models
//!
//! Turns project records into fixed-order numeric vectors. The feature set
//! and the category code tables are frozen when an encoder is fitted and
//! reused unchanged for every later prediction, so a category always maps
//! to the same code for a given company.

use crate::dataset::HistoricalDataset;
use crate::models::{Field, FieldKind, FieldValue, ProjectInput};
use std::collections::BTreeMap;

/// Label substituted for absent categorical fields
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Code reserved for categories never seen at fit time
pub const UNKNOWN_CODE: f64 = -1.0;

/// Defaulting policy applied to every feature absent from an input
pub fn default_value(field: Field) -> FieldValue {
    match field.kind() {
        FieldKind::Numeric => FieldValue::Number(0.0),
        FieldKind::Categorical => FieldValue::Category(UNKNOWN_CATEGORY.to_string()),
    }
}

/// Frozen category -> code assignment for one categorical column
///
/// Codes are the positions of the labels in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTable {
    labels: Vec<String>,
}

impl CategoryTable {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut labels: Vec<String> = values.into_iter().map(str::to_string).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn encode(&self, label: &str) -> f64 {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .map(|idx| idx as f64)
            .unwrap_or(UNKNOWN_CODE)
    }

    pub fn decode(&self, code: f64) -> Option<&str> {
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.labels.get(code as usize).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Encodes project records using a feature order fixed at fit time
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    features: Vec<Field>,
    categories: BTreeMap<Field, CategoryTable>,
}

impl FeatureEncoder {
    /// Select the candidate features present in the dataset and freeze
    /// a code table for each categorical one
    pub fn fit(dataset: &HistoricalDataset) -> Self {
        let features: Vec<Field> = Field::FEATURE_CANDIDATES
            .iter()
            .copied()
            .filter(|f| dataset.has_column(*f))
            .collect();

        let categories = features
            .iter()
            .filter(|f| f.kind() == FieldKind::Categorical)
            .map(|field| {
                let values = dataset
                    .records()
                    .iter()
                    .filter_map(|r| r.input.category(*field));
                (*field, CategoryTable::fit(values))
            })
            .collect();

        Self { features, categories }
    }

    /// Feature columns in vector order
    pub fn features(&self) -> &[Field] {
        &self.features
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(Field::name).collect()
    }

    pub fn category_table(&self, field: Field) -> Option<&CategoryTable> {
        self.categories.get(&field)
    }

    /// Encode one input, filling absent features from the defaulting policy
    pub fn encode(&self, input: &ProjectInput) -> Vec<f64> {
        self.features
            .iter()
            .map(|field| {
                let value = input.value(*field).unwrap_or_else(|| default_value(*field));
                match value {
                    FieldValue::Number(n) => n,
                    FieldValue::Category(label) => self
                        .categories
                        .get(field)
                        .map(|t| t.encode(&label))
                        .unwrap_or(UNKNOWN_CODE),
                }
            })
            .collect()
    }

    pub fn encode_batch<'a>(
        &self,
        inputs: impl IntoIterator<Item = &'a ProjectInput>,
    ) -> Vec<Vec<f64>> {
        inputs.into_iter().map(|i| self.encode(i)).collect()
    }

    /// Recover the label behind an encoded categorical value
    pub fn decode_category(&self, field: Field, code: f64) -> Option<&str> {
        self.categories.get(&field)?.decode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_set() -> HistoricalDataset {
        HistoricalDataset::from_csv_str(
            "final_project_cost,project_type,labor_cost,region,material_cost
200,Residential,100,North,50
400,Commercial,200,South,100
300,Infrastructure,150,North,
",
        )
        .unwrap()
    }

    #[test]
    fn test_feature_order_follows_candidate_order() {
        let encoder = FeatureEncoder::fit(&training_set());
        assert_eq!(
            encoder.feature_names(),
            vec!["labor_cost", "material_cost", "region", "project_type"]
        );
    }

    #[test]
    fn test_codes_are_sorted_positions() {
        let encoder = FeatureEncoder::fit(&training_set());
        let types = encoder.category_table(Field::ProjectType).unwrap();
        assert_eq!(types.encode("Commercial"), 0.0);
        assert_eq!(types.encode("Infrastructure"), 1.0);
        assert_eq!(types.encode("Residential"), 2.0);
        assert_eq!(types.encode("Industrial"), UNKNOWN_CODE);
    }

    #[test]
    fn test_codes_do_not_depend_on_inference_input() {
        // A single-row batch must not re-derive codes from its own values
        let encoder = FeatureEncoder::fit(&training_set());
        let input = ProjectInput {
            project_type: Some("Residential".into()),
            region: Some("South".into()),
            labor_cost: Some(10.0),
            material_cost: Some(5.0),
            ..Default::default()
        };
        assert_eq!(encoder.encode(&input), vec![10.0, 5.0, 1.0, 2.0]);
    }

    #[test]
    fn test_absent_features_use_defaults() {
        let encoder = FeatureEncoder::fit(&training_set());
        let encoded = encoder.encode(&ProjectInput::default());
        assert_eq!(encoded, vec![0.0, 0.0, UNKNOWN_CODE, UNKNOWN_CODE]);
    }

    #[test]
    fn test_unknown_label_is_a_known_category_when_seen() {
        let ds =
            HistoricalDataset::from_csv_str("region,final_project_cost\nUnknown,1\nEast,2\n").unwrap();
        let encoder = FeatureEncoder::fit(&ds);
        assert_eq!(encoder.encode(&ProjectInput::default()), vec![1.0]);
    }

    #[test]
    fn test_decode_category() {
        let encoder = FeatureEncoder::fit(&training_set());
        assert_eq!(encoder.decode_category(Field::Region, 1.0), Some("South"));
        assert_eq!(encoder.decode_category(Field::Region, UNKNOWN_CODE), None);
        assert_eq!(encoder.decode_category(Field::Region, 0.5), None);
        assert_eq!(encoder.decode_category(Field::LaborCost, 0.0), None);
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(default_value(Field::Delays), FieldValue::Number(0.0));
        assert_eq!(
            default_value(Field::ProjectType),
            FieldValue::Category("Unknown".into())
        );
    }
}
