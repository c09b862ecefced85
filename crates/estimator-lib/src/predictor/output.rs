//! Prediction output assembly
//!
//! Derives base cost, contingency, high-risk areas and recommendations
//! from a point estimate.

use crate::models::{Field, PredictionResult, PredictionSource, ProjectInput, RiskArea};

/// Thresholds that flag high-risk areas and pick the recommendation tier
#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    /// Delay days above which the timeline is at risk
    pub delays: f64,
    /// Rework percentage above which quality is at risk
    pub rework_percent: f64,
    /// Incident count above which safety is at risk
    pub safety_incidents: f64,
    /// Contingency percentage above which the budget is at risk
    pub budget_contingency: f64,
    /// Contingency percentage above which the project is high risk
    pub high_risk_contingency: f64,
    /// Contingency percentage above which the project is medium risk
    pub medium_risk_contingency: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            delays: 7.0,
            rework_percent: 4.0,
            safety_incidents: 1.0,
            budget_contingency: 15.0,
            high_risk_contingency: 20.0,
            medium_risk_contingency: 12.0,
        }
    }
}

/// Builds a [`PredictionResult`] around a point estimate
#[derive(Debug, Clone, Default)]
pub struct ResultFormatter {
    thresholds: RiskThresholds,
}

impl ResultFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn format(
        &self,
        input: &ProjectInput,
        predicted_cost: f64,
        insights: Vec<String>,
        source: PredictionSource,
    ) -> PredictionResult {
        let base_cost = input.base_cost();
        let risk_adjustment = predicted_cost - base_cost;
        let contingency_percent = contingency_percent(risk_adjustment, base_cost);
        let high_risk_areas = self.high_risk_areas(input, contingency_percent);
        let recommendations = self.recommendations(contingency_percent, &high_risk_areas);

        PredictionResult {
            predicted_cost,
            base_cost,
            risk_adjustment,
            contingency_percent,
            high_risk_areas,
            insights,
            recommendations,
            source,
        }
    }

    pub fn high_risk_areas(&self, input: &ProjectInput, contingency_percent: f64) -> Vec<RiskArea> {
        let t = &self.thresholds;
        let mut areas = Vec::new();
        if input.number_or_zero(Field::Delays) > t.delays {
            areas.push(RiskArea::Timeline);
        }
        if input.number_or_zero(Field::ReworkPercent) > t.rework_percent {
            areas.push(RiskArea::Quality);
        }
        if input.number_or_zero(Field::SafetyIncidents) > t.safety_incidents {
            areas.push(RiskArea::Safety);
        }
        if contingency_percent > t.budget_contingency {
            areas.push(RiskArea::Budget);
        }
        areas
    }

    pub fn recommendations(&self, contingency_percent: f64, areas: &[RiskArea]) -> Vec<String> {
        let t = &self.thresholds;
        let tier: &[&str] = if contingency_percent > t.high_risk_contingency {
            &[
                "HIGH RISK PROJECT - Consider:",
                "Increase contingency budget to 25%",
                "Review project scope and timeline",
                "Implement stronger risk mitigation",
                "Consider phased delivery approach",
            ]
        } else if contingency_percent > t.medium_risk_contingency {
            &[
                "MEDIUM RISK PROJECT - Suggestions:",
                "Maintain 15% contingency budget",
                "Monitor risks closely",
                "Regular progress reviews",
            ]
        } else {
            &[
                "LOW RISK PROJECT - Good to go!",
                "Standard 10% contingency sufficient",
                "Maintain current risk management",
            ]
        };

        let mut out: Vec<String> = tier.iter().map(|s| s.to_string()).collect();
        for area in areas {
            out.push(
                match area {
                    RiskArea::Timeline => "Focus on timeline management and buffer planning",
                    RiskArea::Quality => "Improve quality control processes",
                    RiskArea::Safety => "Enhance safety protocols and training",
                    RiskArea::Budget => "Strengthen budget controls and monitoring",
                }
                .to_string(),
            );
        }
        out
    }
}

/// Risk adjustment as a percentage of base cost; 0 when base cost is 0
pub fn contingency_percent(risk_adjustment: f64, base_cost: f64) -> f64 {
    if base_cost == 0.0 {
        0.0
    } else {
        risk_adjustment / base_cost * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(delays: f64, rework: f64, incidents: f64) -> ProjectInput {
        ProjectInput {
            labor_cost: Some(100.0),
            material_cost: Some(50.0),
            equipment_cost: Some(30.0),
            overhead_cost: Some(20.0),
            delays: Some(delays),
            rework_percent: Some(rework),
            safety_incidents: Some(incidents),
            ..Default::default()
        }
    }

    #[test]
    fn test_low_risk_result() {
        let result = ResultFormatter::new().format(
            &input(0.0, 0.0, 0.0),
            210.0,
            vec![],
            PredictionSource::Fallback,
        );
        assert_eq!(result.base_cost, 200.0);
        assert_eq!(result.risk_adjustment, 10.0);
        assert_eq!(result.contingency_percent, 5.0);
        assert!(result.high_risk_areas.is_empty());
        assert_eq!(result.recommendations[0], "LOW RISK PROJECT - Good to go!");
        assert_eq!(result.recommendations.len(), 3);
    }

    #[test]
    fn test_all_areas_flagged_in_order() {
        let formatter = ResultFormatter::new();
        let result = formatter.format(
            &input(8.0, 5.0, 2.0),
            260.0,
            vec![],
            PredictionSource::Fallback,
        );
        assert_eq!(
            result.high_risk_areas,
            vec![
                RiskArea::Timeline,
                RiskArea::Quality,
                RiskArea::Safety,
                RiskArea::Budget
            ]
        );
        assert_eq!(result.recommendations[0], "HIGH RISK PROJECT - Consider:");
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some("Strengthen budget controls and monitoring")
        );
        assert_eq!(result.recommendations.len(), 9);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let formatter = ResultFormatter::new();
        assert!(formatter.high_risk_areas(&input(7.0, 4.0, 1.0), 15.0).is_empty());
    }

    #[test]
    fn test_medium_tier() {
        let recs = ResultFormatter::new().recommendations(13.0, &[]);
        assert_eq!(recs[0], "MEDIUM RISK PROJECT - Suggestions:");
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn test_zero_base_cost_guard() {
        let result = ResultFormatter::new().format(
            &ProjectInput::default(),
            50.0,
            vec![],
            PredictionSource::Fallback,
        );
        assert_eq!(result.contingency_percent, 0.0);
        assert_eq!(result.risk_adjustment, 50.0);
    }
}
