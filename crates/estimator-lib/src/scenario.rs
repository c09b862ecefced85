//! Deterministic what-if cost scenarios
//!
//! Applies a fixed set of cost shocks to a project's base cost and sizes a
//! contingency from the worst of them. Everything here is a pure function
//! of its inputs.

use crate::models::{Field, ProjectInput, Scenario, ScenarioSet};

/// Overrun percentage assumed when a company has no history
pub const DEFAULT_COST_OVERRUN_PERCENT: f64 = 10.0;

/// Share of base cost lost per day of delay
pub const DELAY_COST_PER_DAY: f64 = 0.002;

/// The fixed cost shocks, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    LaborIncrease,
    EquipmentDelay,
    WeatherDelay,
    MaterialPriceIncrease,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::LaborIncrease,
        ScenarioKind::EquipmentDelay,
        ScenarioKind::WeatherDelay,
        ScenarioKind::MaterialPriceIncrease,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::LaborIncrease => "Labor +10%",
            ScenarioKind::EquipmentDelay => "Equipment Delay (7 days)",
            ScenarioKind::WeatherDelay => "Weather Delay (14 days)",
            ScenarioKind::MaterialPriceIncrease => "Material Price +15%",
        }
    }

    /// Absolute cost added on top of `base_cost`
    pub fn increase(&self, input: &ProjectInput, base_cost: f64) -> f64 {
        let labor = input.number_or_zero(Field::LaborCost);
        match self {
            ScenarioKind::LaborIncrease => labor * 0.10,
            ScenarioKind::EquipmentDelay => {
                delay_cost(base_cost, 7.0) + input.number_or_zero(Field::EquipmentCost) * 0.08
            }
            ScenarioKind::WeatherDelay => delay_cost(base_cost, 14.0) + labor * 0.12,
            ScenarioKind::MaterialPriceIncrease => input.number_or_zero(Field::MaterialCost) * 0.15,
        }
    }

    pub fn evaluate(&self, input: &ProjectInput, base_cost: f64) -> Scenario {
        let cost = base_cost + self.increase(input, base_cost);
        Scenario {
            name: self.name().to_string(),
            cost,
            difference: cost - base_cost,
            percent_change: percent_change(cost, base_cost),
        }
    }
}

fn delay_cost(base_cost: f64, days: f64) -> f64 {
    base_cost * days * DELAY_COST_PER_DAY
}

/// Relative change in percent; 0 when the baseline is 0
pub fn percent_change(cost: f64, base_cost: f64) -> f64 {
    if base_cost == 0.0 {
        0.0
    } else {
        (cost / base_cost - 1.0) * 100.0
    }
}

/// Index of the largest difference, first occurrence on ties
pub fn worst_case(scenarios: &[Scenario]) -> Option<usize> {
    let mut worst: Option<usize> = None;
    for (idx, scenario) in scenarios.iter().enumerate() {
        match worst {
            Some(w) if scenarios[w].difference >= scenario.difference => {}
            _ => worst = Some(idx),
        }
    }
    worst
}

/// Run every scenario against the input
///
/// `avg_cost_overrun` is the company's historical overrun percentage. A
/// company that historically came in under budget shrinks the contingency.
pub fn simulate(input: &ProjectInput, avg_cost_overrun: Option<f64>) -> ScenarioSet {
    let base_cost = input.base_cost();
    let avg_cost_overrun = avg_cost_overrun.unwrap_or(DEFAULT_COST_OVERRUN_PERCENT);

    let scenarios: Vec<Scenario> = ScenarioKind::ALL
        .iter()
        .map(|kind| kind.evaluate(input, base_cost))
        .collect();

    let (worst_case_scenario, max_increase) = worst_case(&scenarios)
        .map(|idx| (scenarios[idx].name.clone(), scenarios[idx].difference))
        .unwrap_or_default();
    let risk_adjusted_contingency = max_increase * (1.0 + avg_cost_overrun / 100.0);

    ScenarioSet {
        baseline_cost: base_cost,
        scenarios,
        worst_case_scenario,
        max_increase,
        avg_cost_overrun,
        risk_adjusted_contingency,
        total_recommended_budget: base_cost + risk_adjusted_contingency,
    }
}
