//! Property tests for the pure estimation functions

use estimator_lib::dataset::success_rate;
use estimator_lib::predictor::{CostPredictor, FallbackPredictor, FeatureEncoder};
use estimator_lib::scenario::{simulate, worst_case};
use estimator_lib::{Field, HistoricalDataset, ProjectInput};
use proptest::prelude::*;

fn cost() -> impl Strategy<Value = f64> {
    0.0f64..1_000_000.0
}

fn risk() -> impl Strategy<Value = f64> {
    0.0f64..50.0
}

fn input_with_risk(delays: f64, rework: f64, incidents: f64, inflation: f64) -> ProjectInput {
    ProjectInput {
        labor_cost: Some(40_000.0),
        material_cost: Some(30_000.0),
        equipment_cost: Some(20_000.0),
        overhead_cost: Some(10_000.0),
        delays: Some(delays),
        rework_percent: Some(rework),
        safety_incidents: Some(incidents),
        inflation_rate: Some(inflation),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn success_rate_is_100_when_every_row_within_tolerance(
        rows in prop::collection::vec((1.0f64..100_000.0, 1.0f64..100_000.0, -0.149f64..0.149), 1..30)
    ) {
        let mut csv = String::from("labor_cost,material_cost,final_project_cost\n");
        for (labor, material, variance) in &rows {
            let final_cost = (labor + material) * (1.0 + variance);
            csv.push_str(&format!("{},{},{}\n", labor, material, final_cost));
        }
        let ds = HistoricalDataset::from_csv_str(&csv).unwrap();
        prop_assert_eq!(success_rate(&ds).unwrap(), 100.0);
    }

    #[test]
    fn zero_cost_projects_have_zero_percent_change(
        delays in risk(), rework in risk(), overrun in prop::option::of(-50.0f64..100.0)
    ) {
        let input = ProjectInput {
            labor_cost: Some(0.0),
            material_cost: Some(0.0),
            equipment_cost: Some(0.0),
            overhead_cost: Some(0.0),
            delays: Some(delays),
            rework_percent: Some(rework),
            ..Default::default()
        };
        let set = simulate(&input, overrun);
        prop_assert!(set.scenarios.iter().all(|s| s.percent_change == 0.0));
        prop_assert_eq!(set.total_recommended_budget, 0.0);
    }

    #[test]
    fn fallback_is_monotonic_in_each_risk_factor(
        delays in risk(), rework in risk(), incidents in risk(), inflation in risk(),
        bump in 0.0f64..20.0, which in 0usize..4
    ) {
        let before = input_with_risk(delays, rework, incidents, inflation);
        let after = match which {
            0 => input_with_risk(delays + bump, rework, incidents, inflation),
            1 => input_with_risk(delays, rework + bump, incidents, inflation),
            2 => input_with_risk(delays, rework, incidents + bump, inflation),
            _ => input_with_risk(delays, rework, incidents, inflation + bump),
        };
        prop_assert!(FallbackPredictor.predict(&after) >= FallbackPredictor.predict(&before));
    }

    #[test]
    fn worst_case_has_maximum_difference_and_is_first(
        labor in cost(), material in cost(), equipment in cost(), overhead in cost()
    ) {
        let input = ProjectInput {
            labor_cost: Some(labor),
            material_cost: Some(material),
            equipment_cost: Some(equipment),
            overhead_cost: Some(overhead),
            ..Default::default()
        };
        let set = simulate(&input, None);
        let idx = worst_case(&set.scenarios).unwrap();
        let max = set.scenarios[idx].difference;
        prop_assert_eq!(&set.worst_case_scenario, &set.scenarios[idx].name);
        prop_assert!(set.scenarios.iter().all(|s| s.difference <= max));
        prop_assert!(set.scenarios[..idx].iter().all(|s| s.difference < max));
        prop_assert!(set.risk_adjusted_contingency >= set.max_increase);
    }

    #[test]
    fn known_categories_round_trip_through_encoder(
        types in prop::collection::vec("[A-Z][a-z]{2,8}", 1..6),
        regions in prop::collection::vec("[A-Z][a-z]{2,8}", 1..6),
        pick in 0usize..36
    ) {
        let mut csv = String::from("project_type,region,labor_cost,final_project_cost\n");
        for (i, t) in types.iter().enumerate() {
            let r = &regions[i % regions.len()];
            csv.push_str(&format!("{},{},{},{}\n", t, r, i, i * 10));
        }
        for (i, r) in regions.iter().enumerate() {
            let t = &types[i % types.len()];
            csv.push_str(&format!("{},{},{},{}\n", t, r, i, i * 10));
        }
        let ds = HistoricalDataset::from_csv_str(&csv).unwrap();
        let encoder = FeatureEncoder::fit(&ds);

        let project_type = types[pick % types.len()].clone();
        let region = regions[pick % regions.len()].clone();
        let input = ProjectInput {
            project_type: Some(project_type.clone()),
            region: Some(region.clone()),
            labor_cost: Some(1.0),
            ..Default::default()
        };
        let encoded = encoder.encode(&input);
        let names = encoder.feature_names();
        let at = |name: &str| encoded[names.iter().position(|n| *n == name).unwrap()];

        prop_assert_eq!(encoder.decode_category(Field::ProjectType, at("project_type")), Some(project_type.as_str()));
        prop_assert_eq!(encoder.decode_category(Field::Region, at("region")), Some(region.as_str()));
    }
}
