//! Prediction and scenario commands

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, PredictResponse, ScenarioResponse};
use crate::output::{
    format_currency, format_percent, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for the scenario table
#[derive(Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    name: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Difference")]
    difference: String,
    #[tabled(rename = "Change")]
    change: String,
}

/// Read a project description and attach the company, if any
pub fn load_request(path: &Path, company: Option<&str>) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let Value::Object(mut project) = value else {
        anyhow::bail!("{} must contain a JSON object", path.display());
    };
    if let Some(company) = company {
        project.insert("company_name".to_string(), Value::String(company.to_string()));
    }
    Ok(project)
}

/// Predict a project's cost
pub async fn predict(
    client: &ApiClient,
    input: &Path,
    company: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let request = load_request(input, company)?;
    let result: PredictResponse = client.post(&["api", "predict"], &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let p = &result.prediction;
            println!("{}", "Cost Prediction".bold());
            println!("{}", "=".repeat(50));
            match (&result.company_used, &result.source.model_version) {
                (Some(company), Some(version)) if result.source.kind == "company_model" => {
                    println!("Company:                {}", company.cyan());
                    println!("Model:                  {}", version.dimmed());
                }
                _ => println!("Model:                  {}", "General industry formula".cyan()),
            }
            println!();

            println!("Base cost:              {}", format_currency(p.base_cost));
            println!("Risk adjustment:        {}", format_currency(p.risk_adjustment));
            println!("Contingency:            {}", format_percent(p.contingency_percent));
            println!(
                "{} {}",
                "Predicted cost:        ".bold(),
                format_currency(p.predicted_cost).green().bold()
            );

            if !p.high_risk_areas.is_empty() {
                println!();
                print_warning(&format!("High risk areas: {}", p.high_risk_areas.join(", ")));
            }

            if !result.company_insights.is_empty() {
                println!();
                println!("{}", "Insights".bold());
                println!("{}", "-".repeat(50));
                for insight in &result.company_insights {
                    print_info(insight);
                }
            }

            if !result.recommendations.is_empty() {
                println!();
                println!("{}", "Recommendations".bold());
                println!("{}", "-".repeat(50));
                for line in &result.recommendations {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}

/// Run the what-if scenarios for a project
pub async fn scenarios(
    client: &ApiClient,
    input: &Path,
    company: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let request = load_request(input, company)?;
    let result: ScenarioResponse = client.post(&["api", "scenarios"], &request).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let analysis = &result.scenario_analysis;
            println!("{}", "Scenario Analysis".bold());
            println!("{}", "=".repeat(50));
            println!("Baseline cost:          {}", format_currency(analysis.baseline_cost));
            println!();

            let rows: Vec<ScenarioRow> = analysis
                .scenarios
                .iter()
                .map(|s| ScenarioRow {
                    name: s.name.clone(),
                    cost: format_currency(s.cost),
                    difference: format_currency(s.difference),
                    change: format_percent(s.percent_change),
                })
                .collect();
            print_table(&rows, "No scenarios returned");

            println!();
            println!("Worst case:             {}", analysis.worst_case_scenario.red());
            println!("Avg historical overrun: {}", format_percent(analysis.avg_cost_overrun));
            println!(
                "Contingency reserve:    {}",
                format_currency(analysis.risk_adjusted_contingency)
            );
            println!(
                "{} {}",
                "Recommended budget:    ".bold(),
                format_currency(analysis.total_recommended_budget).green().bold()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_request_adds_company() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"labor_cost": 100, "region": "North"}}"#).unwrap();

        let request = load_request(file.path(), Some("acme")).unwrap();
        assert_eq!(request["company_name"], "acme");
        assert_eq!(request["labor_cost"], 100);

        let request = load_request(file.path(), None).unwrap();
        assert!(!request.contains_key("company_name"));
    }

    #[test]
    fn test_load_request_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(load_request(file.path(), None).is_err());
    }
}
