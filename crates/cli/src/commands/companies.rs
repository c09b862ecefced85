//! Company dataset and service status commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;

use crate::client::{ApiClient, CompanyList, ServiceHealth, UploadResponse};
use crate::output::{
    color_status, color_success_rate, format_currency, print_json, print_success, print_table,
    OutputFormat,
};

/// Row for the company table
#[derive(Tabled)]
struct CompanyRow {
    #[tabled(rename = "Company")]
    name: String,
    #[tabled(rename = "Projects")]
    projects: usize,
    #[tabled(rename = "Avg Cost")]
    avg_cost: String,
    #[tabled(rename = "Avg Duration")]
    avg_duration: String,
    #[tabled(rename = "Success Rate")]
    success_rate: String,
}

/// Upload a company's historical projects and train its model
pub async fn upload(
    client: &ApiClient,
    company: &str,
    file: &Path,
    format: OutputFormat,
) -> Result<()> {
    let csv = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let result: UploadResponse = client
        .post_csv(&["api", "companies", company, "dataset"], csv)
        .await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&result.message);
            println!("Projects loaded:        {}", result.projects_loaded);
            println!("Train R²:               {:.3}", result.train_score);
            println!("Test R²:                {:.3}", result.test_score);
        }
    }

    Ok(())
}

/// List companies with a trained model
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: CompanyList = client.get(&["api", "companies"]).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<CompanyRow> = result
                .companies
                .iter()
                .map(|(name, summary)| CompanyRow {
                    name: name.clone(),
                    projects: summary.total_projects,
                    avg_cost: format_currency(summary.avg_project_cost),
                    avg_duration: format!("{:.1} days", summary.avg_duration),
                    success_rate: color_success_rate(summary.success_rate),
                })
                .collect();
            print_table(&rows, "No company data loaded");
        }
    }

    Ok(())
}

/// Show service health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: ServiceHealth = client.get(&["health"]).await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Service Health".bold());
            println!("{}", "=".repeat(50));
            println!("Service:                {}", result.service);
            println!("Status:                 {}", color_status(&result.status));
            println!("Message:                {}", result.message.dimmed());
            if result.loaded_companies.is_empty() {
                println!("Companies:              {}", "none".dimmed());
            } else {
                println!("Companies:              {}", result.loaded_companies.join(", "));
            }
        }
    }

    Ok(())
}
