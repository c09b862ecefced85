//! Project Cost Advisor CLI
//!
//! A command-line tool for uploading company project histories and
//! requesting cost predictions and what-if scenarios from the estimator.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{companies, estimate};
use std::path::PathBuf;

/// Project Cost Advisor CLI
#[derive(Parser)]
#[command(name = "costctl")]
#[command(author, version, about = "CLI for the Project Cost Advisor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via COSTCTL_API_URL env var)
    #[arg(long, env = "COSTCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a company's historical projects (CSV) and train its model
    Upload {
        /// Company name
        company: String,

        /// CSV file with one project per row
        file: PathBuf,
    },

    /// Predict the cost of a project
    Predict {
        /// JSON file describing the project
        #[arg(long, short)]
        input: PathBuf,

        /// Company whose model to use (falls back to the industry formula)
        #[arg(long, short, env = "COSTCTL_COMPANY")]
        company: Option<String>,
    },

    /// Run what-if cost scenarios for a project
    Scenarios {
        /// JSON file describing the project
        #[arg(long, short)]
        input: PathBuf,

        /// Company whose overrun history sizes the contingency
        #[arg(long, short, env = "COSTCTL_COMPANY")]
        company: Option<String>,
    },

    /// List companies with a trained model
    Companies,

    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    // Initialize client
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    // Execute command
    match cli.command {
        Commands::Upload { company, file } => {
            companies::upload(&client, &company, &file, cli.format).await?;
        }
        Commands::Predict { input, company } => {
            let company = config.resolve_company(company);
            estimate::predict(&client, &input, company.as_deref(), cli.format).await?;
        }
        Commands::Scenarios { input, company } => {
            let company = config.resolve_company(company);
            estimate::scenarios(&client, &input, company.as_deref(), cli.format).await?;
        }
        Commands::Companies => {
            companies::list(&client, cli.format).await?;
        }
        Commands::Health => {
            companies::health(&client, cli.format).await?;
        }
    }

    Ok(())
}
