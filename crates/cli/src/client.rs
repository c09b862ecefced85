//! API client for communicating with the cost estimator service

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// API client for the cost estimator service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid API URL: {}", base_url);
        }

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL, percent-encoding each path segment
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Invalid API URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        Self::send(self.client.get(url)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.url(segments)?;
        Self::send(self.client.post(url).json(body)).await
    }

    /// Make a POST request with a CSV body
    pub async fn post_csv<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: String,
    ) -> Result<T> {
        let url = self.url(segments)?;
        Self::send(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "text/csv")
                .body(body),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await.context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    pub service: String,
    pub message: String,
    pub loaded_companies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub company_name: String,
    pub projects_loaded: usize,
    pub train_score: f64,
    pub test_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySummary {
    pub total_projects: usize,
    pub avg_project_cost: f64,
    pub avg_duration: f64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyList {
    pub success: bool,
    pub companies: BTreeMap<String, CompanySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_cost: f64,
    pub base_cost: f64,
    pub risk_adjustment: f64,
    pub contingency_percent: f64,
    pub high_risk_areas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSource {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub company_used: Option<String>,
    pub prediction: Prediction,
    pub company_insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: PredictionSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub cost: f64,
    pub difference: f64,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub baseline_cost: f64,
    pub scenarios: Vec<Scenario>,
    pub worst_case_scenario: String,
    pub max_increase: f64,
    pub avg_cost_overrun: f64,
    pub risk_adjusted_contingency: f64,
    pub total_recommended_budget: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub success: bool,
    pub scenario_analysis: ScenarioAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
