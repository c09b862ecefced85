//! Integration tests for the estimator API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use cost_estimator::api::{self, AppState};
use estimator_lib::{
    health::{components, HealthRegistry},
    predictor::TrainerConfig,
    CostEngine,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const UPLOAD_LIMIT: usize = 64 * 1024;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    api::register_components(&health_registry).await;

    let engine = Arc::new(CostEngine::new(TrainerConfig {
        n_estimators: 10,
        ..Default::default()
    }));
    let state = Arc::new(AppState::new(
        engine,
        health_registry,
        "cost-estimator-test",
        UPLOAD_LIMIT,
    ));
    let router = api::create_router(state.clone());

    (router, state)
}

fn history_csv() -> String {
    let mut csv = String::from(
        "project_type,project_size,project_duration,labor_cost,material_cost,equipment_cost,overhead_cost,inflation_rate,region,year,delays,rework_percent,safety_incidents,final_project_cost\n",
    );
    for i in 0..12 {
        let kind = if i % 2 == 0 { "Residential" } else { "Commercial" };
        let labor = 10_000 + 500 * i;
        let final_cost = (labor + 8_000) as f64 * 1.05;
        csv.push_str(&format!(
            "{},{},{},{},5000,2000,1000,3,North,2022,{},{},0,{}\n",
            kind,
            100 + i,
            30 + i,
            labor,
            i % 3,
            i % 2,
            final_cost
        ));
    }
    csv
}

fn project_json(company: Option<&str>) -> Value {
    let mut body = json!({
        "project_type": "Residential",
        "project_size": 100,
        "labor_cost": 100,
        "material_cost": 50,
        "equipment_cost": 30,
        "overhead_cost": 20,
        "region": "North",
        "year": 2024,
        "delays": 0,
        "rework_percent": 0,
        "safety_incidents": 0,
        "inflation_rate": 0
    });
    if let Some(company) = company {
        body["company_name"] = json!(company);
    }
    body
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_csv(company: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/companies/{}/dataset", company))
        .header("content-type", "text/csv")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_lists_loaded_companies() {
    let (app, _state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "cost-estimator-test");
    assert_eq!(health["loaded_companies"], json!([]));

    let response = app
        .clone()
        .oneshot(post_csv("acme", history_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["loaded_companies"], json!(["acme"]));
}

#[tokio::test]
async fn test_predict_without_company_uses_fallback() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .oneshot(post_json("/api/predict", &project_json(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["company_used"], Value::Null);
    assert_eq!(body["prediction"]["predicted_cost"], 200.0);
    assert_eq!(body["prediction"]["base_cost"], 200.0);
    assert_eq!(body["source"]["kind"], "fallback");
    assert_eq!(
        body["company_insights"],
        json!(["Using general industry data for prediction"])
    );
}

#[tokio::test]
async fn test_predict_missing_fields_returns_400() {
    let (app, _state) = setup_test_app().await;

    let mut body = project_json(None);
    body.as_object_mut().unwrap().remove("year");
    body.as_object_mut().unwrap().remove("labor_cost");

    let response = app
        .oneshot(post_json("/api/predict", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing required fields: labor_cost, year");
}

#[tokio::test]
async fn test_upload_then_predict_with_company_model() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(post_csv("acme", history_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let upload = json_body(response).await;
    assert_eq!(upload["success"], true);
    assert_eq!(upload["company_name"], "acme");
    assert_eq!(upload["projects_loaded"], 12);

    let response = app
        .clone()
        .oneshot(post_json("/api/predict", &project_json(Some("acme"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["company_used"], "acme");
    assert_eq!(body["source"]["kind"], "company_model");
    assert!(body["prediction"]["predicted_cost"].as_f64().unwrap() > 0.0);

    let companies = json_body(app.oneshot(get("/api/companies")).await.unwrap()).await;
    assert_eq!(companies["companies"]["acme"]["total_projects"], 12);
    assert_eq!(companies["companies"]["acme"]["success_rate"], 100.0);
}

#[tokio::test]
async fn test_company_detail() {
    let (app, _state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/api/companies/acme")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unknown company 'acme'");

    let response = app
        .clone()
        .oneshot(post_csv("acme", history_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/companies/acme")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["company_name"], "acme");
    assert_eq!(body["analysis"]["total_projects"], 12);
    assert_eq!(body["analysis"]["success_rate"], 100.0);
}

#[tokio::test]
async fn test_rejected_upload_degrades_trainer() {
    let (app, _state) = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(post_csv(
            "acme",
            "labor_cost,final_project_cost\nnot-a-number,10\n".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("labor_cost"));

    // Degraded still serves
    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = json_body(response).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"][components::TRAINER]["status"], "degraded");

    let response = app
        .clone()
        .oneshot(post_csv("acme", history_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(app.oneshot(get("/healthz")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_failed_training_task_recovers_on_next_upload() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(components::TRAINER, "Training task failed: task panicked")
        .await;

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .clone()
        .oneshot(post_csv("acme", history_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let (app, _state) = setup_test_app().await;

    let mut csv = history_csv();
    while csv.len() <= UPLOAD_LIMIT {
        csv.push_str(&history_csv());
    }

    let response = app.oneshot(post_csv("acme", csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_scenarios_endpoint() {
    let (app, _state) = setup_test_app().await;

    let mut body = project_json(None);
    body["labor_cost"] = json!(80_000);
    body["material_cost"] = json!(60_000);
    body["equipment_cost"] = json!(25_000);
    body["overhead_cost"] = json!(15_000);

    let response = app
        .oneshot(post_json("/api/scenarios", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let analysis = &body["scenario_analysis"];
    assert_eq!(analysis["baseline_cost"], 180_000.0);
    assert_eq!(analysis["scenarios"].as_array().unwrap().len(), 4);
    assert_eq!(analysis["avg_cost_overrun"], 10.0);
    assert_eq!(analysis["worst_case_scenario"], "Weather Delay (14 days)");
}

#[tokio::test]
async fn test_readyz_tracks_ready_flag() {
    let (app, state) = setup_test_app().await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let readiness = json_body(response).await;
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    state
        .health_registry
        .set_unhealthy(components::ENGINE, "Registry unavailable")
        .await;
    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;

    // Produce at least one observation per metric family
    let response = app
        .clone()
        .oneshot(post_json("/api/predict", &project_json(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("cost_estimator_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("cost_estimator_predictions_total"));
}
