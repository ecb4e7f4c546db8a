//! HTTP surface over in-memory adapters.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use life_connections::adapters::http::connections::USER_ID_HEADER;
use life_connections::adapters::http::{api_router, ConnectionsAppState};
use life_connections::adapters::{InMemoryConnectionStore, InMemoryDomainDataSource};
use life_connections::application::{
    AnalyzeConnectionsConfig, AnalyzeConnectionsHandler, GetConnectionsHandler,
};
use life_connections::domain::connections::AnalysisOptions;

fn app() -> (Router, Arc<InMemoryConnectionStore>) {
    let data_source =
        Arc::new(InMemoryDomainDataSource::new().with_metrics(&user(), life_scenario(42)));
    let store = Arc::new(InMemoryConnectionStore::new());
    let state = ConnectionsAppState {
        analyze_handler: Arc::new(AnalyzeConnectionsHandler::new(
            data_source,
            store.clone(),
            AnalyzeConnectionsConfig::default(),
        )),
        get_handler: Arc::new(GetConnectionsHandler::new(store.clone())),
        defaults: AnalysisOptions::default(),
        verbose_errors: false,
    };
    (api_router(state), store)
}

fn analyze(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/connections/analyze")
        .header(USER_ID_HEADER, "user-1")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "ok");
}

#[tokio::test]
async fn analyze_requires_user_header() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/connections/analyze")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn analyze_then_list() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(analyze(r#"{"asOf": "2024-06-09"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["pairsAnalyzed"], 6);
    assert_eq!(body["significantPairs"], 1);
    assert_eq!(body["connections"][0]["domainA"]["type"], "badminton");
    assert_eq!(body["connections"][0]["direction"], "positive");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/connections")
                .header(USER_ID_HEADER, "user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["connections"][0]["domainB"]["type"], "sleep");
}

#[tokio::test]
async fn invalid_options_return_failure_without_writing() {
    let (app, store) = app();

    let response = app
        .oneshot(analyze(r#"{"minPValue": 0, "asOf": "2024-06-09"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "VALIDATION_FAILED");
    assert!(body["reason"].as_str().unwrap().contains("min_p_value"));
    assert_eq!(store.replace_count(), 0);
}

#[tokio::test]
async fn oversized_lookback_returns_failure_instead_of_aborting() {
    let (app, store) = app();

    let response = app
        .oneshot(analyze(r#"{"lookbackDays": 4294967295, "asOf": "2024-06-09"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "VALIDATION_FAILED");
    assert!(body["reason"].as_str().unwrap().contains("lookback_days"));
    assert_eq!(store.replace_count(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, store) = app();

    let response = app.oneshot(analyze("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["success"], false);
    assert_eq!(store.replace_count(), 0);
}
