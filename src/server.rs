use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use metrics::counter;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::coa::{build_records, write_csv};
use crate::engine::Engine;
use crate::types::{ClassificationData, ClassificationRequest, ClassificationResponse, MapRequest};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn Engine + Send + Sync>,
    model: String,
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine + Send + Sync>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify", post(classify_handler))
        .route("/map", post(map_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[tracing::instrument(skip(state, request), fields(input_count = request.input.len()))]
async fn classify_handler(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Json<ClassificationResponse> {
    counter!("coa_classify_requests_total", "route" => "classify").increment(1);
    tracing::info!("Processing classification request");

    let labels = state.engine.classify(&request.input).await;
    let data = labels
        .into_iter()
        .enumerate()
        .map(|(index, label)| ClassificationData { index, label })
        .collect();

    Json(ClassificationResponse {
        id: format!("classify-{}", uuid::Uuid::new_v4().simple()),
        object: "list".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: state.model.clone(),
        data,
    })
}

#[tracing::instrument(skip(state, request), fields(account_count = request.accounts.len()))]
async fn map_handler(
    State(state): State<AppState>,
    Json(request): Json<MapRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    counter!("coa_classify_requests_total", "route" => "map").increment(1);

    let names: Vec<String> = request.accounts.iter().map(|a| a.name.clone()).collect();
    let labels = state.engine.classify(&names).await;
    let records = build_records(request.accounts, labels);

    let mut body = Vec::new();
    write_csv(&records, &mut body).map_err(|e| {
        tracing::error!(error = %e, "Failed to render mapping");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!(records = records.len(), "Mapping completed");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"mapped_coa.csv\"",
            ),
        ],
        body,
    ))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "model": state.model }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    /// Labels every account with its name reversed.
    struct ReversingEngine;

    #[async_trait]
    impl Engine for ReversingEngine {
        async fn classify(&self, accounts: &[String]) -> Vec<String> {
            accounts.iter().map(|a| a.chars().rev().collect()).collect()
        }
    }

    fn app() -> Router {
        router(AppState::new(Arc::new(ReversingEngine), "gpt-4-turbo"))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn classify_returns_indexed_labels() {
        let response = app()
            .oneshot(post_json("/classify", json!({ "input": ["abc", "xyz"] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["object"], "list");
        assert_eq!(body["model"], "gpt-4-turbo");
        assert_eq!(
            body["data"],
            json!([{ "index": 0, "label": "cba" }, { "index": 1, "label": "zyx" }])
        );
    }

    #[tokio::test]
    async fn map_returns_csv() {
        let request = json!({
            "accounts": [
                { "code": "1000", "name": "Cash" },
                { "code": "2000", "name": "Loan" }
            ]
        });

        let response = app().oneshot(post_json("/map", request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            String::from_utf8(body_bytes(response).await).unwrap(),
            "Account Type,Account Name,Account Code,Status,Unique ID\n\
             hsaC,Cash,1000,Active,\n\
             naoL,Loan,2000,Active,\n"
        );
    }

    #[tokio::test]
    async fn empty_input_is_accepted() {
        let response = app()
            .oneshot(post_json("/classify", json!({ "input": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = app()
            .oneshot(post_json("/classify", json!({ "accounts": "nope" })))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_model() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body, json!({ "status": "ok", "model": "gpt-4-turbo" }));
    }
}
