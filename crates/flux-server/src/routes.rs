use crate::error::{ApiError, ApiResult};
use crate::repository::{StatusCheck, StatusRepository};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn StatusRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn StatusRepository>) -> Self {
        Self { repository }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/", get(root))
        .route("/api/status", get(list_status).post(create_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

async fn create_status(
    State(state): State<AppState>,
    body: Result<Json<StatusCheckCreate>, JsonRejection>,
) -> ApiResult<Json<StatusCheck>> {
    let Json(input) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let check = StatusCheck::new(input.client_name);
    state.repository.insert(check.clone())?;
    tracing::info!("Status check from {}", check.client_name);
    Ok(Json(check))
}

async fn list_status(State(state): State<AppState>) -> ApiResult<Json<Vec<StatusCheck>>> {
    Ok(Json(state.repository.list()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(Arc::new(MemoryRepository::new())))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_status(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/status")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root() {
        let (status, body) = send(app(), get("/api/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Hello World" }));
    }

    #[tokio::test]
    async fn test_create_status() {
        let (status, body) = send(app(), post_status(r#"{"client_name":"uptime-check"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["client_name"], "uptime-check");
        assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_list_status_in_order() {
        let app = app();
        for name in ["first", "second"] {
            let body = format!(r#"{{"client_name":"{}"}}"#, name);
            let (status, _) = send(app.clone(), post_status(&body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(app, get("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["client_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_invalid_body_is_unprocessable() {
        for body in [r#"{}"#, r#"{"client_name": 7}"#, "not json"] {
            let (status, body) = send(app(), post_status(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn test_repository_failure_is_500() {
        let app = router(AppState::new(Arc::new(MemoryRepository::with_limit(0))));
        let (status, body) = send(app, post_status(r#"{"client_name":"x"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("full"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = send(app(), get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
