/**
 * Health Routes
 * Liveness, datastore, and readiness checks
 */
use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Simple liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub env: String,
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceCheck {
    pub success: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub database: String,
}

/// GET /health - Liveness ping
pub async fn health_ping() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        status: "OK".to_string(),
        message: "API is running".to_string(),
        timestamp: Utc::now(),
        env: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    })
}

/// GET /health/db - Datastore liveness, timed
pub async fn health_db() -> impl IntoResponse {
    match crate::db::health_check().await {
        Ok(duration) => (
            StatusCode::OK,
            Json(ServiceCheck {
                success: true,
                status: "healthy".to_string(),
                response_time_ms: Some(duration.as_millis() as u64),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ServiceCheck {
                success: false,
                status: "unhealthy".to_string(),
                response_time_ms: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// GET /health/ready - Readiness check
///
/// The API is considered ready as soon as it is serving; the database is
/// reported but optional (public submission endpoints degrade to 503 on
/// their own when the pool is absent).
pub async fn health_ready() -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();

    let database_status = match crate::db::health_check().await {
        Ok(_) => "healthy".to_string(),
        Err(_) => "unhealthy".to_string(),
    };

    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ready".to_string(),
            timestamp: Utc::now(),
            uptime,
            database: database_status,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/health", get(health_ping))
            .route("/health/db", get(health_db))
            .route("/health/ready", get(health_ready))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        init_start_time();
        let (status, body) = get_json::<HealthResponse>(test_router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.status, "OK");
    }

    #[tokio::test]
    async fn test_health_db_unhealthy_without_pool() {
        let (status, body) = get_json::<ServiceCheck>(test_router(), "/health/db").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status, "unhealthy");
        assert!(body.error.is_some());
    }

    #[tokio::test]
    async fn test_health_ready_reports_database_state() {
        init_start_time();
        let (status, body) = get_json::<ReadyResponse>(test_router(), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert_eq!(body.database, "unhealthy");
    }
}
