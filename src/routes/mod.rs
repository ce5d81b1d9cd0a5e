/**
 * Routes Module
 * API route handlers and the shared response envelopes
 */
pub mod auth;
pub mod bookings;
pub mod contact;
pub mod courses;
pub mod health;
pub mod insights;
pub mod media;
pub mod resources;
pub mod rss;
pub mod subscribers;
pub mod testimonials;
pub mod videos;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::validation::FieldError;

/// Error envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// Success envelope carrying only a human-readable message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// List envelope: `{ success, count, data }`
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Single-record envelope: `{ success, data }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 400 with the full list of violated fields, not just the first.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub success: bool,
    pub error: String,
    pub details: Vec<FieldError>,
}

pub(crate) fn validation_failed(details: Vec<FieldError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationErrorResponse {
            success: false,
            error: "Validation failed".to_string(),
            details,
        }),
    )
        .into_response()
}

pub(crate) fn db_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Database not available")),
    )
        .into_response()
}

/// 500 database envelope. The driver message is passed through because this
/// API fronts an internal/admin-adjacent tool, not a hardened public service.
pub(crate) fn db_error(context: &str, e: &sqlx::Error) -> Response {
    tracing::error!("Database error {}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_message("Database error", e.to_string())),
    )
        .into_response()
}

pub(crate) fn not_found(error: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(error))).into_response()
}

pub(crate) fn bad_request(error: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response()
}
