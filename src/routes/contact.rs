/**
 * Contact Routes
 * Public submission endpoint plus the admin inbox (list, mark-read)
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, models::Contact};
use crate::mailer;
use crate::routes::auth::require_auth;
use crate::routes::{db_error, db_unavailable, not_found, validation_failed};
use crate::routes::{ListResponse, MessageResponse};
use crate::validation::{self, ContactPayload};

/// Response for POST /api/contact
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

/// POST /api/contact - Submit the contact form
///
/// Pipeline: validate, persist, then notify. The notification is dispatched
/// on a detached task; its failure never changes the caller's outcome
/// because the submission is already saved.
pub async fn submit_contact(Json(payload): Json<ContactPayload>) -> Response {
    let contact = match validation::validate_contact(&payload) {
        Ok(contact) => contact,
        Err(details) => return validation_failed(details),
    };

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let inserted = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO contacts (full_name, email, purpose, city, country, message)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&contact.full_name)
    .bind(&contact.email)
    .bind(&contact.purpose)
    .bind(&contact.city)
    .bind(&contact.country)
    .bind(&contact.message)
    .fetch_one(pool.as_ref())
    .await;

    match inserted {
        Ok(id) => {
            tokio::spawn(async move {
                if let Err(e) = mailer::send_contact_notification(&contact).await {
                    tracing::warn!(
                        "Contact notification failed (submission already saved): {}",
                        e
                    );
                }
            });

            (
                StatusCode::CREATED,
                Json(SubmitResponse {
                    success: true,
                    message: "Thank you for reaching out. You will receive a response within \
                              24-48 hours."
                        .to_string(),
                    id,
                }),
            )
                .into_response()
        }
        Err(e) => db_error("creating contact submission", &e),
    }
}

/// GET /api/contact - List all submissions, newest first (admin)
pub async fn list_contacts(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts ORDER BY created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(contacts) => (StatusCode::OK, Json(ListResponse::new(contacts))).into_response(),
        Err(e) => db_error("listing contacts", &e),
    }
}

/// PATCH /api/contact/{id}/read - Mark a submission as read (admin)
pub async fn mark_contact_read(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("UPDATE contacts SET is_read = true WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Contact not found"),
        Ok(_) => (StatusCode::OK, Json(MessageResponse::new("Marked as read"))).into_response(),
        Err(e) => db_error("marking contact read", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{patch, post};
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/api/contact", post(submit_contact).get(list_contacts))
            .route("/api/contact/{id}/read", patch(mark_contact_read))
    }

    async fn post_body(app: Router, uri: &str, json: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_submit_empty_payload_lists_all_violated_fields() {
        let (status, body) = post_body(test_router(), "/api/contact", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["full_name", "email", "purpose", "message"]);
    }

    #[tokio::test]
    async fn test_submit_short_message_rejected_with_field_detail() {
        let (status, body) = post_body(
            test_router(),
            "/api/contact",
            serde_json::json!({
                "full_name": "Ahmad F.",
                "email": "a@x.com",
                "purpose": "Consulting",
                "message": "hi"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["field"], "message");
    }

    #[tokio::test]
    async fn test_submit_valid_payload_without_pool_returns_503() {
        let (status, _) = post_body(
            test_router(),
            "/api/contact",
            serde_json::json!({
                "full_name": "Ahmad F.",
                "email": "a@x.com",
                "purpose": "Consulting",
                "message": "I would like to discuss a market-entry engagement."
            }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_list_requires_auth() {
        let req = Request::get("/api/contact").body(Body::empty()).unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mark_read_with_token_but_no_pool_returns_503() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::patch(format!(
            "/api/contact/{}/read",
            Uuid::new_v4()
        ))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
