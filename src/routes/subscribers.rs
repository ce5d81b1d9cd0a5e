/**
 * Subscriber Routes
 * Newsletter signup with duplicate detection, plus the admin list
 */
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::db::{self, models::Subscriber};
use crate::routes::auth::require_auth;
use crate::routes::{db_error, db_unavailable, validation_failed};
use crate::routes::{ErrorResponse, ListResponse, MessageResponse};
use crate::validation::{self, SubscribePayload};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// POST /api/subscribers - Subscribe an email address
///
/// A duplicate email is a distinguishable condition (409), not a generic
/// failure, so the site can tell the visitor they are already subscribed.
pub async fn subscribe(Json(payload): Json<SubscribePayload>) -> Response {
    let subscriber = match validation::validate_subscriber(&payload) {
        Ok(subscriber) => subscriber,
        Err(details) => return validation_failed(details),
    };

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("INSERT INTO subscribers (email, source) VALUES ($1, $2)")
        .bind(&subscriber.email)
        .bind(&subscriber.source)
        .execute(pool.as_ref())
        .await
    {
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse::new("You're subscribed!")),
        )
            .into_response(),
        Err(e) if is_unique_violation(&e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("You're already subscribed!")),
        )
            .into_response(),
        Err(e) => db_error("creating subscriber", &e),
    }
}

/// GET /api/subscribers - All subscribers, newest first (admin)
pub async fn list_subscribers(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(subscribers) => (StatusCode::OK, Json(ListResponse::new(subscribers))).into_response(),
        Err(e) => db_error("listing subscribers", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new().route("/api/subscribers", post(subscribe).get(list_subscribers))
    }

    #[tokio::test]
    async fn test_subscribe_invalid_email_rejected_with_details() {
        let req = Request::post("/api/subscribers")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"email": "not-an-email"}).to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_subscribe_valid_email_without_pool_returns_503() {
        let req = Request::post("/api/subscribers")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"email": "reader@example.com", "source": "home_page"})
                    .to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_list_requires_auth() {
        let req = Request::get("/api/subscribers").body(Body::empty()).unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
