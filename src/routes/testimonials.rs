/**
 * Testimonial Routes
 * Public list of published testimonials plus full admin CRUD
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, models::Testimonial};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ListResponse, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct TestimonialListQuery {
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTestimonialRequest {
    pub client_name: String,
    #[serde(default)]
    pub client_role: Option<String>,
    #[serde(default)]
    pub client_location: Option<String>,
    pub content: String,
    #[serde(default = "default_rating")]
    pub rating: i16,
    #[serde(default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_rating() -> i16 {
    5
}

fn default_service_type() -> String {
    "General".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTestimonialRequest {
    pub client_name: Option<String>,
    pub client_role: Option<String>,
    pub client_location: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i16>,
    pub service_type: Option<String>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

fn rating_in_bounds(rating: i16) -> bool {
    (1..=5).contains(&rating)
}

/// GET /api/testimonials - Published testimonials, newest first
pub async fn list_testimonials(Query(query): Query<TestimonialListQuery>) -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let limit = query.limit.unwrap_or(20).clamp(1, 50);

    let sql = if query.featured == Some(true) {
        "SELECT * FROM testimonials WHERE is_published = true AND is_featured = true \
         ORDER BY created_at DESC LIMIT $1"
    } else {
        "SELECT * FROM testimonials WHERE is_published = true \
         ORDER BY created_at DESC LIMIT $1"
    };

    match sqlx::query_as::<_, Testimonial>(sql)
        .bind(limit)
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(testimonials) => (StatusCode::OK, Json(ListResponse::new(testimonials))).into_response(),
        Err(e) => db_error("listing testimonials", &e),
    }
}

/// GET /api/admin/testimonials - All testimonials (admin)
pub async fn admin_list_testimonials(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(testimonials) => (StatusCode::OK, Json(ListResponse::new(testimonials))).into_response(),
        Err(e) => db_error("listing testimonials (admin)", &e),
    }
}

/// POST /api/admin/testimonials
pub async fn create_testimonial(
    headers: HeaderMap,
    Json(payload): Json<CreateTestimonialRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if payload.client_name.trim().is_empty() {
        return bad_request("Client name is required");
    }
    if payload.content.trim().is_empty() {
        return bad_request("Content is required");
    }
    if !rating_in_bounds(payload.rating) {
        return bad_request("Rating must be between 1 and 5");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Testimonial>(
        r#"
        INSERT INTO testimonials
            (client_name, client_role, client_location, content, rating,
             service_type, is_published, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(payload.client_name.trim())
    .bind(&payload.client_role)
    .bind(&payload.client_location)
    .bind(payload.content.trim())
    .bind(payload.rating)
    .bind(&payload.service_type)
    .bind(payload.is_published)
    .bind(payload.is_featured)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(testimonial) => {
            (StatusCode::CREATED, Json(DataResponse::new(testimonial))).into_response()
        }
        Err(e) => db_error("creating testimonial", &e),
    }
}

/// PUT /api/admin/testimonials/{id}
pub async fn update_testimonial(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTestimonialRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if let Some(rating) = payload.rating {
        if !rating_in_bounds(rating) {
            return bad_request("Rating must be between 1 and 5");
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let existing = match sqlx::query_as::<_, Testimonial>(
        "SELECT * FROM testimonials WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(testimonial)) => testimonial,
        Ok(None) => return not_found("Testimonial not found"),
        Err(e) => return db_error("fetching testimonial", &e),
    };

    let client_name = payload.client_name.unwrap_or(existing.client_name);
    let client_role = payload.client_role.or(existing.client_role);
    let client_location = payload.client_location.or(existing.client_location);
    let content = payload.content.unwrap_or(existing.content);
    let rating = payload.rating.unwrap_or(existing.rating);
    let service_type = payload.service_type.unwrap_or(existing.service_type);
    let is_published = payload.is_published.unwrap_or(existing.is_published);
    let is_featured = payload.is_featured.unwrap_or(existing.is_featured);

    match sqlx::query_as::<_, Testimonial>(
        r#"
        UPDATE testimonials
        SET client_name = $1, client_role = $2, client_location = $3,
            content = $4, rating = $5, service_type = $6,
            is_published = $7, is_featured = $8
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(&client_name)
    .bind(&client_role)
    .bind(&client_location)
    .bind(&content)
    .bind(rating)
    .bind(&service_type)
    .bind(is_published)
    .bind(is_featured)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(testimonial) => (StatusCode::OK, Json(DataResponse::new(testimonial))).into_response(),
        Err(e) => db_error("updating testimonial", &e),
    }
}

/// DELETE /api/admin/testimonials/{id}
pub async fn delete_testimonial(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Testimonial not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Testimonial deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting testimonial", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, put};
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/api/testimonials", get(list_testimonials))
            .route(
                "/api/admin/testimonials",
                get(admin_list_testimonials).post(create_testimonial),
            )
            .route(
                "/api/admin/testimonials/{id}",
                put(update_testimonial).delete(delete_testimonial),
            )
    }

    fn bearer() -> String {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        format!("Bearer {}", token)
    }

    #[test]
    fn test_rating_bounds() {
        assert!(rating_in_bounds(1));
        assert!(rating_in_bounds(5));
        assert!(!rating_in_bounds(0));
        assert!(!rating_in_bounds(6));
        assert!(!rating_in_bounds(-1));
    }

    #[tokio::test]
    async fn test_create_out_of_bounds_rating_rejected() {
        let req = Request::post("/api/admin/testimonials")
            .header("authorization", bearer())
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "client_name": "Fatima K.",
                    "content": "Excellent guidance throughout.",
                    "rating": 9
                })
                .to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_list_requires_auth() {
        let req = Request::get("/api/admin/testimonials")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_list_without_pool_returns_503() {
        let req = Request::get("/api/testimonials?featured=true")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
