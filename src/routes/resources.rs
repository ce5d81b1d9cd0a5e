/**
 * Free Resource Routes
 * Public list of published resources (manual ordering) plus full admin CRUD
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, models::FreeResource};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ListResponse, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource_url: String,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_resource_type() -> String {
    "Guide".to_string()
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateResourceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub resource_url: Option<String>,
    pub resource_type: Option<String>,
    pub is_published: Option<bool>,
    pub sort_order: Option<i32>,
}

/// GET /api/free-resources - Published resources in display order
/// (sort_order ascending, then newest first)
pub async fn list_resources() -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, FreeResource>(
        "SELECT * FROM free_resources WHERE is_published = true \
         ORDER BY sort_order ASC, created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(resources) => (StatusCode::OK, Json(ListResponse::new(resources))).into_response(),
        Err(e) => db_error("listing free resources", &e),
    }
}

/// GET /api/admin/free-resources - All resources (admin)
pub async fn admin_list_resources(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, FreeResource>(
        "SELECT * FROM free_resources ORDER BY sort_order ASC, created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(resources) => (StatusCode::OK, Json(ListResponse::new(resources))).into_response(),
        Err(e) => db_error("listing free resources (admin)", &e),
    }
}

/// POST /api/admin/free-resources
pub async fn create_resource(
    headers: HeaderMap,
    Json(payload): Json<CreateResourceRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if payload.title.trim().is_empty() {
        return bad_request("Title is required");
    }
    if payload.resource_url.trim().is_empty() {
        return bad_request("Resource URL is required");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, FreeResource>(
        r#"
        INSERT INTO free_resources
            (title, description, resource_url, resource_type, is_published, sort_order)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.resource_url.trim())
    .bind(&payload.resource_type)
    .bind(payload.is_published)
    .bind(payload.sort_order)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(resource) => (StatusCode::CREATED, Json(DataResponse::new(resource))).into_response(),
        Err(e) => db_error("creating free resource", &e),
    }
}

/// PUT /api/admin/free-resources/{id}
pub async fn update_resource(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let existing = match sqlx::query_as::<_, FreeResource>(
        "SELECT * FROM free_resources WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(resource)) => resource,
        Ok(None) => return not_found("Free resource not found"),
        Err(e) => return db_error("fetching free resource", &e),
    };

    let title = payload.title.unwrap_or(existing.title);
    let description = payload.description.or(existing.description);
    let resource_url = payload.resource_url.unwrap_or(existing.resource_url);
    let resource_type = payload.resource_type.unwrap_or(existing.resource_type);
    let is_published = payload.is_published.unwrap_or(existing.is_published);
    let sort_order = payload.sort_order.unwrap_or(existing.sort_order);

    match sqlx::query_as::<_, FreeResource>(
        r#"
        UPDATE free_resources
        SET title = $1, description = $2, resource_url = $3, resource_type = $4,
            is_published = $5, sort_order = $6
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(&resource_url)
    .bind(&resource_type)
    .bind(is_published)
    .bind(sort_order)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(resource) => (StatusCode::OK, Json(DataResponse::new(resource))).into_response(),
        Err(e) => db_error("updating free resource", &e),
    }
}

/// DELETE /api/admin/free-resources/{id}
pub async fn delete_resource(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM free_resources WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Free resource not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Free resource deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting free resource", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/api/free-resources", get(list_resources))
            .route(
                "/api/admin/free-resources",
                get(admin_list_resources).post(create_resource),
            )
    }

    #[tokio::test]
    async fn test_create_missing_url_rejected() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/free-resources")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "title": "Visa checklist",
                    "resource_url": "  "
                })
                .to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_list_requires_auth() {
        let req = Request::get("/api/admin/free-resources")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_list_without_pool_returns_503() {
        let req = Request::get("/api/free-resources")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
