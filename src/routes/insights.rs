/**
 * Insight Routes
 * Public read endpoints for published posts plus full admin CRUD
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    self,
    models::{Insight, InsightSummary},
};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ErrorResponse, ListResponse, MessageResponse};
use crate::util::{generate_slug, is_valid_slug};

const SUMMARY_COLUMNS: &str = "id, title, slug, excerpt, category, cover_image_url, author, \
                               read_time, views, is_featured, created_at";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/insights
#[derive(Debug, Deserialize)]
pub struct InsightListQuery {
    pub category: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_limit() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

/// Response for GET /api/insights
#[derive(Debug, Serialize)]
pub struct InsightListResponse {
    pub success: bool,
    pub count: usize,
    pub page: i64,
    pub data: Vec<InsightSummary>,
}

/// Request body for POST /api/admin/insights
#[derive(Debug, Deserialize)]
pub struct CreateInsightRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_read_time")]
    pub read_time: i32,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_read_time() -> i32 {
    5
}

/// Request body for PUT /api/admin/insights/{id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateInsightRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub cover_image_url: Option<String>,
    pub author: Option<String>,
    pub read_time: Option<i32>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

fn is_duplicate_slug(e: &sqlx::Error) -> bool {
    let text = e.to_string();
    text.contains("duplicate key") || text.contains("unique constraint")
}

// ============================================================================
// Public handlers
// ============================================================================

/// GET /api/insights - Published insights, newest first, paginated
pub async fn list_insights(Query(query): Query<InsightListQuery>) -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let limit = query.limit.clamp(1, 50);
    let page = query.page.max(1);
    let offset = (page - 1) * limit;

    let category = query.category.filter(|c| !c.is_empty() && c != "All");

    let sql = format!(
        "SELECT {} FROM insights WHERE is_published = true{} \
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        SUMMARY_COLUMNS,
        if category.is_some() {
            " AND category = $3"
        } else {
            ""
        }
    );

    let mut q = sqlx::query_as::<_, InsightSummary>(&sql).bind(limit).bind(offset);
    if let Some(ref category) = category {
        q = q.bind(category);
    }

    match q.fetch_all(pool.as_ref()).await {
        Ok(insights) => (
            StatusCode::OK,
            Json(InsightListResponse {
                success: true,
                count: insights.len(),
                page,
                data: insights,
            }),
        )
            .into_response(),
        Err(e) => db_error("listing insights", &e),
    }
}

/// GET /api/insights/featured - Top 3 featured insights
pub async fn featured_insights() -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let sql = format!(
        "SELECT {} FROM insights WHERE is_published = true AND is_featured = true \
         ORDER BY created_at DESC LIMIT 3",
        SUMMARY_COLUMNS
    );

    match sqlx::query_as::<_, InsightSummary>(&sql)
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(insights) => (StatusCode::OK, Json(ListResponse::new(insights))).into_response(),
        Err(e) => db_error("listing featured insights", &e),
    }
}

/// GET /api/insights/{slug} - Single published insight
///
/// The view counter is incremented on a detached task; the response carries
/// the count as read, so a subsequent fetch observes views + 1.
pub async fn get_insight(Path(slug): Path<String>) -> Response {
    if !is_valid_slug(&slug) {
        return bad_request("Invalid slug");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Insight>(
        "SELECT * FROM insights WHERE slug = $1 AND is_published = true",
    )
    .bind(&slug)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(insight)) => {
            let id = insight.id;
            let pool = pool.clone();
            tokio::spawn(async move {
                if let Err(e) = sqlx::query("UPDATE insights SET views = views + 1 WHERE id = $1")
                    .bind(id)
                    .execute(pool.as_ref())
                    .await
                {
                    tracing::warn!("Failed to increment view count: {}", e);
                }
            });

            (StatusCode::OK, Json(DataResponse::new(insight))).into_response()
        }
        Ok(None) => not_found("Insight not found"),
        Err(e) => db_error("fetching insight", &e),
    }
}

// ============================================================================
// Admin handlers
// ============================================================================

/// GET /api/admin/insights - All insights, drafts included
pub async fn admin_list_insights(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Insight>("SELECT * FROM insights ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(insights) => (StatusCode::OK, Json(ListResponse::new(insights))).into_response(),
        Err(e) => db_error("listing insights (admin)", &e),
    }
}

/// POST /api/admin/insights - Create an insight, deriving the slug from the
/// title when none is supplied
pub async fn create_insight(
    headers: HeaderMap,
    Json(payload): Json<CreateInsightRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if payload.title.trim().is_empty() {
        return bad_request("Title is required");
    }

    let slug = payload
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| generate_slug(&payload.title));

    if !is_valid_slug(&slug) {
        return bad_request("Invalid slug");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Insight>(
        r#"
        INSERT INTO insights
            (title, slug, excerpt, content, category, cover_image_url, author,
             read_time, is_published, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(&slug)
    .bind(&payload.excerpt)
    .bind(&payload.content)
    .bind(&payload.category)
    .bind(&payload.cover_image_url)
    .bind(&payload.author)
    .bind(payload.read_time)
    .bind(payload.is_published)
    .bind(payload.is_featured)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(insight) => (StatusCode::CREATED, Json(DataResponse::new(insight))).into_response(),
        Err(e) if is_duplicate_slug(&e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Slug already exists")),
        )
            .into_response(),
        Err(e) => db_error("creating insight", &e),
    }
}

/// PUT /api/admin/insights/{id} - Update an insight; omitted fields keep
/// their current values
pub async fn update_insight(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInsightRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if let Some(ref slug) = payload.slug {
        if !is_valid_slug(slug) {
            return bad_request("Invalid slug");
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let existing = match sqlx::query_as::<_, Insight>("SELECT * FROM insights WHERE id = $1")
        .bind(id)
        .fetch_optional(pool.as_ref())
        .await
    {
        Ok(Some(insight)) => insight,
        Ok(None) => return not_found("Insight not found"),
        Err(e) => return db_error("fetching insight", &e),
    };

    let title = payload.title.unwrap_or(existing.title);
    let slug = payload.slug.unwrap_or(existing.slug);
    let excerpt = payload.excerpt.unwrap_or(existing.excerpt);
    let content = payload.content.unwrap_or(existing.content);
    let category = payload.category.unwrap_or(existing.category);
    let cover_image_url = payload.cover_image_url.or(existing.cover_image_url);
    let author = payload.author.unwrap_or(existing.author);
    let read_time = payload.read_time.unwrap_or(existing.read_time);
    let is_published = payload.is_published.unwrap_or(existing.is_published);
    let is_featured = payload.is_featured.unwrap_or(existing.is_featured);

    match sqlx::query_as::<_, Insight>(
        r#"
        UPDATE insights
        SET title = $1, slug = $2, excerpt = $3, content = $4, category = $5,
            cover_image_url = $6, author = $7, read_time = $8,
            is_published = $9, is_featured = $10
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&slug)
    .bind(&excerpt)
    .bind(&content)
    .bind(&category)
    .bind(&cover_image_url)
    .bind(&author)
    .bind(read_time)
    .bind(is_published)
    .bind(is_featured)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(insight) => (StatusCode::OK, Json(DataResponse::new(insight))).into_response(),
        Err(e) if is_duplicate_slug(&e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Slug already exists")),
        )
            .into_response(),
        Err(e) => db_error("updating insight", &e),
    }
}

/// DELETE /api/admin/insights/{id}
pub async fn delete_insight(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM insights WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Insight not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Insight deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting insight", &e),
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
            .route("/api/insights", get(list_insights))
            .route("/api/insights/featured", get(featured_insights))
            .route("/api/insights/{slug}", get(get_insight))
            .route(
                "/api/admin/insights",
                get(admin_list_insights).post(create_insight),
            )
            .route(
                "/api/admin/insights/{id}",
                put(update_insight).delete(delete_insight),
            )
    }

    #[tokio::test]
    async fn test_get_insight_invalid_slug_returns_400() {
        let req = Request::get("/api/insights/Not%20A%20Slug")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_insight_without_pool_returns_503() {
        let req = Request::get("/api/insights/a-valid-slug")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_admin_list_requires_auth() {
        let req = Request::get("/api/admin/insights")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_insight_empty_title_rejected() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/insights")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"title": "   "}).to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_insight_symbol_only_title_rejected() {
        // generate_slug("!!!") is empty, which fails slug validation
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/insights")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({"title": "!!!"}).to_string()))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
