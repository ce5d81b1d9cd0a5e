/**
 * Course Routes
 * Public catalogue endpoints for published courses plus full admin CRUD
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, models::Course};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ErrorResponse, ListResponse, MessageResponse};
use crate::util::{generate_slug, is_valid_slug};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    pub category: Option<String>,
    pub level: Option<String>,
}

/// Request body for POST /api/admin/courses
#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub modules: i32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub enrollment_url: String,
    #[serde(default)]
    pub badge_text: Option<String>,
}

fn default_level() -> String {
    "Beginner".to_string()
}

/// Request body for PUT /api/admin/courses/{id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub modules: Option<i32>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub thumbnail_url: Option<String>,
    pub enrollment_url: Option<String>,
    pub badge_text: Option<String>,
}

fn is_duplicate_slug(e: &sqlx::Error) -> bool {
    let text = e.to_string();
    text.contains("duplicate key") || text.contains("unique constraint")
}

// ============================================================================
// Public handlers
// ============================================================================

/// GET /api/courses - Published courses, featured first then newest
pub async fn list_courses(Query(query): Query<CourseListQuery>) -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let category = query.category.filter(|c| !c.is_empty());
    let level = query.level.filter(|l| !l.is_empty());

    let mut sql = String::from("SELECT * FROM courses WHERE is_published = true");
    if category.is_some() {
        sql.push_str(" AND category = $1");
    }
    if level.is_some() {
        sql.push_str(if category.is_some() {
            " AND level = $2"
        } else {
            " AND level = $1"
        });
    }
    sql.push_str(" ORDER BY is_featured DESC, created_at DESC");

    let mut q = sqlx::query_as::<_, Course>(&sql);
    if let Some(ref category) = category {
        q = q.bind(category);
    }
    if let Some(ref level) = level {
        q = q.bind(level);
    }

    match q.fetch_all(pool.as_ref()).await {
        Ok(courses) => (StatusCode::OK, Json(ListResponse::new(courses))).into_response(),
        Err(e) => db_error("listing courses", &e),
    }
}

/// GET /api/courses/featured - Top 3 featured courses
pub async fn featured_courses() -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Course>(
        "SELECT * FROM courses WHERE is_published = true AND is_featured = true \
         ORDER BY created_at DESC LIMIT 3",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(courses) => (StatusCode::OK, Json(ListResponse::new(courses))).into_response(),
        Err(e) => db_error("listing featured courses", &e),
    }
}

/// GET /api/courses/{slug} - Single published course
pub async fn get_course(Path(slug): Path<String>) -> Response {
    if !is_valid_slug(&slug) {
        return bad_request("Invalid slug");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Course>(
        "SELECT * FROM courses WHERE slug = $1 AND is_published = true",
    )
    .bind(&slug)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(course)) => (StatusCode::OK, Json(DataResponse::new(course))).into_response(),
        Ok(None) => not_found("Course not found"),
        Err(e) => db_error("fetching course", &e),
    }
}

// ============================================================================
// Admin handlers
// ============================================================================

/// GET /api/admin/courses - All courses, drafts included
pub async fn admin_list_courses(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(courses) => (StatusCode::OK, Json(ListResponse::new(courses))).into_response(),
        Err(e) => db_error("listing courses (admin)", &e),
    }
}

/// POST /api/admin/courses - Create a course
///
/// The slug is derived from the title when not supplied, and a free course
/// always carries price 0.
pub async fn create_course(
    headers: HeaderMap,
    Json(payload): Json<CreateCourseRequest>,
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

    let price = if payload.is_free { 0.0 } else { payload.price };

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses
            (title, slug, description, category, level, duration, modules,
             price, is_free, is_published, is_featured, thumbnail_url,
             enrollment_url, badge_text)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(&payload.level)
    .bind(&payload.duration)
    .bind(payload.modules)
    .bind(price)
    .bind(payload.is_free)
    .bind(payload.is_published)
    .bind(payload.is_featured)
    .bind(&payload.thumbnail_url)
    .bind(&payload.enrollment_url)
    .bind(&payload.badge_text)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(course) => (StatusCode::CREATED, Json(DataResponse::new(course))).into_response(),
        Err(e) if is_duplicate_slug(&e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Slug already exists")),
        )
            .into_response(),
        Err(e) => db_error("creating course", &e),
    }
}

/// PUT /api/admin/courses/{id} - Update a course; omitted fields keep their
/// current values
pub async fn update_course(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
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

    let existing = match sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool.as_ref())
        .await
    {
        Ok(Some(course)) => course,
        Ok(None) => return not_found("Course not found"),
        Err(e) => return db_error("fetching course", &e),
    };

    let title = payload.title.unwrap_or(existing.title);
    let slug = payload.slug.unwrap_or(existing.slug);
    let description = payload.description.unwrap_or(existing.description);
    let category = payload.category.unwrap_or(existing.category);
    let level = payload.level.unwrap_or(existing.level);
    let duration = payload.duration.unwrap_or(existing.duration);
    let modules = payload.modules.unwrap_or(existing.modules);
    let is_free = payload.is_free.unwrap_or(existing.is_free);
    let price = if is_free {
        0.0
    } else {
        payload.price.unwrap_or(existing.price)
    };
    let is_published = payload.is_published.unwrap_or(existing.is_published);
    let is_featured = payload.is_featured.unwrap_or(existing.is_featured);
    let thumbnail_url = payload.thumbnail_url.or(existing.thumbnail_url);
    let enrollment_url = payload.enrollment_url.unwrap_or(existing.enrollment_url);
    let badge_text = payload.badge_text.or(existing.badge_text);

    match sqlx::query_as::<_, Course>(
        r#"
        UPDATE courses
        SET title = $1, slug = $2, description = $3, category = $4, level = $5,
            duration = $6, modules = $7, price = $8, is_free = $9,
            is_published = $10, is_featured = $11, thumbnail_url = $12,
            enrollment_url = $13, badge_text = $14
        WHERE id = $15
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&slug)
    .bind(&description)
    .bind(&category)
    .bind(&level)
    .bind(&duration)
    .bind(modules)
    .bind(price)
    .bind(is_free)
    .bind(is_published)
    .bind(is_featured)
    .bind(&thumbnail_url)
    .bind(&enrollment_url)
    .bind(&badge_text)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(course) => (StatusCode::OK, Json(DataResponse::new(course))).into_response(),
        Err(e) if is_duplicate_slug(&e) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Slug already exists")),
        )
            .into_response(),
        Err(e) => db_error("updating course", &e),
    }
}

/// DELETE /api/admin/courses/{id}
pub async fn delete_course(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Course not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Course deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting course", &e),
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
            .route("/api/courses", get(list_courses))
            .route("/api/courses/featured", get(featured_courses))
            .route("/api/courses/{slug}", get(get_course))
            .route(
                "/api/admin/courses",
                get(admin_list_courses).post(create_course),
            )
            .route(
                "/api/admin/courses/{id}",
                put(update_course).delete(delete_course),
            )
    }

    #[tokio::test]
    async fn test_get_course_invalid_slug_returns_400() {
        let req = Request::get("/api/courses/UPPER")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_crud_requires_auth() {
        for req in [
            Request::get("/api/admin/courses").body(Body::empty()).unwrap(),
            Request::delete(format!("/api/admin/courses/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        ] {
            let res = test_router().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_create_course_title_required() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/courses")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({"title": ""}).to_string()))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_list_without_pool_returns_503() {
        let req = Request::get("/api/courses?category=Geopolitics")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
