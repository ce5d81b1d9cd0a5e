/**
 * Media Gallery Routes
 * Public list of published appearances plus full admin CRUD
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{self, models::MediaItem};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ListResponse, MessageResponse};

/// Media type vocabulary shown on the gallery filters
pub const MEDIA_TYPES: &[&str] = &[
    "Podcast",
    "Event",
    "Speech",
    "Interview",
    "Webinar",
    "Press",
    "Photo",
];

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    pub title: String,
    #[serde(default)]
    pub event_name: Option<String>,
    pub media_type: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateMediaRequest {
    pub title: Option<String>,
    pub event_name: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

fn is_valid_media_type(media_type: &str) -> bool {
    MEDIA_TYPES.contains(&media_type)
}

/// GET /api/media - Published media items, newest first
pub async fn list_media(Query(query): Query<MediaListQuery>) -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let media_type = query.media_type.filter(|t| !t.is_empty());

    let items = match media_type {
        Some(media_type) => {
            sqlx::query_as::<_, MediaItem>(
                "SELECT * FROM media_gallery WHERE is_published = true AND media_type = $1 \
                 ORDER BY created_at DESC",
            )
            .bind(media_type)
            .fetch_all(pool.as_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, MediaItem>(
                "SELECT * FROM media_gallery WHERE is_published = true \
                 ORDER BY created_at DESC",
            )
            .fetch_all(pool.as_ref())
            .await
        }
    };

    match items {
        Ok(items) => (StatusCode::OK, Json(ListResponse::new(items))).into_response(),
        Err(e) => db_error("listing media", &e),
    }
}

/// GET /api/admin/media - All media items (admin)
pub async fn admin_list_media(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, MediaItem>("SELECT * FROM media_gallery ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(items) => (StatusCode::OK, Json(ListResponse::new(items))).into_response(),
        Err(e) => db_error("listing media (admin)", &e),
    }
}

/// POST /api/admin/media
pub async fn create_media(headers: HeaderMap, Json(payload): Json<CreateMediaRequest>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if payload.title.trim().is_empty() {
        return bad_request("Title is required");
    }
    if !is_valid_media_type(&payload.media_type) {
        return bad_request(&format!(
            "Invalid media type. Must be one of: {}",
            MEDIA_TYPES.join(", ")
        ));
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, MediaItem>(
        r#"
        INSERT INTO media_gallery
            (title, event_name, media_type, media_url, event_date, description,
             is_published)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.event_name)
    .bind(&payload.media_type)
    .bind(&payload.media_url)
    .bind(payload.event_date)
    .bind(&payload.description)
    .bind(payload.is_published)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(item) => (StatusCode::CREATED, Json(DataResponse::new(item))).into_response(),
        Err(e) => db_error("creating media item", &e),
    }
}

/// PUT /api/admin/media/{id}
pub async fn update_media(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMediaRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if let Some(ref media_type) = payload.media_type {
        if !is_valid_media_type(media_type) {
            return bad_request(&format!(
                "Invalid media type. Must be one of: {}",
                MEDIA_TYPES.join(", ")
            ));
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let existing = match sqlx::query_as::<_, MediaItem>(
        "SELECT * FROM media_gallery WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(item)) => item,
        Ok(None) => return not_found("Media item not found"),
        Err(e) => return db_error("fetching media item", &e),
    };

    let title = payload.title.unwrap_or(existing.title);
    let event_name = payload.event_name.or(existing.event_name);
    let media_type = payload.media_type.unwrap_or(existing.media_type);
    let media_url = payload.media_url.or(existing.media_url);
    let event_date = payload.event_date.or(existing.event_date);
    let description = payload.description.or(existing.description);
    let is_published = payload.is_published.unwrap_or(existing.is_published);

    match sqlx::query_as::<_, MediaItem>(
        r#"
        UPDATE media_gallery
        SET title = $1, event_name = $2, media_type = $3, media_url = $4,
            event_date = $5, description = $6, is_published = $7
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&event_name)
    .bind(&media_type)
    .bind(&media_url)
    .bind(event_date)
    .bind(&description)
    .bind(is_published)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(item) => (StatusCode::OK, Json(DataResponse::new(item))).into_response(),
        Err(e) => db_error("updating media item", &e),
    }
}

/// DELETE /api/admin/media/{id}
pub async fn delete_media(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM media_gallery WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Media item not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Media item deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting media item", &e),
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
            .route("/api/media", get(list_media))
            .route("/api/admin/media", get(admin_list_media).post(create_media))
    }

    #[test]
    fn test_media_type_vocabulary() {
        assert!(is_valid_media_type("Podcast"));
        assert!(is_valid_media_type("Photo"));
        assert!(!is_valid_media_type("podcast"));
        assert!(!is_valid_media_type("Video"));
    }

    #[tokio::test]
    async fn test_create_with_unknown_media_type_rejected() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/media")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "title": "Panel on regional trade",
                    "media_type": "Video"
                })
                .to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_list_without_pool_returns_503() {
        let req = Request::get("/api/media?type=Podcast")
            .body(Body::empty())
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
