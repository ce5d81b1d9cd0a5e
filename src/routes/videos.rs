/**
 * Video Routes
 * Public list of published YouTube videos (with derived embed metadata)
 * plus full admin CRUD
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, models::Video};
use crate::routes::auth::require_auth;
use crate::routes::{bad_request, db_error, db_unavailable, not_found};
use crate::routes::{DataResponse, ListResponse, MessageResponse};
use crate::util::{youtube_embed_url, youtube_thumbnail_url, youtube_video_id};

#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    pub category: Option<String>,
}

/// Public video item with the id/embed/thumbnail derived from the stored URL.
/// Videos with an unparseable URL still list, just without embed metadata.
#[derive(Debug, Serialize)]
pub struct VideoListItem {
    #[serde(flatten)]
    pub video: Video,
    pub video_id: Option<String>,
    pub embed_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl From<Video> for VideoListItem {
    fn from(video: Video) -> Self {
        let video_id = youtube_video_id(&video.youtube_url).map(String::from);
        let embed_url = video_id.as_deref().map(youtube_embed_url);
        let thumbnail_url = video_id.as_deref().map(youtube_thumbnail_url);
        Self {
            video,
            video_id,
            embed_url,
            thumbnail_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    pub youtube_url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub views_label: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub youtube_url: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub views_label: Option<String>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

/// GET /api/videos - Published videos, featured first then newest
pub async fn list_videos(Query(query): Query<VideoListQuery>) -> Response {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let category = query.category.filter(|c| !c.is_empty());

    let videos = match category {
        Some(category) => {
            sqlx::query_as::<_, Video>(
                "SELECT * FROM videos WHERE is_published = true AND category = $1 \
                 ORDER BY is_featured DESC, created_at DESC",
            )
            .bind(category)
            .fetch_all(pool.as_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Video>(
                "SELECT * FROM videos WHERE is_published = true \
                 ORDER BY is_featured DESC, created_at DESC",
            )
            .fetch_all(pool.as_ref())
            .await
        }
    };

    match videos {
        Ok(videos) => {
            let items: Vec<VideoListItem> = videos.into_iter().map(VideoListItem::from).collect();
            (StatusCode::OK, Json(ListResponse::new(items))).into_response()
        }
        Err(e) => db_error("listing videos", &e),
    }
}

/// GET /api/admin/videos - All videos (admin)
pub async fn admin_list_videos(headers: HeaderMap) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Video>("SELECT * FROM videos ORDER BY created_at DESC")
        .fetch_all(pool.as_ref())
        .await
    {
        Ok(videos) => (StatusCode::OK, Json(ListResponse::new(videos))).into_response(),
        Err(e) => db_error("listing videos (admin)", &e),
    }
}

/// POST /api/admin/videos
pub async fn create_video(headers: HeaderMap, Json(payload): Json<CreateVideoRequest>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if payload.title.trim().is_empty() {
        return bad_request("Title is required");
    }
    if youtube_video_id(&payload.youtube_url).is_none() {
        return bad_request("youtube_url must be a valid YouTube video URL");
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos
            (title, youtube_url, category, duration, views_label,
             is_published, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.youtube_url)
    .bind(&payload.category)
    .bind(&payload.duration)
    .bind(&payload.views_label)
    .bind(payload.is_published)
    .bind(payload.is_featured)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(video) => (StatusCode::CREATED, Json(DataResponse::new(video))).into_response(),
        Err(e) => db_error("creating video", &e),
    }
}

/// PUT /api/admin/videos/{id}
pub async fn update_video(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    if let Some(ref url) = payload.youtube_url {
        if youtube_video_id(url).is_none() {
            return bad_request("youtube_url must be a valid YouTube video URL");
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    let existing = match sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(id)
        .fetch_optional(pool.as_ref())
        .await
    {
        Ok(Some(video)) => video,
        Ok(None) => return not_found("Video not found"),
        Err(e) => return db_error("fetching video", &e),
    };

    let title = payload.title.unwrap_or(existing.title);
    let youtube_url = payload.youtube_url.unwrap_or(existing.youtube_url);
    let category = payload.category.unwrap_or(existing.category);
    let duration = payload.duration.or(existing.duration);
    let views_label = payload.views_label.or(existing.views_label);
    let is_published = payload.is_published.unwrap_or(existing.is_published);
    let is_featured = payload.is_featured.unwrap_or(existing.is_featured);

    match sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos
        SET title = $1, youtube_url = $2, category = $3, duration = $4,
            views_label = $5, is_published = $6, is_featured = $7
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(&youtube_url)
    .bind(&category)
    .bind(&duration)
    .bind(&views_label)
    .bind(is_published)
    .bind(is_featured)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(video) => (StatusCode::OK, Json(DataResponse::new(video))).into_response(),
        Err(e) => db_error("updating video", &e),
    }
}

/// DELETE /api/admin/videos/{id}
pub async fn delete_video(headers: HeaderMap, Path(id): Path<Uuid>) -> Response {
    if let Err(response) = require_auth(&headers) {
        return response;
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable(),
    };

    match sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found("Video not found"),
        Ok(_) => (
            StatusCode::OK,
            Json(MessageResponse::new("Video deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error("deleting video", &e),
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
    use chrono::Utc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/api/videos", get(list_videos))
            .route(
                "/api/admin/videos",
                get(admin_list_videos).post(create_video),
            )
    }

    #[test]
    fn test_video_list_item_derives_embed_metadata() {
        let video = Video {
            id: Uuid::new_v4(),
            title: "Why supply chains are shifting".to_string(),
            youtube_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            category: "Geopolitics".to_string(),
            duration: None,
            views_label: Some("1.2M".to_string()),
            is_published: true,
            is_featured: false,
            created_at: Utc::now(),
        };
        let item = VideoListItem::from(video);
        assert_eq!(item.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            item.embed_url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert!(item.thumbnail_url.unwrap().contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_video_list_item_tolerates_unparseable_url() {
        let video = Video {
            id: Uuid::new_v4(),
            title: "Legacy upload".to_string(),
            youtube_url: "https://example.com/clip".to_string(),
            category: "Vlogs".to_string(),
            duration: None,
            views_label: None,
            is_published: true,
            is_featured: false,
            created_at: Utc::now(),
        };
        let item = VideoListItem::from(video);
        assert!(item.video_id.is_none());
        assert!(item.embed_url.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_non_youtube_url() {
        let token = create_access_token("user-1", "admin@example.com", "ADMIN").unwrap();
        let req = Request::post("/api/admin/videos")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "title": "Clip",
                    "youtube_url": "https://vimeo.com/12345678"
                })
                .to_string(),
            ))
            .unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_list_without_pool_returns_503() {
        let req = Request::get("/api/videos").body(Body::empty()).unwrap();
        let res = test_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
