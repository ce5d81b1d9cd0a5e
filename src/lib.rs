//! Consultancy Backend - library for app logic and testing
//!
//! API layer for the public site and admin console: submission pipeline
//! (contact/booking with best-effort email notification), public read
//! endpoints over published content, subscriber signup, and the
//! JWT-guarded admin CRUD surface.

pub mod db;
pub mod logging;
pub mod mailer;
pub mod routes;
pub mod util;
pub mod validation;

use axum::{
    http::{HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) when set; otherwise the two
/// configured front-end origins (CLIENT_ORIGIN, ADMIN_ORIGIN), defaulting
/// to the local dev servers.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .unwrap_or_else(|| {
            let client = std::env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string());
            let admin = std::env::var("ADMIN_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5174".to_string());
            [client, admin]
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect()
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// JSON 404 for unknown routes
async fn route_not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(routes::ErrorResponse::new(format!(
            "Route not found: {} {}",
            method, uri
        ))),
    )
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");

    Router::new()
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        // Submissions + admin inbox
        .route(
            "/api/contact",
            post(routes::contact::submit_contact).get(routes::contact::list_contacts),
        )
        .route(
            "/api/contact/{id}/read",
            patch(routes::contact::mark_contact_read),
        )
        .route(
            "/api/bookings",
            post(routes::bookings::submit_booking).get(routes::bookings::list_bookings),
        )
        .route(
            "/api/bookings/{id}/status",
            patch(routes::bookings::update_booking_status),
        )
        .route(
            "/api/subscribers",
            post(routes::subscribers::subscribe).get(routes::subscribers::list_subscribers),
        )
        // Public reads
        .route("/api/insights", get(routes::insights::list_insights))
        .route(
            "/api/insights/featured",
            get(routes::insights::featured_insights),
        )
        .route("/api/insights/{slug}", get(routes::insights::get_insight))
        .route("/api/courses", get(routes::courses::list_courses))
        .route(
            "/api/courses/featured",
            get(routes::courses::featured_courses),
        )
        .route("/api/courses/{slug}", get(routes::courses::get_course))
        .route(
            "/api/testimonials",
            get(routes::testimonials::list_testimonials),
        )
        .route("/api/media", get(routes::media::list_media))
        .route("/api/videos", get(routes::videos::list_videos))
        .route(
            "/api/free-resources",
            get(routes::resources::list_resources),
        )
        .route("/rss.xml", get(routes::rss::rss_feed))
        // Admin CRUD
        .route(
            "/api/admin/courses",
            get(routes::courses::admin_list_courses).post(routes::courses::create_course),
        )
        .route(
            "/api/admin/courses/{id}",
            put(routes::courses::update_course).delete(routes::courses::delete_course),
        )
        .route(
            "/api/admin/insights",
            get(routes::insights::admin_list_insights).post(routes::insights::create_insight),
        )
        .route(
            "/api/admin/insights/{id}",
            put(routes::insights::update_insight).delete(routes::insights::delete_insight),
        )
        .route(
            "/api/admin/testimonials",
            get(routes::testimonials::admin_list_testimonials)
                .post(routes::testimonials::create_testimonial),
        )
        .route(
            "/api/admin/testimonials/{id}",
            put(routes::testimonials::update_testimonial)
                .delete(routes::testimonials::delete_testimonial),
        )
        .route(
            "/api/admin/media",
            get(routes::media::admin_list_media).post(routes::media::create_media),
        )
        .route(
            "/api/admin/media/{id}",
            put(routes::media::update_media).delete(routes::media::delete_media),
        )
        .route(
            "/api/admin/videos",
            get(routes::videos::admin_list_videos).post(routes::videos::create_video),
        )
        .route(
            "/api/admin/videos/{id}",
            put(routes::videos::update_video).delete(routes::videos::delete_video),
        )
        .route(
            "/api/admin/free-resources",
            get(routes::resources::admin_list_resources).post(routes::resources::create_resource),
        )
        .route(
            "/api/admin/free-resources/{id}",
            put(routes::resources::update_resource).delete(routes::resources::delete_resource),
        )
        // Health
        .route("/health", get(routes::health::health_ping))
        .route("/health/db", get(routes::health::health_db))
        .route("/health/ready", get(routes::health::health_ready))
        .fallback(route_not_found)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap prevents unbounded buffering
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    // Guards MUST be held for the process lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    // Refuse to start in production with the insecure default JWT secret.
    let environment = std::env::var("ENVIRONMENT").unwrap_or_default();
    if environment == "production" {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() || secret == "default-jwt-secret-change-in-production" {
            panic!(
                "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }

        if !mailer::is_configured() {
            tracing::warn!(
                "EMAIL_USER/EMAIL_PASS are not configured. Submission notifications \
                 will be skipped."
            );
        }
    }

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing without database.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database connection.");
    }

    let app = create_app();

    // Bind address is configurable via HOST / PORT env vars.
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> Router {
        create_app().layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
    }

    #[test]
    fn test_create_app_returns_router() {
        let _app = create_app();
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() {
        let req = Request::get("/api/nope").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Route not found"));
    }

    #[tokio::test]
    async fn test_health_route_is_wired() {
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
