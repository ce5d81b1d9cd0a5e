//! Database models - structs representing table rows (used by sqlx/serde).
//!
//! Serialized field names match the column names, which is also the wire
//! format the public site and admin console consume.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contact form submission. Never deleted; admin flips `is_read`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub purpose: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Consultation booking request. `status` is one of the values in
/// `routes::bookings::VALID_STATUSES`; transitions are unordered.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_type: String,
    pub package: Option<String>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub duration: String,
    pub modules: i32,
    pub price: f64,
    pub is_free: bool,
    pub is_published: bool,
    pub is_featured: bool,
    pub thumbnail_url: Option<String>,
    pub enrollment_url: String,
    pub badge_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Blog post. `views` is incremented fire-and-forget on public slug reads.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub cover_image_url: Option<String>,
    pub author: String,
    pub read_time: i32,
    pub views: i64,
    pub is_published: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Insight without its body, for list endpoints.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InsightSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: String,
    pub cover_image_url: Option<String>,
    pub author: String,
    pub read_time: i32,
    pub views: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: Uuid,
    pub client_name: String,
    pub client_role: Option<String>,
    pub client_location: Option<String>,
    pub content: String,
    pub rating: i16,
    pub service_type: String,
    pub is_published: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub title: String,
    pub event_name: Option<String>,
    pub media_type: String,
    pub media_url: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// YouTube listing managed from the admin console. `views_label` is a
/// display string ("1.2M"), not a counter.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub youtube_url: String,
    pub category: String,
    pub duration: Option<String>,
    pub views_label: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FreeResource {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub resource_url: String,
    pub resource_type: String,
    pub is_published: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Admin console account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminRefreshToken {
    pub id: Uuid,
    pub admin_user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}
