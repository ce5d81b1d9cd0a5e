//! Field validation for public form submissions.
//!
//! Each `validate_*` function is a pure check: it either returns a normalized
//! record ready for insertion, or the full list of violated fields. Handlers
//! turn that list into a 400 response — every failing field is reported, not
//! just the first.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// A single violated field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

fn fail(errors: &mut Vec<FieldError>, field: &'static str, message: &'static str) {
    errors.push(FieldError { field, message });
}

/// Lowercase + trim, mirroring what the submission forms send after
/// normalization.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

// ============================================================================
// Contact form
// ============================================================================

/// Raw contact form body. Fields default so that missing keys surface as
/// validation errors rather than deserialization rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactPayload {
    pub full_name: String,
    pub email: String,
    pub purpose: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub message: String,
}

/// Normalized contact submission, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub full_name: String,
    pub email: String,
    pub purpose: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub message: String,
}

pub fn validate_contact(payload: &ContactPayload) -> Result<NewContact, Vec<FieldError>> {
    let mut errors = Vec::new();

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        fail(&mut errors, "full_name", "Full name is required");
    } else if !(2..=100).contains(&full_name.chars().count()) {
        fail(&mut errors, "full_name", "Name must be 2-100 characters");
    }

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        fail(&mut errors, "email", "Email is required");
    } else if !is_valid_email(&email) {
        fail(&mut errors, "email", "Please enter a valid email address");
    }

    let purpose = payload.purpose.trim();
    if purpose.is_empty() {
        fail(&mut errors, "purpose", "Please select a purpose");
    }

    let message = payload.message.trim();
    if message.is_empty() {
        fail(&mut errors, "message", "Message is required");
    } else if !(10..=2000).contains(&message.chars().count()) {
        fail(&mut errors, "message", "Message must be 10-2000 characters");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewContact {
        full_name: full_name.to_string(),
        email,
        purpose: purpose.to_string(),
        city: non_empty(payload.city.as_deref()),
        country: non_empty(payload.country.as_deref()),
        message: message.to_string(),
    })
}

// ============================================================================
// Booking form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingPayload {
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
}

/// Normalized booking request. Status is applied at insert time, not here.
#[derive(Debug, Clone)]
pub struct NewBooking {
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
}

pub fn validate_booking(payload: &BookingPayload) -> Result<NewBooking, Vec<FieldError>> {
    let mut errors = Vec::new();

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        fail(&mut errors, "full_name", "Full name is required");
    } else if !(2..=100).contains(&full_name.chars().count()) {
        fail(&mut errors, "full_name", "Name must be 2-100 characters");
    }

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        fail(&mut errors, "email", "Email is required");
    } else if !is_valid_email(&email) {
        fail(&mut errors, "email", "Please enter a valid email address");
    }

    let service_type = payload.service_type.trim();
    if service_type.is_empty() {
        fail(&mut errors, "service_type", "Please select a service type");
    }

    let phone = non_empty(payload.phone.as_deref());
    if let Some(ref phone) = phone {
        if !(7..=20).contains(&phone.chars().count()) {
            fail(&mut errors, "phone", "Please enter a valid phone number");
        }
    }

    let message = non_empty(payload.message.as_deref());
    if let Some(ref message) = message {
        if message.chars().count() > 1000 {
            fail(&mut errors, "message", "Message must be under 1000 characters");
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewBooking {
        full_name: full_name.to_string(),
        email,
        phone,
        service_type: service_type.to_string(),
        package: non_empty(payload.package.as_deref()),
        preferred_date: non_empty(payload.preferred_date.as_deref()),
        preferred_time: non_empty(payload.preferred_time.as_deref()),
        city: non_empty(payload.city.as_deref()),
        country: non_empty(payload.country.as_deref()),
        message,
    })
}

// ============================================================================
// Subscriber form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscribePayload {
    pub email: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: String,
    pub source: String,
}

pub fn validate_subscriber(payload: &SubscribePayload) -> Result<NewSubscriber, Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        fail(&mut errors, "email", "Email is required");
    } else if !is_valid_email(&email) {
        fail(&mut errors, "email", "Please enter a valid email address");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewSubscriber {
        email,
        source: non_empty(payload.source.as_deref()).unwrap_or_else(|| "website".to_string()),
    })
}
