//! Email notifications for contact and booking submissions.
//!
//! Sends an HTML notification to the site owner's inbox with `reply-to` set
//! to the submitter. Best-effort by contract: callers spawn the send and log
//! failures, and when EMAIL_USER/EMAIL_PASS are absent (or still placeholder
//! values) the send is skipped silently.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::validation::{NewBooking, NewContact};

struct SmtpSettings {
    user: String,
    pass: String,
    host: String,
}

fn smtp_settings() -> Option<SmtpSettings> {
    let user = std::env::var("EMAIL_USER").ok()?;
    let pass = std::env::var("EMAIL_PASS").ok()?;
    if user.is_empty() || pass.is_empty() || user.contains("placeholder") {
        return None;
    }
    Some(SmtpSettings {
        user,
        pass,
        host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
    })
}

/// Whether the SMTP transport has usable credentials.
pub fn is_configured() -> bool {
    smtp_settings().is_some()
}

// ============================================================================
// Templates
// ============================================================================

fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

fn field_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding: 8px 0; color: #6B7280; font-size: 13px; width: 140px;\">{}</td>\
         <td style=\"padding: 8px 0; color: #1A1A2E;\">{}</td></tr>",
        label, value
    )
}

fn optional_value(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => escape(v),
        _ => "&mdash;".to_string(),
    }
}

fn location_value(city: Option<&str>, country: Option<&str>) -> String {
    let parts: Vec<&str> = city.iter().chain(country.iter()).copied().collect();
    if parts.is_empty() {
        "&mdash;".to_string()
    } else {
        escape(&parts.join(", "))
    }
}

fn message_block(heading: &str, message: &str) -> String {
    format!(
        "<div style=\"margin-top: 16px; padding: 16px; background: white; \
         border-left: 3px solid #C9A227; border-radius: 2px;\">\
         <p style=\"color: #6B7280; font-size: 12px; margin: 0 0 8px; \
         text-transform: uppercase; letter-spacing: 1px;\">{}</p>\
         <p style=\"color: #1A1A2E; margin: 0; line-height: 1.6;\">{}</p></div>",
        heading,
        escape(message)
    )
}

fn wrap_body(heading: &str, rows: &str, extra: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <div style=\"background: #1A1A2E; padding: 24px; border-bottom: 3px solid #C9A227;\">\
         <h2 style=\"color: #C9A227; margin: 0;\">{}</h2></div>\
         <div style=\"background: #f9fafb; padding: 24px;\">\
         <table style=\"width: 100%; border-collapse: collapse;\">{}</table>{}</div>\
         <div style=\"background: #1A1A2E; padding: 16px 24px; text-align: center;\">\
         <p style=\"color: rgba(255,255,255,0.4); font-size: 12px; margin: 0;\">\
         Received via the website</p></div></div>",
        heading, rows, extra
    )
}

pub fn contact_subject(contact: &NewContact) -> String {
    format!("New Contact: {} — {}", contact.full_name, contact.purpose)
}

pub fn contact_notification_html(contact: &NewContact) -> String {
    let mut rows = String::new();
    rows.push_str(&field_row("Name", &escape(&contact.full_name)));
    rows.push_str(&field_row("Email", &escape(&contact.email)));
    rows.push_str(&field_row("Purpose", &escape(&contact.purpose)));
    rows.push_str(&field_row(
        "Location",
        &location_value(contact.city.as_deref(), contact.country.as_deref()),
    ));

    let message = message_block("Message", &contact.message);
    wrap_body("New Contact Form Submission", &rows, &message)
}

pub fn booking_subject(booking: &NewBooking) -> String {
    format!(
        "New Booking: {} — {}",
        booking.full_name, booking.service_type
    )
}

pub fn booking_notification_html(booking: &NewBooking) -> String {
    let mut rows = String::new();
    rows.push_str(&field_row("Name", &escape(&booking.full_name)));
    rows.push_str(&field_row("Email", &escape(&booking.email)));
    rows.push_str(&field_row("Phone", &optional_value(booking.phone.as_deref())));
    rows.push_str(&field_row("Service", &escape(&booking.service_type)));
    rows.push_str(&field_row(
        "Package",
        &optional_value(booking.package.as_deref()),
    ));
    rows.push_str(&field_row(
        "Preferred Date",
        &optional_value(booking.preferred_date.as_deref()),
    ));
    rows.push_str(&field_row(
        "Preferred Time",
        &optional_value(booking.preferred_time.as_deref()),
    ));
    rows.push_str(&field_row(
        "Location",
        &location_value(booking.city.as_deref(), booking.country.as_deref()),
    ));

    let extra = match booking.message.as_deref() {
        Some(message) => message_block("Additional Notes", message),
        None => String::new(),
    };
    wrap_body("New Consultation Booking", &rows, &extra)
}

// ============================================================================
// Dispatch
// ============================================================================

async fn dispatch(
    settings: SmtpSettings,
    subject: String,
    html: String,
    reply_to: &str,
) -> Result<(), String> {
    let from: Mailbox = format!("Website Notifications <{}>", settings.user)
        .parse()
        .map_err(|e| format!("invalid from address: {}", e))?;
    let to: Mailbox = settings
        .user
        .parse()
        .map_err(|e| format!("invalid to address: {}", e))?;
    let reply_to: Mailbox = reply_to
        .parse()
        .map_err(|e| format!("invalid reply-to address: {}", e))?;

    let email = Message::builder()
        .from(from)
        .to(to)
        .reply_to(reply_to)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html)
        .map_err(|e| format!("failed to build email: {}", e))?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        .map_err(|e| format!("failed to create SMTP transport: {}", e))?
        .credentials(Credentials::new(settings.user, settings.pass))
        .build();

    mailer
        .send(email)
        .await
        .map(|_| ())
        .map_err(|e| format!("SMTP send failed: {}", e))
}

/// Notify the owner of a new contact submission. Skips silently when the
/// transport is not configured.
pub async fn send_contact_notification(contact: &NewContact) -> Result<(), String> {
    let Some(settings) = smtp_settings() else {
        tracing::debug!("Email skipped - EMAIL_USER/EMAIL_PASS not configured");
        return Ok(());
    };

    dispatch(
        settings,
        contact_subject(contact),
        contact_notification_html(contact),
        &contact.email,
    )
    .await?;

    tracing::info!("Contact notification sent for: {}", contact.full_name);
    Ok(())
}

/// Notify the owner of a new booking request. Skips silently when the
/// transport is not configured.
pub async fn send_booking_notification(booking: &NewBooking) -> Result<(), String> {
    let Some(settings) = smtp_settings() else {
        tracing::debug!("Email skipped - EMAIL_USER/EMAIL_PASS not configured");
        return Ok(());
    };

    dispatch(
        settings,
        booking_subject(booking),
        booking_notification_html(booking),
        &booking.email,
    )
    .await?;

    tracing::info!("Booking notification sent for: {}", booking.full_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_contact() -> NewContact {
        NewContact {
            full_name: "Ahmad F.".to_string(),
            email: "a@x.com".to_string(),
            purpose: "Consulting".to_string(),
            city: None,
            country: Some("UAE".to_string()),
            message: "Interested in a <strategy> session.".to_string(),
        }
    }

    fn sample_booking() -> NewBooking {
        NewBooking {
            full_name: "Ahmad F.".to_string(),
            email: "a@x.com".to_string(),
            phone: None,
            service_type: "Consulting".to_string(),
            package: None,
            preferred_date: Some("2025-09-01".to_string()),
            preferred_time: None,
            city: None,
            country: None,
            message: None,
        }
    }

    #[test]
    fn test_contact_html_includes_fields_and_escapes() {
        let html = contact_notification_html(&sample_contact());
        assert!(html.contains("Ahmad F."));
        assert!(html.contains("a@x.com"));
        assert!(html.contains("&lt;strategy&gt;"));
        assert!(!html.contains("<strategy>"));
    }

    #[test]
    fn test_contact_location_from_country_only() {
        let html = contact_notification_html(&sample_contact());
        assert!(html.contains("UAE"));
    }

    #[test]
    fn test_booking_html_placeholders_for_missing_fields() {
        let html = booking_notification_html(&sample_booking());
        assert!(html.contains("&mdash;"));
        assert!(html.contains("2025-09-01"));
        assert!(
            !html.contains("Additional Notes"),
            "message block only rendered when a message exists"
        );
    }

    #[test]
    fn test_booking_html_message_block_when_present() {
        let mut booking = sample_booking();
        booking.message = Some("Please call after 6pm".to_string());
        let html = booking_notification_html(&booking);
        assert!(html.contains("Additional Notes"));
        assert!(html.contains("Please call after 6pm"));
    }

    #[test]
    fn test_subjects() {
        assert_eq!(
            contact_subject(&sample_contact()),
            "New Contact: Ahmad F. — Consulting"
        );
        assert_eq!(
            booking_subject(&sample_booking()),
            "New Booking: Ahmad F. — Consulting"
        );
    }

    #[tokio::test]
    async fn test_send_skips_silently_when_unconfigured() {
        // EMAIL_USER/EMAIL_PASS are not set in the test environment
        assert!(!is_configured());
        assert!(send_contact_notification(&sample_contact()).await.is_ok());
        assert!(send_booking_notification(&sample_booking()).await.is_ok());
    }
}
