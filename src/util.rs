//! Shared helpers for slugs and YouTube URLs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9\s-]").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-+").unwrap();

    /// Matches the 11-character video id in the YouTube URL shapes the admin
    /// console stores: watch?v=, youtu.be/, embed/, shorts/.
    static ref YOUTUBE_ID: Regex = Regex::new(
        r"(?:youtube\.com/(?:watch\?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})"
    )
    .unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Derive a URL-safe slug from a title: lowercase, strip everything outside
/// `[a-z0-9 -]`, collapse whitespace to single hyphens, collapse hyphen runs.
/// Deterministic, so calling it twice on the same title is a no-op.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(stripped.trim(), "-");
    HYPHEN_RUN
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

/// Extract the video id from a YouTube URL, or None for anything else.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug_basic() {
        assert_eq!(
            generate_slug("Why the Middle East Shift Matters!"),
            "why-the-middle-east-shift-matters"
        );
    }

    #[test]
    fn test_generate_slug_is_idempotent() {
        let once = generate_slug("Geopolitics  &  Growth: 2025 Outlook");
        let twice = generate_slug(&once);
        assert_eq!(once, "geopolitics-growth-2025-outlook");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_generate_slug_collapses_hyphens_and_trims() {
        assert_eq!(generate_slug("  --- Hello -- World ---  "), "hello-world");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_generated_slugs_pass_validation() {
        let slug = generate_slug("A Founder's Guide to Visas (2025)");
        assert!(is_valid_slug(&slug), "got {:?}", slug);
    }

    #[test]
    fn test_is_valid_slug_rejects_bad_shapes() {
        assert!(is_valid_slug("a-b-c"));
        assert!(!is_valid_slug("A-B"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("two--hyphens"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_youtube_video_id_url_shapes() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            youtube_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_youtube_video_id_rejects_foreign_urls() {
        assert_eq!(youtube_video_id("https://vimeo.com/12345678"), None);
        assert_eq!(youtube_video_id("not a url"), None);
    }
}
