//! Structural classification of decoded payloads.
//!
//! Patterns are tried in a fixed order; the first match wins and anything
//! unmatched is plain text. Classification only annotates a code.

use std::sync::LazyLock;

use qrbox_core::models::QrContentKind;
use regex::Regex;

static PATTERNS: LazyLock<Vec<(QrContentKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            QrContentKind::Url,
            Regex::new(r"(?i)^https?://.+").expect("url pattern"),
        ),
        (
            QrContentKind::Email,
            Regex::new(r"(?i)^mailto:.+|^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"),
        ),
        (
            QrContentKind::Phone,
            Regex::new(r"^tel:|^\+?[\d\s\-()]+$").expect("phone pattern"),
        ),
        (
            QrContentKind::Wifi,
            Regex::new(r"(?i)^WIFI:").expect("wifi pattern"),
        ),
        (
            QrContentKind::Vcard,
            Regex::new(r"(?i)^BEGIN:VCARD").expect("vcard pattern"),
        ),
        (
            QrContentKind::Geo,
            Regex::new(r"(?i)^geo:").expect("geo pattern"),
        ),
        (
            QrContentKind::Sms,
            Regex::new(r"(?i)^sms:").expect("sms pattern"),
        ),
    ]
});

/// Classify a payload by structural pattern.
pub fn classify(content: &str) -> QrContentKind {
    for (kind, pattern) in PATTERNS.iter() {
        if pattern.is_match(content) {
            return *kind;
        }
    }
    QrContentKind::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_urls() {
        assert_eq!(classify("https://example.com"), QrContentKind::Url);
        assert_eq!(classify("http://example.com/path?q=1"), QrContentKind::Url);
        assert_eq!(classify("HTTPS://EXAMPLE.COM"), QrContentKind::Url);
    }

    #[test]
    fn classifies_email() {
        assert_eq!(classify("mailto:someone@example.com"), QrContentKind::Email);
        assert_eq!(classify("someone@example.com"), QrContentKind::Email);
    }

    #[test]
    fn classifies_phone() {
        assert_eq!(classify("tel:+15551234567"), QrContentKind::Phone);
        assert_eq!(classify("+1 (555) 123-4567"), QrContentKind::Phone);
    }

    #[test]
    fn classifies_wifi_vcard_geo_sms() {
        assert_eq!(
            classify("WIFI:T:WPA;S:mynetwork;P:secret;;"),
            QrContentKind::Wifi
        );
        assert_eq!(
            classify("BEGIN:VCARD\nVERSION:3.0\nFN:Jo\nEND:VCARD"),
            QrContentKind::Vcard
        );
        assert_eq!(classify("geo:52.52,13.40"), QrContentKind::Geo);
        assert_eq!(classify("sms:+15551234567"), QrContentKind::Sms);
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(classify("hello world"), QrContentKind::Text);
        assert_eq!(classify("ftp://example.com"), QrContentKind::Text);
        assert_eq!(classify(""), QrContentKind::Text);
    }

    #[test]
    fn classification_does_not_alter_content() {
        // The classifier reads, never rewrites; callers keep the exact payload.
        let content = "https://example.com";
        let _ = classify(content);
        assert_eq!(content, "https://example.com");
    }
}
