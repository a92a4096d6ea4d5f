//! Email pattern matching and false-positive filtering.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("email regex is hardcoded and valid")
});

/// Local parts that are long hex strings are tracking or internal ids.
static HEX_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{20,}$").expect("hex id regex is hardcoded and valid"));

/// Placeholder and platform-internal domains.
const INVALID_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "placeholder.com",
    "email.com",
    "domain.com",
    "sentry.io",
    "wixpress.com",
    "sentry.wixpress.com",
    "sentry-next.wixpress.com",
    "yoursite.com",
    "youremail.com",
];

const INVALID_DOMAIN_SUFFIXES: &[&str] = &[".wixpress.com", ".sentry.io"];

/// Asset names like `logo@2x.png` look like addresses to the pattern.
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Maximum length of an address (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// Whether a matched address is worth keeping.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return false;
    }

    let lower = email.trim().to_lowercase();
    let Some((local, domain)) = lower.rsplit_once('@') else {
        return false;
    };

    if INVALID_DOMAINS.contains(&domain) {
        return false;
    }
    if INVALID_DOMAIN_SUFFIXES.iter().any(|s| domain.ends_with(s)) {
        return false;
    }
    if HEX_ID_PATTERN.is_match(local) {
        return false;
    }
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        return false;
    }

    true
}

/// Extract valid addresses from HTML in order of first occurrence.
///
/// Duplicates are dropped case-insensitively; the first spelling wins.
#[must_use]
pub fn extract_emails_from_html(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_PATTERN
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|email| is_valid_email(email))
        .filter(|email| seen.insert(email.to_lowercase()))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_business_address() {
        assert!(is_valid_email("info@zahnarzt-ulm.de"));
        assert!(is_valid_email("praxis.mueller+termine@t-online.de"));
    }

    #[test]
    fn test_rejects_placeholders_and_platform_addresses() {
        assert!(!is_valid_email("name@example.com"));
        assert!(!is_valid_email("you@YourSite.com"));
        assert!(!is_valid_email("abc@sentry.wixpress.com"));
        assert!(!is_valid_email("abc@o123.ingest.sentry.io"));
        assert!(!is_valid_email("abc@static.wixpress.com"));
    }

    #[test]
    fn test_rejects_hex_ids_and_images() {
        assert!(!is_valid_email("605a7baede844d278b89dc95ae0a9123@sentry-next.wixpress.com"));
        assert!(!is_valid_email("0123456789abcdef0123@praxis.de"));
        assert!(is_valid_email("0123456789abcdef012@praxis.de"), "19 hex chars is fine");
        assert!(!is_valid_email("logo@2x.png"));
        assert!(!is_valid_email("hero-image@3x.jpg"));
    }

    #[test]
    fn test_rejects_overlong() {
        let long = format!("{}@praxis.de", "a".repeat(250));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn test_extract_from_html_keeps_order_and_dedups() {
        let html = r#"
            <a href="mailto:Info@Praxis-Weber.de">Mail</a>
            <img src="/img/logo@2x.png">
            <p>Termine: termine@praxis-weber.de</p>
            <p>Noch einmal: info@praxis-weber.de</p>
            <script>dsn = "https://0123456789abcdef0123456789abcdef@sentry.io/1"</script>
        "#;
        let emails = extract_emails_from_html(html);
        assert_eq!(
            emails,
            vec![
                "Info@Praxis-Weber.de".to_string(),
                "termine@praxis-weber.de".to_string()
            ]
        );
    }

    #[test]
    fn test_extract_from_empty_html() {
        assert!(extract_emails_from_html("").is_empty());
        assert!(extract_emails_from_html("<html><body>Kontakt per Telefon</body></html>").is_empty());
    }
}
