//! Website URL normalization.

use url::Url;

/// Normalize a website URL to `scheme://host[:port]/path`.
///
/// A missing scheme defaults to `https`. Query and fragment are dropped, the
/// host is lowercased and a trailing slash is removed. Returns `None` for
/// blank input or anything that does not parse as an `http(s)` URL with a host.
#[must_use]
pub fn normalize_website(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;

    url.set_query(None);
    url.set_fragment(None);
    // Credentials never belong in a stored website link.
    let _ = url.set_username("");
    let _ = url.set_password(None);

    let rendered = url.to_string();
    Some(rendered.trim_end_matches('/').to_string())
}

/// Dedup domain of a website: lowercase host with a leading `www.` removed.
///
/// Returns an empty string when no host can be extracted, which never
/// collides with another lead.
#[must_use]
pub fn website_domain(website: &str) -> String {
    let Some(normalized) = normalize_website(website) else {
        return String::new();
    };
    let Ok(url) = Url::parse(&normalized) else {
        return String::new();
    };
    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.strip_prefix("www.").map_or(host.clone(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_fragment_and_slash() {
        assert_eq!(
            normalize_website("https://praxis-mueller.de/kontakt/?ref=maps#top").as_deref(),
            Some("https://praxis-mueller.de/kontakt")
        );
        assert_eq!(
            normalize_website("http://Example.DE/").as_deref(),
            Some("http://example.de")
        );
    }

    #[test]
    fn test_normalize_defaults_scheme() {
        assert_eq!(
            normalize_website("  zahnarzt-ulm.de ").as_deref(),
            Some("https://zahnarzt-ulm.de")
        );
    }

    #[test]
    fn test_normalize_keeps_port_and_path_case() {
        assert_eq!(
            normalize_website("https://shop.example.org:8443/Team").as_deref(),
            Some("https://shop.example.org:8443/Team")
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_website(""), None);
        assert_eq!(normalize_website("   "), None);
        assert_eq!(normalize_website("https://"), None);
        assert_eq!(normalize_website("ftp://files.praxis.de"), None);
    }

    #[test]
    fn test_website_domain() {
        assert_eq!(website_domain("https://WWW.Praxis-Mueller.de/team"), "praxis-mueller.de");
        assert_eq!(website_domain("praxis-mueller.de"), "praxis-mueller.de");
        assert_eq!(website_domain("https://shop.praxis.de"), "shop.praxis.de");
        assert_eq!(website_domain("not a url at all"), "");
        assert_eq!(website_domain(""), "");
    }
}
