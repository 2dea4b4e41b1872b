use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Name used when neither the name nor the URL host yields a slug.
const FALLBACK_NAME: &str = "unnamed";

/// Lowercase, collapse every run of non `[a-z0-9]` into one hyphen, trim hyphens.
pub fn create_slug(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// `{host}{path}` identity for dedup. Empty when the URL has no parsable host.
pub fn normalize_url_key(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    if host.is_empty() {
        return String::new();
    }
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = parsed.path().trim_end_matches('/');
    format!("{}{}", host, path).to_lowercase()
}

/// Lowercased host with a leading `www.` removed, if the URL has one.
pub fn host_without_www(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Stand-in display name for rows whose name slugifies to nothing.
pub fn fallback_name_from_url(url: &str) -> String {
    host_without_www(url).unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Slug of `name`, or of the URL-derived fallback name when `name` has none.
/// Returns the name that produced the slug alongside it.
pub fn slug_or_fallback(name: &str, url: &str) -> (String, String) {
    let slug = create_slug(name);
    if !slug.is_empty() {
        return (name.to_string(), slug);
    }
    let fallback = fallback_name_from_url(url);
    let slug = create_slug(&fallback);
    (fallback, slug)
}

/// Anything but empty, "Uncategorized" or "Other" (case-insensitive).
pub fn has_specific_category(category: &str) -> bool {
    let cat = category.trim();
    !(cat.is_empty()
        || cat.eq_ignore_ascii_case("uncategorized")
        || cat.eq_ignore_ascii_case("other"))
}

pub fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Placeholder the site shows for rows without a name.
pub fn is_placeholder_name(name: &str) -> bool {
    name.is_empty() || name == "Unnamed"
}

pub fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

// ── Tests ──
