use url::Url;

use crate::normalize::{create_slug, has_http_scheme};

/// Showcase/gallery aggregators. A URL pointing at one of these is a listing,
/// not the business's own site.
const PLATFORM_DOMAINS: &[&str] = &[
    "land-book.com",
    "saaslandingpage.com",
    "onepagelove.com",
    "webflow.com/made-in-webflow",
    "webflow.com/@",
    "a1.gallery",
];

const MAX_DOMAIN_LEN: usize = 30;
const LONG_NAME_SLUG: usize = 15;
const NAME_PREFIX_LEN: usize = 20;
const LONG_DOMAIN: usize = 20;
const STUFFED_DOMAIN: usize = 25;
const MAX_DOMAIN_HYPHENS: usize = 3;

/// Heuristic check that `url` is the official site for `name`.
///
/// Rejects gallery links and domains that look machine-generated. Never errors:
/// anything that fails to parse is simply rejected.
pub fn is_valid_official_url(url: &str, name: &str) -> bool {
    if url.trim().is_empty() || name.is_empty() {
        return false;
    }
    if !has_http_scheme(url) {
        return false;
    }

    let url_lower = url.trim().to_lowercase();
    if PLATFORM_DOMAINS.iter().any(|p| url_lower.contains(p)) {
        return false;
    }

    let Some(label) = first_host_label(url) else {
        return false;
    };

    if label.len() > MAX_DOMAIN_LEN {
        return false;
    }

    // Domain built by stuffing the business name into it
    let name_slug = create_slug(name);
    if name_slug.len() > LONG_NAME_SLUG && label.len() > LONG_DOMAIN {
        let prefix: String = name_slug.chars().take(NAME_PREFIX_LEN).collect();
        if label.contains(&prefix) && label.len() > STUFFED_DOMAIN {
            return false;
        }
    }

    let hyphens = label.matches('-').count();
    if label.len() > STUFFED_DOMAIN && hyphens > MAX_DOMAIN_HYPHENS {
        return false;
    }

    true
}

/// Host label before the first dot, after dropping a leading `www.`.
fn first_host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    host.split('.').next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_business_site() {
        assert!(is_valid_official_url("https://acme.io", "Acme"));
        assert!(is_valid_official_url("http://www.acme.io/about", "Acme"));
        assert!(is_valid_official_url("HTTPS://ACME.IO", "Acme"));
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(!is_valid_official_url("", "Acme"));
        assert!(!is_valid_official_url("   ", "Acme"));
        assert!(!is_valid_official_url("https://acme.io", ""));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(!is_valid_official_url("ftp://acme.io", "Acme"));
        assert!(!is_valid_official_url("acme.io", "Acme"));
    }

    #[test]
    fn rejects_platform_links() {
        for url in [
            "https://land-book.com/websites/123-acme",
            "https://acme.io/?ref=land-book.com",
            "https://onepagelove.com/acme",
            "https://webflow.com/made-in-webflow/website/acme",
            "https://webflow.com/@acme",
            "https://a1.gallery/acme",
        ] {
            assert!(!is_valid_official_url(url, "Acme"), "{}", url);
        }
    }

    #[test]
    fn rejects_unparsable_host() {
        assert!(!is_valid_official_url("https://", "Acme"));
        assert!(!is_valid_official_url("https:// spaced out .com", "Acme"));
    }

    #[test]
    fn domain_length_limit() {
        let label31 = "qwertyuiopasdfghjklzxcvbnmqwert";
        assert_eq!(label31.len(), 31);
        assert!(!is_valid_official_url(
            &format!("https://{}.com", label31),
            "Acme"
        ));
        let label30 = &label31[..30];
        assert!(is_valid_official_url(
            &format!("https://{}.com", label30),
            "Acme"
        ));
    }

    #[test]
    fn rejects_name_stuffed_domain() {
        // slug "best-plumbing-services-denver" (29), prefix "best-plumbing-servic"
        let name = "Best Plumbing Services Denver";
        assert!(!is_valid_official_url(
            "https://best-plumbing-services-den.com",
            name
        ));
        // Same prefix, but the label is exactly 25 chars: kept
        assert!(is_valid_official_url(
            "https://best-plumbing-servicxxxxx.com",
            name
        ));
    }

    #[test]
    fn rejects_hyphen_spam() {
        // 26 chars, 4 hyphens
        assert!(!is_valid_official_url("https://aaaa-bbbb-cccc-dddd-eeeeee.com", "Shop"));
        // 26 chars, 3 hyphens
        assert!(is_valid_official_url("https://aaaaa-bbbbb-cccccc-ddddddd.com", "Shop"));
        // 4 hyphens but short
        assert!(is_valid_official_url("https://a-b-c-d-e.com", "Shop"));
    }
}
