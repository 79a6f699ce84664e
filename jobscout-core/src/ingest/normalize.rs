//! Raw candidate → canonical [`Listing`]
//!
//! Defaulting of missing fields and identity assignment both live here so
//! every source produces listings the same way.

use super::filter::is_relevant;
use crate::types::{Listing, RawCandidate, UNKNOWN};
use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;

/// Hex characters of the digest kept in a listing id.
const ID_HASH_LEN: usize = 16;

/// Build a listing from a raw candidate scraped from `source`.
///
/// Returns `None` when the title is missing or not relevant, or when the
/// candidate has no link that resolves against `base_url` (no link, no
/// identity). `fetched_at` is set to now; the pipeline restamps it at write
/// time.
pub fn normalize(raw: &RawCandidate, source: &str, base_url: &Url) -> Option<Listing> {
    let title = clean(raw.title.as_deref())?;
    if !is_relevant(&title) {
        tracing::trace!(source, title = %title, "Title filtered out");
        return None;
    }

    let href = clean(raw.href.as_deref())?;
    let url = match canonical_url(base_url, &href) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(source, href = %href, error = %e, "Unresolvable listing link");
            return None;
        }
    };

    Some(Listing {
        id: listing_id(source, &url),
        title,
        company: clean(raw.company.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
        location: clean(raw.location.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
        posted_date: clean(raw.posted_date.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
        url,
        source: source.to_string(),
        fetched_at: Utc::now(),
    })
}

/// Resolve `href` against `base_url`, dropping any fragment.
pub fn canonical_url(base_url: &Url, href: &str) -> Result<String, url::ParseError> {
    let mut url = base_url.join(href)?;
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Stable identity for a listing: `<source-slug>_<sha256 prefix>`.
///
/// Hashes `source`, a NUL separator, and the canonical URL, so the same
/// posting gets the same id in every process.
pub fn listing_id(source: &str, canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical_url.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("{}_{}", source_slug(source), &digest[..ID_HASH_LEN])
}

/// Lowercase alphanumeric slug of a source name ("WeWorkRemotely" → "weworkremotely").
fn source_slug(source: &str) -> String {
    let slug: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if slug.is_empty() {
        "source".to_string()
    } else {
        slug
    }
}

/// Collapse internal whitespace; blank becomes `None`.
fn clean(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://weworkremotely.com").unwrap()
    }

    fn candidate(title: &str, href: &str) -> RawCandidate {
        RawCandidate {
            title: Some(title.to_string()),
            href: Some(href.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_irrelevant_title() {
        let raw = candidate("Warehouse Associate", "/jobs/1");
        assert!(normalize(&raw, "WeWorkRemotely", &base()).is_none());
    }

    #[test]
    fn test_rejects_missing_title_or_link() {
        let mut raw = candidate("Python Developer", "/jobs/1");
        raw.title = Some("   ".to_string());
        assert!(normalize(&raw, "WeWorkRemotely", &base()).is_none());

        let mut raw = candidate("Python Developer", "/jobs/1");
        raw.href = None;
        assert!(normalize(&raw, "WeWorkRemotely", &base()).is_none());
    }

    #[test]
    fn test_resolves_relative_url_and_defaults_fields() {
        let raw = candidate("  Rust\n   Engineer ", "/remote-jobs/acme-rust-engineer#apply");
        let listing = normalize(&raw, "WeWorkRemotely", &base()).unwrap();

        assert_eq!(listing.title, "Rust Engineer");
        assert_eq!(
            listing.url,
            "https://weworkremotely.com/remote-jobs/acme-rust-engineer"
        );
        assert_eq!(listing.company, UNKNOWN);
        assert_eq!(listing.location, UNKNOWN);
        assert_eq!(listing.posted_date, UNKNOWN);
        assert_eq!(listing.source, "WeWorkRemotely");
    }

    #[test]
    fn test_absolute_url_kept() {
        let raw = candidate("Data Analyst", "https://other.example/jobs/9?ref=abc");
        let listing = normalize(&raw, "WeWorkRemotely", &base()).unwrap();
        assert_eq!(listing.url, "https://other.example/jobs/9?ref=abc");
    }

    #[test]
    fn test_identity_is_stable() {
        let raw = candidate("Python Developer", "/jobs/1");
        let a = normalize(&raw, "WeWorkRemotely", &base()).unwrap();
        let b = normalize(&raw, "WeWorkRemotely", &base()).unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("weworkremotely_"));
        assert_eq!(a.id.len(), "weworkremotely_".len() + ID_HASH_LEN);
    }

    #[test]
    fn test_identity_known_digest() {
        let id = listing_id("a", "b");
        let mut hasher = Sha256::new();
        hasher.update(b"a\0b");
        let expected = hex::encode(hasher.finalize());
        assert_eq!(id, format!("a_{}", &expected[..ID_HASH_LEN]));
    }

    #[test]
    fn test_identity_depends_on_source_and_url() {
        let url = "https://example.com/jobs/1";
        assert_ne!(listing_id("Indeed", url), listing_id("WeWorkRemotely", url));
        assert_ne!(
            listing_id("Indeed", url),
            listing_id("Indeed", "https://example.com/jobs/2")
        );
    }

    #[test]
    fn test_fragment_does_not_change_identity() {
        let a = normalize(&candidate("Web Developer", "/jobs/1#top"), "X", &base()).unwrap();
        let b = normalize(&candidate("Web Developer", "/jobs/1"), "X", &base()).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_source_slug() {
        assert_eq!(source_slug("We Work Remotely!"), "weworkremotely");
        assert_eq!(source_slug("***"), "source");
    }
}
