//! Placeholder listings used when a run produces nothing
//!
//! Keeps the listing page populated on first start when every source is
//! unreachable. Built through the normal normalizer so ids are stable and a
//! later run simply refreshes the same rows.

use super::normalize::normalize;
use crate::types::{Listing, RawCandidate};
use url::Url;

pub const PLACEHOLDER_SOURCE: &str = "Sample Data";
const PLACEHOLDER_BASE: &str = "https://example.com";

const PLACEHOLDERS: &[(&str, &str, &str, &str)] = &[
    ("Part-time Python Developer", "TechCorp", "1 day ago", "/job1"),
    (
        "Remote Frontend Engineer (Part-time)",
        "WebStack Inc",
        "2 days ago",
        "/job2",
    ),
    ("Part-time Data Analyst", "DataCo", "3 days ago", "/job3"),
];

/// The fixed placeholder set.
pub fn placeholder_listings() -> Vec<Listing> {
    let Ok(base) = Url::parse(PLACEHOLDER_BASE) else {
        return Vec::new();
    };

    PLACEHOLDERS
        .iter()
        .filter_map(|(title, company, posted, path)| {
            let raw = RawCandidate {
                title: Some(title.to_string()),
                company: Some(company.to_string()),
                location: Some("Remote".to_string()),
                posted_date: Some(posted.to_string()),
                href: Some(path.to_string()),
            };
            normalize(&raw, PLACEHOLDER_SOURCE, &base)
        })
        .collect()
}
