//! Relevance filter for listing titles
//!
//! A coarse keyword match. False positives are cheap (an extra row on the
//! page); false negatives silently hide postings, so the list errs wide.

/// Lowercase substrings that mark a title as in-domain.
///
/// `"it "` keeps its trailing space so "city" or "recruiting" stay out while
/// "IT Support" gets in.
pub const TECH_KEYWORDS: &[&str] = &[
    "software",
    "developer",
    "engineer",
    "it ",
    "cyber",
    "data",
    "web",
    "python",
    "java",
    "javascript",
    "analyst",
    "devops",
    "cloud",
    "security",
    "frontend",
    "backend",
    "full stack",
];

/// Whether a listing title belongs to the tech domain.
pub fn is_relevant(title: &str) -> bool {
    let title = title.to_lowercase();
    TECH_KEYWORDS.iter().any(|keyword| title.contains(keyword))
}
