//! Indeed remote part-time tech search

use crate::ingest::source::HtmlLayout;

pub const NAME: &str = "Indeed";
pub const PAGE_URL: &str = "https://www.indeed.com/jobs?q=remote+part+time+tech&l=Remote";
pub const BASE_URL: &str = "https://www.indeed.com";

pub fn layout() -> HtmlLayout {
    HtmlLayout {
        card: "div.job_seen_beacon".to_string(),
        title: "h2.jobTitle".to_string(),
        company: Some("span.companyName".to_string()),
        date: Some("span.date".to_string()),
        link: "a".to_string(),
        default_location: Some("Remote".to_string()),
    }
}
