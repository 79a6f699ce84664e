//! We Work Remotely programming category

use crate::ingest::source::HtmlLayout;

pub const NAME: &str = "WeWorkRemotely";
pub const PAGE_URL: &str = "https://weworkremotely.com/categories/remote-programming-jobs";
pub const BASE_URL: &str = "https://weworkremotely.com";

pub fn layout() -> HtmlLayout {
    HtmlLayout {
        card: "li.feature".to_string(),
        title: "span.title".to_string(),
        company: Some("span.company".to_string()),
        date: Some("time".to_string()),
        link: "a".to_string(),
        default_location: Some("Remote".to_string()),
    }
}
