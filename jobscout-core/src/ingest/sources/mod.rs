//! Built-in and configured listing sources
//!
//! ## Supported Sources
//!
//! | Source | Module | Page |
//! |--------|--------|------|
//! | Indeed | [`indeed`] | remote part-time tech search |
//! | WeWorkRemotely | [`weworkremotely`] | remote programming category |
//!
//! Additional HTML sources can be declared in `[[sources.custom]]`.

pub mod indeed;
pub mod weworkremotely;

use super::source::{http_client, HtmlSource, SourceAdapter};
use crate::config::{Config, CustomSourceConfig};
use crate::error::Result;

/// Names of the built-in sources, in fetch order.
pub const BUILTIN_SOURCES: &[&str] = &[indeed::NAME, weworkremotely::NAME];

/// Create all enabled sources from configuration.
///
/// Built-ins listed in `sources.disabled` are skipped; custom sources are
/// appended after the built-ins. A custom source whose URLs do not parse is
/// logged and left out. All sources share one HTTP client.
pub fn create_all_sources(config: &Config) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = http_client(&config.fetch)?;
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    for name in BUILTIN_SOURCES {
        if config.sources.is_disabled(name) {
            tracing::info!(source = %name, "Source disabled by configuration");
            continue;
        }
        if let Some(source) = builtin_source(name, client.clone())? {
            sources.push(Box::new(source));
        }
    }

    for custom in &config.sources.custom {
        if config.sources.is_disabled(&custom.name) {
            continue;
        }
        match custom_source(custom, client.clone()) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => {
                tracing::error!(source = %custom.name, error = %e, "Skipping unusable custom source");
            }
        }
    }

    Ok(sources)
}

/// Build a built-in source by name (case-insensitive).
///
/// Returns `None` for unknown names.
pub fn builtin_source(name: &str, client: reqwest::Client) -> Result<Option<HtmlSource>> {
    let source = if name.eq_ignore_ascii_case(indeed::NAME) {
        HtmlSource::new(
            indeed::NAME,
            indeed::PAGE_URL,
            indeed::BASE_URL,
            indeed::layout(),
            client,
        )?
    } else if name.eq_ignore_ascii_case(weworkremotely::NAME) {
        HtmlSource::new(
            weworkremotely::NAME,
            weworkremotely::PAGE_URL,
            weworkremotely::BASE_URL,
            weworkremotely::layout(),
            client,
        )?
    } else {
        return Ok(None);
    };
    Ok(Some(source))
}

fn custom_source(custom: &CustomSourceConfig, client: reqwest::Client) -> Result<HtmlSource> {
    let layout = super::source::HtmlLayout {
        card: custom.card_selector.clone(),
        title: custom.title_selector.clone(),
        company: custom.company_selector.clone(),
        date: custom.date_selector.clone(),
        link: custom.link_selector.clone(),
        default_location: custom.default_location.clone(),
    };
    let base_url = custom.base_url.as_deref().unwrap_or(&custom.url);
    HtmlSource::new(&custom.name, &custom.url, base_url, layout, client)
}
