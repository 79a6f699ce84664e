//! Source adapter trait abstraction
//!
//! All listing sites implement the [`SourceAdapter`] trait to provide a
//! unified interface for fetching raw candidates.
//!
//! ## Design Principles
//!
//! 1. **Isolation**: An adapter's failure is reported as an `Err` for that
//!    source only; the pipeline records it and moves on
//! 2. **Stateless**: Adapters hold configuration and a shared HTTP client,
//!    nothing else, so they can be fetched concurrently
//! 3. **Extensible**: New sites only require an [`HtmlLayout`] or a custom impl

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::types::RawCandidate;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Trait implemented by every listing source.
///
/// ## Example
///
/// ```rust,ignore
/// use jobscout_core::ingest::SourceAdapter;
///
/// struct MySource;
///
/// #[async_trait]
/// impl SourceAdapter for MySource {
///     fn name(&self) -> &str { "MySource" }
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name; also feeds listing identity, so keep it stable
    fn name(&self) -> &str;

    /// Base URL that relative listing links resolve against
    fn base_url(&self) -> &Url;

    /// Fetch the listing page and extract raw candidates.
    ///
    /// ## Error Handling
    ///
    /// Network errors, non-success HTTP statuses, and unusable selectors are
    /// returned as [`Error::Fetch`]. A page that simply contains no cards is
    /// `Ok(vec![])`.
    async fn fetch(&self) -> Result<Vec<RawCandidate>>;
}

/// CSS selectors describing one site's listing cards.
#[derive(Debug, Clone)]
pub struct HtmlLayout {
    /// One match per listing card
    pub card: String,
    /// Title element, relative to the card
    pub title: String,
    pub company: Option<String>,
    pub date: Option<String>,
    /// Element whose `href` links to the posting
    pub link: String,
    /// Location assumed for cards that carry none
    pub default_location: Option<String>,
}

/// Selectors compiled once per extraction.
struct CompiledLayout {
    card: Selector,
    title: Selector,
    company: Option<Selector>,
    date: Option<Selector>,
    link: Selector,
}

fn compile(source: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::fetch(source, format!("invalid selector {:?}: {:?}", selector, e)))
}

impl HtmlLayout {
    fn compile(&self, source: &str) -> Result<CompiledLayout> {
        Ok(CompiledLayout {
            card: compile(source, &self.card)?,
            title: compile(source, &self.title)?,
            company: self
                .company
                .as_deref()
                .map(|s| compile(source, s))
                .transpose()?,
            date: self.date.as_deref().map(|s| compile(source, s)).transpose()?,
            link: compile(source, &self.link)?,
        })
    }
}

/// Text content of the first element matching `selector` under `card`.
fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
}

/// Extract raw candidates from a listing page.
///
/// Cards that match the card selector become candidates even when inner
/// elements are missing; the normalizer decides what to keep.
pub fn extract_candidates(source: &str, html: &str, layout: &HtmlLayout) -> Result<Vec<RawCandidate>> {
    let compiled = layout.compile(source)?;
    let document = Html::parse_document(html);

    let candidates: Vec<RawCandidate> = document
        .select(&compiled.card)
        .map(|card| RawCandidate {
            title: first_text(&card, &compiled.title),
            company: compiled
                .company
                .as_ref()
                .and_then(|s| first_text(&card, s)),
            location: layout.default_location.clone(),
            posted_date: compiled.date.as_ref().and_then(|s| first_text(&card, s)),
            href: card
                .select(&compiled.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
        })
        .collect();

    Ok(candidates)
}

/// Build the HTTP client shared by all HTML sources.
///
/// Sends browser-like headers and enforces the per-request timeout.
pub fn http_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(config.timeout())
        .gzip(true)
        .build()
        .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))
}

/// A listing page described by an [`HtmlLayout`].
pub struct HtmlSource {
    name: String,
    page_url: String,
    base_url: Url,
    layout: HtmlLayout,
    client: reqwest::Client,
}

impl HtmlSource {
    pub fn new(
        name: impl Into<String>,
        page_url: impl Into<String>,
        base_url: &str,
        layout: HtmlLayout,
        client: reqwest::Client,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            page_url: page_url.into(),
            base_url: Url::parse(base_url)?,
            layout,
            client,
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    async fn fetch_html(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .map_err(|e| Error::fetch(&self.name, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!(source = %self.name, status = %status, "Listing page response");

        if !status.is_success() {
            return Err(Error::fetch(
                &self.name,
                format!("HTTP {} for {}", status, self.page_url),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| Error::fetch(&self.name, format!("failed to read body: {}", e)))
    }
}

#[async_trait]
impl SourceAdapter for HtmlSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        tracing::info!(source = %self.name, url = %self.page_url, "Fetching listing page");

        let html = self.fetch_html().await?;
        let candidates = extract_candidates(&self.name, &html, &self.layout)?;

        if candidates.is_empty() {
            tracing::warn!(
                source = %self.name,
                card_selector = %self.layout.card,
                "No listing cards found; page markup may have changed"
            );
        } else {
            tracing::info!(source = %self.name, count = candidates.len(), "Found listing cards");
        }

        Ok(candidates)
    }
}
