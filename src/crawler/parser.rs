//! HTML link extraction
//!
//! Extraction returns the raw `href` text of every matching anchor. Turning
//! those strings into comparable addresses is the canonicalizer's job, so
//! nothing here resolves, filters by scope or deduplicates.

use crate::url::Address;
use scraper::{Html, Selector};
use thiserror::Error;

/// Selector used when none is configured
pub const DEFAULT_LINK_SELECTOR: &str = "a[href]";

/// Why links could not be extracted from a body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("invalid link selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("failed to parse markup: {0}")]
    Markup(String),
}

/// Turns a fetched body into raw candidate links
pub trait LinkExtractor: Send + Sync {
    /// Returns the raw link text found in `body`
    ///
    /// `base` is the address the body was fetched relative to; raw links are
    /// returned unresolved.
    fn extract_links(&self, body: &str, base: &Address) -> Result<Vec<String>, ExtractError>;
}

/// Extracts `href` values from HTML with a CSS selector
#[derive(Debug, Clone)]
pub struct HtmlLinkExtractor {
    selector: Selector,
}

impl HtmlLinkExtractor {
    /// Extractor matching every anchor with an `href`
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_selector(DEFAULT_LINK_SELECTOR)
    }

    /// Uses a custom selector; matched elements must carry an `href`
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlLinkExtractor)` - The selector parsed
    /// * `Err(ExtractError::Selector)` - The selector is not valid CSS
    pub fn with_selector(selector: &str) -> Result<Self, ExtractError> {
        let compiled = Selector::parse(selector).map_err(|e| ExtractError::Selector {
            selector: selector.to_string(),
            reason: format!("{:?}", e),
        })?;
        Ok(Self { selector: compiled })
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, body: &str, base: &Address) -> Result<Vec<String>, ExtractError> {
        let document = Html::parse_document(body);

        // Only spaces are stripped; other whitespace is left for the
        // canonicalizer to reject.
        let links: Vec<String> = document
            .select(&self.selector)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim_matches(' '))
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect();

        tracing::debug!("Extracted {} raw links from {}", links.len(), base);
        Ok(links)
    }
}
