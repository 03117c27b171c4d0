//! Crawler module for site traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` trait
//! - HTML link extraction behind the `LinkExtractor` trait
//! - The controller that fans visits out and results back in

mod controller;
mod fetcher;
mod parser;

pub use controller::{Controller, ControllerSettings, CrawlErrors, CrawlReport, VisitError};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use parser::{ExtractError, HtmlLinkExtractor, LinkExtractor, DEFAULT_LINK_SELECTOR};

use crate::config::{validate, Config};
use crate::storage::open_store;
use crate::url::Address;
use crate::CrawlError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Open the configured page store
/// 3. Build the HTTP client and link extractor
/// 4. Crawl the site from the configured base address
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Clear pages left in a persistent store by a previous run
/// * `cancel` - Cancels the run; pages already reported are still returned
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran; per-page failures are in the report
/// * `Err(CrawlError)` - The crawl could not be set up
pub async fn crawl(
    config: &Config,
    fresh: bool,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    validate(config)?;

    let base = Address::parse(&config.crawler.base_url)?;
    let store = open_store(&config.storage, fresh)?;
    let fetcher = HttpFetcher::from_config(&config.user_agent, config.crawler.http_timeout())?;
    let extractor = HtmlLinkExtractor::new()?;

    let controller = Controller::new(Arc::new(fetcher), Arc::new(extractor), store)
        .with_settings(ControllerSettings::from(&config.crawler));

    Ok(controller.start(base.clone(), base, cancel).await)
}
