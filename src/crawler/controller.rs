//! Crawl controller - fan-out/fan-in orchestration of visit tasks
//!
//! The controller owns one event loop per run. Each discovered address gets
//! its own visit task; tasks report admitted pages, newly discovered work and
//! failures over three unbounded channels, and the loop is the only place
//! run state is touched. Termination is decided either by an idle window
//! (no page reported for a while) or structurally, once no visit task is
//! outstanding.
//!
//! Deduplication happens in the shared page store, not in the loop: a task
//! checks `lookup` and then calls `insert_if_absent`, so two tasks can race
//! between the check and the insert. The loser sees `AlreadyExists` and skips
//! the address, which keeps admission exactly-once.

use crate::config::{CompletionMode, CrawlerConfig};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::parser::{ExtractError, LinkExtractor};
use crate::state::{CompletionReason, Page, RunState};
use crate::storage::PageStore;
use crate::url::{canonicalize, Address};
use crate::UrlError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// A failure scoped to one visit task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisitError {
    #[error("fetching {address}: {source}")]
    Fetch {
        address: Address,
        source: FetchError,
    },

    #[error("extracting links from {address}: {source}")]
    Extract {
        address: Address,
        source: ExtractError,
    },

    #[error("canonicalizing links found on {address}: {source}")]
    Canonicalize {
        address: Address,
        source: UrlError,
    },

    #[error("storing {address}: {reason}")]
    Storage { address: Address, reason: String },

    #[error("visit task panicked: {0}")]
    Panicked(String),
}

impl VisitError {
    /// The address the failure concerns, if known
    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Fetch { address, .. }
            | Self::Extract { address, .. }
            | Self::Canonicalize { address, .. }
            | Self::Storage { address, .. } => Some(address),
            Self::Panicked(_) => None,
        }
    }
}

/// Every per-task failure of one run
///
/// A run that returns a non-empty `CrawlErrors` still returns every page it
/// admitted; the errors only mean the result is partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlErrors {
    errors: Vec<VisitError>,
}

impl CrawlErrors {
    pub fn push(&mut self, error: VisitError) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisitError> {
        self.errors.iter()
    }

    fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for CrawlErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} visit(s) failed", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CrawlErrors {}

/// Result of one run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Every admitted page, in the order the controller received them
    pub pages: Vec<Page>,

    /// Aggregated per-task failures, `None` if every visit succeeded
    pub error: Option<CrawlErrors>,

    pub reason: CompletionReason,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn error_count(&self) -> usize {
        self.error.as_ref().map_or(0, CrawlErrors::len)
    }
}

/// Tunables for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Quiescence window used by `CompletionMode::Idle`
    pub idle_timeout: Duration,

    pub completion: CompletionMode,

    /// Maximum concurrent visits, 0 for no limit
    pub max_in_flight: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
            completion: CompletionMode::Idle,
            max_in_flight: 0,
        }
    }
}

impl From<&CrawlerConfig> for ControllerSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            completion: config.completion,
            max_in_flight: config.max_in_flight,
        }
    }
}

/// Drives fetch, extract, canonicalize and admit for a whole site
pub struct Controller {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    store: Arc<dyn PageStore>,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        store: Arc<dyn PageStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            store,
            settings: ControllerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Crawls every in-scope page reachable from `seed`
    ///
    /// # Arguments
    ///
    /// * `base` - Scope anchor; only links on its host are followed
    /// * `seed` - First address visited, with itself as referrer
    /// * `cancel` - Stops dispatching and returns what was already reported
    ///
    /// # Returns
    ///
    /// The admitted pages and the aggregated per-task failures. The seed is
    /// only part of the result if some page links back to it.
    pub async fn start(
        &self,
        base: Address,
        seed: Address,
        cancel: CancellationToken,
    ) -> CrawlReport {
        let started = Instant::now();
        let mut state = RunState::Running;

        let (page_tx, mut page_rx) = mpsc::unbounded_channel();
        let (work_tx, mut work_rx) = mpsc::unbounded_channel();
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();

        let tasks_cancel = cancel.child_token();
        let limiter = (self.settings.max_in_flight > 0)
            .then(|| Arc::new(Semaphore::new(self.settings.max_in_flight)));

        let ctx = Arc::new(VisitContext {
            base: base.clone(),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            store: Arc::clone(&self.store),
            limiter,
            pages: page_tx,
            work: work_tx,
            errors: error_tx,
            cancel: tasks_cancel.clone(),
        });

        let mut tasks = JoinSet::new();
        let mut pages: Vec<Page> = Vec::new();
        let mut errors = CrawlErrors::default();

        tracing::info!(
            "Starting crawl of {} from {} ({:?} completion)",
            base,
            seed,
            self.settings.completion
        );

        tasks.spawn(visit(Arc::clone(&ctx), seed));

        let idle_timeout = self.settings.idle_timeout;
        let idle_mode = self.settings.completion == CompletionMode::Idle;
        let idle = sleep(idle_timeout);
        tokio::pin!(idle);

        let reason = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break CompletionReason::Cancelled,

                Some(page) = page_rx.recv() => {
                    tracing::debug!("Admitted {} (from {})", page.address, page.referrer);
                    pages.push(page);
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                }

                Some(address) = work_rx.recv(), if state.accepts_work() => {
                    tasks.spawn(visit(Arc::clone(&ctx), address));
                }

                Some(error) = error_rx.recv() => {
                    tracing::warn!("{}", error);
                    errors.push(error);
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    record_join(joined, &mut errors);

                    if !idle_mode && tasks.is_empty() {
                        // Every finished task has already sent all it will
                        // send, so draining the queues settles the question.
                        while let Ok(page) = page_rx.try_recv() {
                            pages.push(page);
                        }
                        while let Ok(error) = error_rx.try_recv() {
                            tracing::warn!("{}", error);
                            errors.push(error);
                        }
                        while let Ok(address) = work_rx.try_recv() {
                            if state.accepts_work() {
                                tasks.spawn(visit(Arc::clone(&ctx), address));
                            }
                        }

                        if tasks.is_empty() {
                            break CompletionReason::Exhausted;
                        }
                    }
                }

                () = &mut idle, if idle_mode => break CompletionReason::Idle,
            }
        };

        state.advance(RunState::Draining);
        tracing::info!(
            "Crawl stopping ({}), waiting for {} visit task(s)",
            reason,
            tasks.len()
        );

        tasks_cancel.cancel();
        while let Some(joined) = tasks.join_next().await {
            record_join(joined, &mut errors);
        }

        while let Ok(page) = page_rx.try_recv() {
            pages.push(page);
        }
        while let Ok(error) = error_rx.try_recv() {
            tracing::warn!("{}", error);
            errors.push(error);
        }

        let mut abandoned = 0usize;
        while let Ok(address) = work_rx.try_recv() {
            tracing::trace!("Not visiting {}", address);
            abandoned += 1;
        }
        if abandoned > 0 {
            tracing::debug!("{} admitted address(es) were not visited", abandoned);
        }

        state.advance(RunState::Done);

        let elapsed = started.elapsed();
        tracing::info!(
            "Crawl {}: {} pages, {} errors in {:.2?}",
            state,
            pages.len(),
            errors.len(),
            elapsed
        );

        CrawlReport {
            pages,
            error: errors.into_option(),
            reason,
            elapsed,
        }
    }
}

fn record_join(joined: Result<(), JoinError>, errors: &mut CrawlErrors) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("Visit task panicked: {}", e);
            errors.push(VisitError::Panicked(e.to_string()));
        }
    }
}

/// Everything a visit task needs, shared by all tasks of one run
struct VisitContext {
    base: Address,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    store: Arc<dyn PageStore>,
    limiter: Option<Arc<Semaphore>>,
    pages: mpsc::UnboundedSender<Page>,
    work: mpsc::UnboundedSender<Address>,
    errors: mpsc::UnboundedSender<VisitError>,
    cancel: CancellationToken,
}

impl VisitContext {
    fn report(&self, error: VisitError) {
        // A closed channel means the run is over.
        let _ = self.errors.send(error);
    }

    /// Extracts, canonicalizes and admits the links of one fetched body,
    /// emitting each page as soon as it is admitted
    fn admit_links(&self, target: &Address, body: &str) -> Result<usize, VisitError> {
        let raw_links = self
            .extractor
            .extract_links(body, &self.base)
            .map_err(|source| VisitError::Extract {
                address: target.clone(),
                source,
            })?;

        let candidates =
            canonicalize(&raw_links, &self.base).map_err(|source| VisitError::Canonicalize {
                address: target.clone(),
                source,
            })?;

        let storage_error = |e: crate::storage::StorageError| VisitError::Storage {
            address: target.clone(),
            reason: e.to_string(),
        };

        let mut admitted = 0;
        for candidate in candidates {
            match self.store.lookup(&candidate) {
                Ok(_) => continue,
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(storage_error(e)),
            }

            let page = Page::new(candidate, target.clone());
            match self.store.insert_if_absent(page.clone()) {
                Ok(()) => {
                    let _ = self.work.send(page.address.clone());
                    let _ = self.pages.send(page);
                    admitted += 1;
                }
                Err(e) if e.is_already_exists() => {
                    tracing::debug!("Lost admission race for {}", page.address);
                }
                Err(e) => return Err(storage_error(e)),
            }
        }

        Ok(admitted)
    }
}

/// One visit: fetch `target`, then admit every new in-scope link on it
async fn visit(ctx: Arc<VisitContext>, target: Address) {
    if ctx.cancel.is_cancelled() {
        return;
    }

    let _permit = match &ctx.limiter {
        Some(limiter) => {
            let acquired = tokio::select! {
                _ = ctx.cancel.cancelled() => return,
                permit = Arc::clone(limiter).acquire_owned() => permit,
            };
            match acquired {
                Ok(permit) => Some(permit),
                Err(_) => return,
            }
        }
        None => None,
    };

    let body = match ctx.fetcher.fetch(&target, &ctx.cancel).await {
        Ok(body) => body,
        Err(FetchError::Cancelled) => {
            tracing::debug!("Visit to {} cancelled", target);
            return;
        }
        Err(source) => {
            ctx.report(VisitError::Fetch {
                address: target,
                source,
            });
            return;
        }
    };

    match ctx.admit_links(&target, &body) {
        Ok(admitted) => tracing::debug!("Visited {}: {} new page(s)", target, admitted),
        Err(e) => ctx.report(e),
    }
}
