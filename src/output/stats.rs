//! Statistics for a finished crawl run
//!
//! This module summarizes a `CrawlReport` and prints the summary for the
//! command line.

use crate::crawler::{CrawlReport, VisitError};
use crate::state::CompletionReason;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Number of admitted pages
    pub total_pages: usize,

    /// Number of distinct pages that referred to an admitted page
    pub distinct_referrers: usize,

    /// Number of failed visits
    pub total_errors: usize,

    /// Failed visits grouped by kind
    pub errors_by_kind: BTreeMap<&'static str, usize>,

    pub elapsed: Duration,

    pub reason: CompletionReason,
}

impl CrawlStatistics {
    /// Summarizes a finished run
    pub fn from_report(report: &CrawlReport) -> Self {
        let distinct_referrers = report
            .pages
            .iter()
            .map(|page| &page.referrer)
            .collect::<HashSet<_>>()
            .len();

        let mut errors_by_kind = BTreeMap::new();
        if let Some(errors) = &report.error {
            for error in errors.iter() {
                *errors_by_kind.entry(error_kind(error)).or_insert(0) += 1;
            }
        }

        Self {
            total_pages: report.pages.len(),
            distinct_referrers,
            total_errors: report.error_count(),
            errors_by_kind,
            elapsed: report.elapsed,
            reason: report.reason,
        }
    }

    /// Pages admitted per second of wall time
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_pages as f64 / secs
        } else {
            0.0
        }
    }
}

fn error_kind(error: &VisitError) -> &'static str {
    match error {
        VisitError::Fetch { .. } => "fetch",
        VisitError::Extract { .. } => "extract",
        VisitError::Canonicalize { .. } => "canonicalize",
        VisitError::Storage { .. } => "storage",
        VisitError::Panicked(_) => "panic",
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", stats.total_pages);
    println!("  Distinct referrers: {}", stats.distinct_referrers);
    println!(
        "  Elapsed: {:.2?} ({:.1} pages/sec)",
        stats.elapsed,
        stats.pages_per_second()
    );
    println!("  Finished because: {}", stats.reason);
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary ({} total):", stats.total_errors);
        for (kind, count) in &stats.errors_by_kind {
            println!("  {}: {}", kind, count);
        }
        println!();
    }
}
