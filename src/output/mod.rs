//! Output module for presenting crawl results
//!
//! This module handles:
//! - Rendering the pages of a run as plain text or JSON
//! - Persisting rendered output to a file
//! - Summarizing a run as statistics

mod json;
mod raw;
pub mod stats;
mod traits;

pub use json::{JsonPrinter, JSON_FILE_NAME};
pub use raw::{RawPrinter, RAW_FILE_NAME};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, PagePrinter};

use crate::state::Page;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The output formats a run can be presented in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterKind {
    #[default]
    Raw,
    Json,
}

impl PrinterKind {
    /// Returns the printer for this format
    pub fn printer(self) -> Box<dyn PagePrinter> {
        match self {
            Self::Raw => Box::new(RawPrinter),
            Self::Json => Box::new(JsonPrinter),
        }
    }

    /// Renders `pages` in this format
    pub fn render(self, pages: &[Page]) -> OutputResult<String> {
        self.printer().render(pages)
    }
}

impl FromStr for PrinterKind {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "json" => Ok(Self::Json),
            other => Err(OutputError::UnknownPrinter(other.to_string())),
        }
    }
}

impl fmt::Display for PrinterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Json => f.write_str("json"),
        }
    }
}
