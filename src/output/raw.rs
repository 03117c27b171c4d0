//! Plain-text printer, one line per page

use crate::output::traits::{OutputResult, PagePrinter};
use crate::state::Page;
use chrono::SecondsFormat;

pub const RAW_FILE_NAME: &str = "output.txt";

/// Prints `address <- referrer (crawled_at)` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPrinter;

impl RawPrinter {
    fn format_line(page: &Page) -> String {
        format!(
            "{} <- {} ({})",
            page.address,
            page.referrer,
            page.crawled_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl PagePrinter for RawPrinter {
    fn render(&self, pages: &[Page]) -> OutputResult<String> {
        let mut out = String::new();
        for page in pages {
            out.push_str(&Self::format_line(page));
            out.push('\n');
        }
        Ok(out)
    }

    fn file_name(&self) -> &'static str {
        RAW_FILE_NAME
    }
}
