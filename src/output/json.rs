//! JSON printer
//!
//! Each page is written as `{ url, referrer, crawledAt }` with both addresses
//! broken down into their components. `path` and `fragment` are
//! percent-decoded; `rawPath` and `rawFragment` carry the encoded form only
//! when it differs from the decoded one.

use crate::output::traits::{OutputResult, PagePrinter};
use crate::state::Page;
use crate::url::Address;
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::borrow::Cow;

pub const JSON_FILE_NAME: &str = "output.json";

/// Serialized form of an address
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressView<'a> {
    scheme: &'a str,
    opaque: &'a str,
    host: String,
    path: Cow<'a, str>,
    raw_path: &'a str,
    force_query: bool,
    raw_query: &'a str,
    fragment: Cow<'a, str>,
    raw_fragment: &'a str,
}

/// Splits an encoded component into its decoded form and, if the two differ,
/// the encoded original
fn decode(encoded: &str) -> (Cow<'_, str>, &str) {
    let decoded = percent_decode_str(encoded).decode_utf8_lossy();
    let raw = if decoded == encoded { "" } else { encoded };
    (decoded, raw)
}

impl<'a> From<&'a Address> for AddressView<'a> {
    fn from(address: &'a Address) -> Self {
        let host = match (address.host(), address.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        let (opaque, path) = if address.is_opaque() {
            (address.path(), "")
        } else {
            ("", address.path())
        };

        let (path, raw_path) = decode(path);
        let (fragment, raw_fragment) = decode(address.fragment().unwrap_or(""));

        Self {
            scheme: address.scheme(),
            opaque,
            host,
            path,
            raw_path,
            force_query: address.force_query(),
            raw_query: address.query().unwrap_or(""),
            fragment,
            raw_fragment,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView<'a> {
    url: AddressView<'a>,
    referrer: AddressView<'a>,
    crawled_at: DateTime<Utc>,
}

impl<'a> From<&'a Page> for PageView<'a> {
    fn from(page: &'a Page) -> Self {
        Self {
            url: AddressView::from(&page.address),
            referrer: AddressView::from(&page.referrer),
            crawled_at: page.crawled_at,
        }
    }
}

/// Prints pages as a pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPrinter;

impl PagePrinter for JsonPrinter {
    fn render(&self, pages: &[Page]) -> OutputResult<String> {
        let views: Vec<PageView<'_>> = pages.iter().map(PageView::from).collect();
        Ok(serde_json::to_string_pretty(&views)?)
    }

    fn file_name(&self) -> &'static str {
        JSON_FILE_NAME
    }
}
