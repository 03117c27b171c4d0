//! Page records produced by a crawl run
//!
//! A page is created once per distinct canonical address, at the moment the
//! address is admitted into the dedup store, and never changes afterwards.

use crate::url::Address;
use chrono::{DateTime, Utc};

/// One successfully admitted, in-scope resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Canonical address of the page
    pub address: Address,

    /// Address of the page the link was found on
    pub referrer: Address,

    /// When the page was admitted
    pub crawled_at: DateTime<Utc>,
}

impl Page {
    /// Creates a page admitted now
    pub fn new(address: Address, referrer: Address) -> Self {
        Self::with_timestamp(address, referrer, Utc::now())
    }

    pub fn with_timestamp(address: Address, referrer: Address, crawled_at: DateTime<Utc>) -> Self {
        Self {
            address,
            referrer,
            crawled_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn address(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_new_sets_timestamp() {
        let before = Utc::now();
        let page = Page::new(address("https://example.com/a/"), address("https://example.com/"));
        assert!(page.crawled_at >= before);
        assert!(page.crawled_at <= Utc::now());
    }

    #[test]
    fn test_with_timestamp() {
        let at = Utc.with_ymd_and_hms(2021, 6, 10, 16, 0, 0).unwrap();
        let page = Page::with_timestamp(
            address("https://example.com/test/"),
            address("https://example.com/"),
            at,
        );
        assert_eq!(page.crawled_at, at);
    }
}
