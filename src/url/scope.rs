use crate::url::Address;
use url::Url;

/// Path marker of the CDN protection endpoints (`/cdn-cgi/...`)
///
/// These are infrastructure pages injected by the CDN, not site content, and
/// fetching them usually trips the bot challenge.
pub const EXCLUDED_PATH_MARKER: &str = "cdn-cgi";

/// Checks whether a link stays on the crawl's host
///
/// Relative links are always in scope since they resolve against the base.
/// Absolute links (including scheme-relative `//host/...` references) are
/// in scope only when their host matches the base host; the port is not
/// part of the comparison.
///
/// # Examples
///
/// ```
/// use sumi_crawl::url::{is_in_scope, Address};
/// use url::Url;
///
/// let base = Address::parse("https://example.com/").unwrap();
///
/// let same = Url::parse("https://example.com/about").unwrap();
/// assert!(is_in_scope(&same, true, &base));
///
/// let other = Url::parse("https://other.com/about").unwrap();
/// assert!(!is_in_scope(&other, true, &base));
/// ```
pub fn is_in_scope(link: &Url, absolute: bool, base: &Address) -> bool {
    !absolute || link.host_str() == base.host()
}

/// Returns true if the path points at an excluded infrastructure endpoint
pub fn is_excluded(path: &str) -> bool {
    path.contains(EXCLUDED_PATH_MARKER)
}
