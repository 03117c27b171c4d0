use crate::url::scope::{is_excluded, is_in_scope};
use crate::url::Address;
use crate::{UrlError, UrlResult};
use std::collections::HashSet;
use url::Url;

/// Canonicalizes the raw links found on one page
///
/// # Canonicalization Steps
///
/// For each raw link, in order:
///
/// 1. Parse the text as an absolute, scheme-relative or relative reference;
///    reject the whole call if it is malformed or contains control characters
/// 2. Drop absolute links whose host differs from the base host
/// 3. Drop links whose path, as written, contains the `cdn-cgi` marker
/// 4. Strip the query string
/// 5. Resolve against `base` (RFC 3986 reference resolution)
/// 6. Append a trailing `/` to the path if missing
/// 7. Drop duplicates within this call
///
/// The output keeps first-seen order, but callers should only rely on set
/// semantics.
///
/// # Arguments
///
/// * `raw_links` - Candidate hrefs as found in the markup
/// * `base` - The address relative links are resolved against
///
/// # Returns
///
/// * `Ok(Vec<Address>)` - The distinct canonical addresses
/// * `Err(UrlError)` - One of the links could not be parsed
///
/// # Examples
///
/// ```
/// use sumi_crawl::url::{canonicalize, Address};
///
/// let base = Address::parse("https://example.com").unwrap();
/// let links = canonicalize(&["/signup", "https://example.com/signup/?ref=nav"], &base).unwrap();
///
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/signup/");
/// ```
pub fn canonicalize<S: AsRef<str>>(raw_links: &[S], base: &Address) -> UrlResult<Vec<Address>> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for raw in raw_links {
        let Some(address) = canonicalize_link(raw.as_ref(), base)? else {
            continue;
        };

        if seen.insert(address.clone()) {
            addresses.push(address);
        }
    }

    Ok(addresses)
}

/// Canonicalizes a single raw link
///
/// Returns `Ok(None)` when the link is out of scope or excluded.
pub fn canonicalize_link(raw: &str, base: &Address) -> UrlResult<Option<Address>> {
    let (mut url, absolute) = parse_link(raw, base)?;

    if !is_in_scope(&url, absolute, base) {
        tracing::trace!("Dropping out-of-scope link {}", raw);
        return Ok(None);
    }

    if is_excluded(unresolved_path(raw)) {
        tracing::trace!("Dropping excluded link {}", raw);
        return Ok(None);
    }

    url.set_query(None);

    if !url.cannot_be_a_base() && !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(Some(Address::from_url(url)))
}

/// The path of a raw link as written, before dot segments are resolved
fn unresolved_path(raw: &str) -> &str {
    let end = raw.find(|c| c == '?' || c == '#').unwrap_or(raw.len());
    let reference = &raw[..end];

    match reference.split_once("//") {
        Some((scheme, rest)) if scheme.is_empty() || is_scheme_prefix(scheme) => {
            rest.find('/').map_or("", |i| &rest[i..])
        }
        _ => reference,
    }
}

/// True for a `scheme:` prefix as in `scheme://authority`
fn is_scheme_prefix(s: &str) -> bool {
    s.strip_suffix(':').map_or(false, |scheme| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Parses a raw link, resolving relative references against the base
///
/// Returns the resolved URL and whether the link was written as an absolute
/// (or scheme-relative) reference.
fn parse_link(raw: &str, base: &Address) -> UrlResult<(Url, bool)> {
    if let Some(c) = raw.chars().find(|c| c.is_ascii_control()) {
        return Err(UrlError::Parse {
            raw: raw.to_string(),
            reason: format!("invalid control character {:?}", c),
        });
    }

    match Url::parse(raw) {
        Ok(url) => Ok((url, true)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let absolute = raw.starts_with("//");
            let url = base.as_url().join(raw).map_err(|e| UrlError::Parse {
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
            Ok((url, absolute))
        }
        Err(e) => Err(UrlError::Parse {
            raw: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Address {
        Address::parse("https://example.com").unwrap()
    }

    fn strings(addresses: &[Address]) -> Vec<&str> {
        let mut out: Vec<&str> = addresses.iter().map(|a| a.as_str()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_relative_gets_trailing_slash() {
        let result = canonicalize(&["/signup"], &base()).unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/signup/"]);
    }

    #[test]
    fn test_query_stripped() {
        let result = canonicalize(
            &[
                "https://example.com/test",
                "/signup",
                "https://example.com/test?name=jamie",
            ],
            &base(),
        )
        .unwrap();

        assert_eq!(
            strings(&result),
            vec!["https://example.com/signup/", "https://example.com/test/"]
        );
    }

    #[test]
    fn test_trailing_slash_folds_identity() {
        let result = canonicalize(&["/test", "/test/"], &base()).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_resolves_against_base_not_page() {
        let base = Address::parse("https://example.com/x").unwrap();
        let result = canonicalize(&["/signup", "other"], &base).unwrap();
        assert_eq!(
            strings(&result),
            vec!["https://example.com/other/", "https://example.com/signup/"]
        );
    }

    #[test]
    fn test_dot_segments_resolved() {
        let base = Address::parse("https://example.com/a/b/").unwrap();
        let result = canonicalize(&["../c", "./d"], &base).unwrap();
        assert_eq!(
            strings(&result),
            vec!["https://example.com/a/b/d/", "https://example.com/a/c/"]
        );
    }

    #[test]
    fn test_other_host_dropped() {
        let result = canonicalize(
            &["https://other.com/page", "//other.com/page", "/mine"],
            &base(),
        )
        .unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/mine/"]);
    }

    #[test]
    fn test_scheme_relative_same_host_kept() {
        let result = canonicalize(&["//example.com/page"], &base()).unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/page/"]);
    }

    #[test]
    fn test_special_schemes_dropped() {
        let result = canonicalize(
            &["mailto:someone@example.com", "javascript:void(0)", "tel:+123"],
            &base(),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_cdn_cgi_excluded() {
        let result = canonicalize(
            &[
                "/cdn-cgi/l/email-protection",
                "https://example.com/cdn-cgi/challenge",
                "/kept",
            ],
            &base(),
        )
        .unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/kept/"]);
    }

    #[test]
    fn test_cdn_cgi_checked_before_dot_segments() {
        let result = canonicalize(
            &[
                "/cdn-cgi/../x",
                "https://example.com/cdn-cgi/../y",
                "//example.com/a/cdn-cgi/./../z",
            ],
            &base(),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_cdn_cgi_in_query_or_fragment_kept() {
        let result = canonicalize(&["/a?next=/cdn-cgi/", "/b#cdn-cgi"], &base()).unwrap();
        assert_eq!(
            strings(&result),
            vec!["https://example.com/a/", "https://example.com/b/#cdn-cgi"]
        );
    }

    #[test]
    fn test_unresolved_path() {
        assert_eq!(unresolved_path("/cdn-cgi/../x?q=1"), "/cdn-cgi/../x");
        assert_eq!(unresolved_path("https://example.com/a/b#frag"), "/a/b");
        assert_eq!(unresolved_path("//example.com"), "");
        assert_eq!(unresolved_path("../up"), "../up");
        assert_eq!(unresolved_path("a//b"), "a//b");
    }

    #[test]
    fn test_control_character_fails_whole_call() {
        let result = canonicalize(&["\u{7f}", "/signup"], &base());
        assert!(matches!(result, Err(UrlError::Parse { .. })));

        let result = canonicalize(&["/sign\nup"], &base());
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_absolute_fails() {
        let result = canonicalize(&["http://[::1"], &base());
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicates_within_call() {
        let result = canonicalize(&["/a", "/a/", "/a?x=1", "https://example.com/a"], &base()).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_empty_and_query_only_resolve_to_base() {
        let base = Address::parse("https://example.com/docs/").unwrap();
        let result = canonicalize(&["", "?page=2"], &base).unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/docs/"]);
    }

    #[test]
    fn test_fragment_is_kept() {
        let result = canonicalize(&["/a#top"], &base()).unwrap();
        assert_eq!(strings(&result), vec!["https://example.com/a/#top"]);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "/signup",
            "https://example.com/test?name=jamie",
            "../up/./here",
            "/a%20b",
            "/a#frag",
            "",
            "//example.com/x/y",
        ];

        for raw in inputs {
            let once = canonicalize(&[raw], &base()).unwrap();
            let again = canonicalize(&once, &base()).unwrap();
            assert_eq!(once, again, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_output_has_no_query_and_trailing_slash() {
        let result = canonicalize(&["/p?x=1", "/q/?", "r?"], &base()).unwrap();
        for address in &result {
            assert_eq!(address.query(), None);
            assert!(address.path().ends_with('/'));
        }
    }
}
