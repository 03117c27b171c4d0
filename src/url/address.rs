use crate::{UrlError, UrlResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// An absolute, parsed crawl address
///
/// `Address` wraps a [`Url`] and is the key type of the dedup store. Two
/// addresses are equal when every URL component is equal, so callers that
/// want one identity per page must pass addresses through
/// [`canonicalize`](crate::url::canonicalize) first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Url);

impl Address {
    /// Parses an absolute address with a host
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_crawl::url::Address;
    ///
    /// let address = Address::parse("https://example.com/docs/").unwrap();
    /// assert_eq!(address.host(), Some("example.com"));
    /// assert_eq!(address.path(), "/docs/");
    ///
    /// assert!(Address::parse("/relative").is_err());
    /// ```
    pub fn parse(input: &str) -> UrlResult<Self> {
        let url = Url::parse(input).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => UrlError::NotAbsolute(input.to_string()),
            other => UrlError::Parse {
                raw: input.to_string(),
                reason: other.to_string(),
            },
        })?;

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost(input.to_string()));
        }

        Ok(Self(url))
    }

    pub(crate) fn from_url(url: Url) -> Self {
        Self(url)
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Host without the port
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.0.port()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.0.fragment()
    }

    /// True for addresses without a hierarchical path, such as `mailto:`
    pub fn is_opaque(&self) -> bool {
        self.0.cannot_be_a_base()
    }

    /// True when the address carries a `?` with nothing after it
    pub fn force_query(&self) -> bool {
        self.0.query() == Some("")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for Address {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
