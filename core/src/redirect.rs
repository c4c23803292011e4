//! Redirect following.
//!
//! # Design
//! The classifier only reports *that* a redirect happened and where to. This
//! module turns that into the next request: `Location` is resolved against
//! the URL of the request that produced it, 307/308 replay the request
//! unchanged, every other redirect is rebuilt as a bodiless `GET`. The chain
//! is bounded by a `RedirectPolicy` (10 hops unless configured otherwise).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RequestOptions;
use crate::error::Error;
use crate::http::{Body, HttpMethod, HttpRequest};
use crate::request::build_request;

pub const DEFAULT_MAX_HOPS: usize = 10;

/// Upper bound on the number of redirects followed for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedirectPolicy {
    /// `None` follows chains of any length.
    max_hops: Option<usize>,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::limited(DEFAULT_MAX_HOPS)
    }
}

impl RedirectPolicy {
    pub fn limited(max_hops: usize) -> Self {
        Self {
            max_hops: Some(max_hops),
        }
    }

    /// Follow redirects without a hop limit. A server that redirects in a
    /// cycle will keep the call busy forever.
    pub fn unlimited() -> Self {
        Self { max_hops: None }
    }

    /// Fail on the first redirect.
    pub fn none() -> Self {
        Self::limited(0)
    }

    pub fn max_hops(&self) -> Option<usize> {
        self.max_hops
    }

    /// Check whether hop number `hops` (1-based) towards `url` is allowed.
    pub(crate) fn check(&self, hops: usize, url: &Url) -> Result<(), Error> {
        match self.max_hops {
            Some(max) if hops > max => Err(Error::TooManyRedirects {
                hops: hops - 1,
                url: url.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Where a 3xx response points and whether the method survives the hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: Url,
    pub preserve_method: bool,
}

impl Redirect {
    /// Build the follow-up for `previous`.
    pub fn follow(self, previous: HttpRequest, options: &RequestOptions) -> Result<HttpRequest, Error> {
        if self.preserve_method {
            return Ok(HttpRequest {
                url: self.location,
                ..previous
            });
        }
        build_request(HttpMethod::Get, self.location, Body::Empty, options)
    }
}

/// Whether `status` is a redirect the client follows, and if so whether the
/// original method and body are replayed.
pub fn redirect_kind(status: u16) -> Option<bool> {
    match status {
        300..=303 => Some(false),
        307 | 308 => Some(true),
        _ => None,
    }
}

/// Resolve a `Location` header value against the URL that returned it.
///
/// Handles absolute URLs, protocol-relative references, root-absolute and
/// relative paths (`..` removes one segment). The query of the current URL
/// never carries over; the target keeps a query only when `location` has one.
pub fn resolve_location(current: &Url, location: &str) -> Result<Url, url::ParseError> {
    let location = location.trim();
    let mut target = current.join(location)?;
    if !location.contains('?') {
        target.set_query(None);
    }
    Ok(target)
}
