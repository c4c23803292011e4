//! HTTP transport types for the request pipeline.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds `HttpRequest`
//! values and classifies `HttpResponse` values; a `Transport` (or the host
//! itself, via `JsonClient::prepare` / `JsonClient::classify`) moves them
//! over the network. Keeping the descriptors owned and I/O-free makes every
//! stage testable without a socket.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::Error;

/// Header mapping for outgoing requests.
///
/// Keys are compared by exact string identity: inserting an identical key
/// replaces the previous value, differently-cased keys coexist.
pub type HeaderMap = BTreeMap<String, String>;

/// Query parameters, serialized by [`crate::resolve::encode_query`].
pub type Params = Map<String, Value>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const ACCEPT: &str = "Accept";
pub const LOCATION: &str = "Location";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// HTTP method for a request.
///
/// Parsing is case-insensitive; unknown verbs are kept (upper-cased) in
/// `Other` so hosts can speak to APIs with custom methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let verb = s.trim().to_ascii_uppercase();
        let method = match verb.as_str() {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            "" => return Err(Error::InvalidMethod(s.to_string())),
            _ if verb.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') => {
                HttpMethod::Other(verb)
            }
            _ => return Err(Error::InvalidMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// Request body handed to the request builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Pre-serialized text, sent as-is without a `Content-Type`.
    Text(String),
    /// Structured value, serialized to JSON. `Value::Null` means no body.
    Json(Value),
}

impl Body {
    /// Convert any serializable value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// A fully prepared HTTP request.
///
/// Built by the request builder; the transport is responsible for executing
/// it and returning the corresponding `HttpResponse`. `timeout` and
/// `extensions` are passthrough fields the pipeline never interprets.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    pub extensions: Map<String, Value>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` (or by the host) after executing an
/// `HttpRequest`, then passed to the response classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
