//! Error types for the JSON client.
//!
//! # Design
//! Two layers. `ApiError` is the normalized failure of one HTTP exchange: a
//! fixed set of typed fields plus an `extra` map for whatever the server put
//! in its JSON error payload. `Error` wraps it together with the failures
//! that never reached a classified response (transport, construction,
//! redirect limit).

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::http::HttpMethod;

/// Error produced by a `Transport`, surfaced unchanged in [`Error::Transport`].
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `JsonClient`.
#[derive(Debug, Error)]
pub enum Error {
    /// The exchange completed but was classified as a failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Network-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The redirect chain exceeded the configured hop limit.
    #[error("too many redirects: gave up after {hops} hops at {url}")]
    TooManyRedirects { hops: usize, url: Url },

    /// The client was built without a transport.
    #[error("no transport configured")]
    MissingTransport,

    /// The base URL could not be used to resolve request paths.
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A request path could not be resolved against the base URL.
    #[error("cannot resolve `{path}` against the base URL: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// The string is not a usable HTTP method.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// A typed body could not be serialized or a typed result decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The structured error, if the failure came from a classified response.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of a classified failure.
    pub fn status_code(&self) -> Option<u16> {
        self.api().and_then(|err| err.status_code)
    }
}

/// Normalized failure of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message, `HTTP <code>: <phrase>` unless the server
    /// supplied one.
    pub message: String,
    /// Machine-readable code: `invalid_json`, a snake-cased reason phrase,
    /// or the server's own `code`.
    pub code: String,
    pub status_code: Option<u16>,
    /// Always holds `httpStatus`, `method`, `url` and the raw body as `data`.
    pub meta: Map<String, Value>,
    /// Fields merged from a JSON error payload carrying a string `code`.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

pub const INVALID_JSON: &str = "invalid_json";

impl ApiError {
    /// Build the error for a non-success status, applying the payload merge
    /// rule to `body`.
    pub fn from_status(status: u16, method: &HttpMethod, url: &Url, body: &str) -> Self {
        let phrase = reason_phrase(status);
        let mut err = Self {
            message: format!("HTTP {status}: {phrase}"),
            code: error_code(phrase),
            status_code: Some(status),
            meta: base_meta(status, method, url, body),
            extra: Map::new(),
        };
        err.absorb_payload(body);
        err
    }

    /// Build the error for a success status whose body is not valid JSON.
    pub fn invalid_json(
        status: u16,
        method: &HttpMethod,
        url: &Url,
        body: &str,
        cause: &serde_json::Error,
    ) -> Self {
        let mut meta = base_meta(status, method, url, body);
        meta.insert("reason".to_string(), Value::String(cause.to_string()));
        Self {
            message: "Invalid JSON".to_string(),
            code: INVALID_JSON.to_string(),
            status_code: Some(status),
            meta,
            extra: Map::new(),
        }
    }

    /// Look up a field the server supplied in its error payload.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Merge a JSON object carrying a string `code` onto the error; any
    /// other parseable body is kept under `meta.parsed`. Parse failures are
    /// swallowed, `meta.data` already holds the raw text.
    fn absorb_payload(&mut self, body: &str) {
        let parsed: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) => return,
        };

        match parsed {
            Value::Object(fields) if matches!(fields.get("code"), Some(Value::String(_))) => {
                for (key, value) in fields {
                    match value {
                        Value::String(code) if key == "code" => self.code = code,
                        Value::String(message) if key == "message" => self.message = message,
                        value => {
                            self.extra.insert(key, value);
                        }
                    }
                }
            }
            other => {
                self.meta.insert("parsed".to_string(), other);
            }
        }
    }
}

/// Standard reason phrase for `status`, `Unknown` when the table has none.
pub fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// `Not Found` -> `not_found`.
pub fn error_code(phrase: &str) -> String {
    phrase.to_lowercase().replace(' ', "_")
}

fn base_meta(status: u16, method: &HttpMethod, url: &Url, body: &str) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("httpStatus".to_string(), Value::from(status));
    meta.insert("method".to_string(), Value::String(method.to_string()));
    meta.insert("url".to_string(), Value::String(url.to_string()));
    meta.insert("data".to_string(), Value::String(body.to_string()));
    meta
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn url() -> Url {
        Url::parse("https://api.example.com/widgets").unwrap()
    }

    #[test]
    fn plain_text_body_keeps_phrase_code() {
        let err = ApiError::from_status(500, &HttpMethod::Get, &url(), "internal failure");
        assert_eq!(err.code, "internal_server_error");
        assert_eq!(err.message, "HTTP 500: Internal Server Error");
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.meta["data"], "internal failure");
        assert_eq!(err.meta["httpStatus"], 500);
        assert_eq!(err.meta["method"], "GET");
        assert_eq!(err.meta["url"], "https://api.example.com/widgets");
        assert!(err.extra.is_empty());
        assert!(err.meta.get("parsed").is_none());
    }

    #[test]
    fn payload_with_code_is_merged() {
        let body = r#"{"code":"validation_failed","message":"name is required","fields":["name"]}"#;
        let err = ApiError::from_status(422, &HttpMethod::Post, &url(), body);
        assert_eq!(err.code, "validation_failed");
        assert_eq!(err.message, "name is required");
        assert_eq!(err.field("fields"), Some(&json!(["name"])));
        assert_eq!(err.meta["data"], body);
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn payload_without_code_lands_in_meta() {
        let body = r#"{"error":"nope"}"#;
        let err = ApiError::from_status(403, &HttpMethod::Get, &url(), body);
        assert_eq!(err.code, "forbidden");
        assert_eq!(err.meta["parsed"], json!({ "error": "nope" }));
        assert_eq!(err.meta["data"], body);
        assert!(err.extra.is_empty());
    }

    #[test]
    fn array_payload_is_never_merged() {
        let body = r#"[{"code":"x"}]"#;
        let err = ApiError::from_status(400, &HttpMethod::Get, &url(), body);
        assert_eq!(err.code, "bad_request");
        assert_eq!(err.meta["parsed"], json!([{ "code": "x" }]));
    }

    #[test]
    fn non_string_code_is_not_merged() {
        let body = r#"{"code":42}"#;
        let err = ApiError::from_status(404, &HttpMethod::Get, &url(), body);
        assert_eq!(err.code, "not_found");
        assert!(err.extra.is_empty());
    }

    #[test]
    fn unknown_status_uses_unknown_phrase() {
        assert_eq!(reason_phrase(599), "Unknown");
        let err = ApiError::from_status(599, &HttpMethod::Get, &url(), "");
        assert_eq!(err.code, "unknown");
        assert_eq!(err.message, "HTTP 599: Unknown");
    }

    #[test]
    fn error_code_snake_cases_phrase() {
        assert_eq!(error_code("Not Found"), "not_found");
        assert_eq!(error_code("Unprocessable Entity"), "unprocessable_entity");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let err = ApiError::from_status(404, &HttpMethod::Get, &url(), "");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["code"], "not_found");
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn error_exposes_api_status() {
        let err = Error::from(ApiError::from_status(502, &HttpMethod::Get, &url(), ""));
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
        assert!(Error::MissingTransport.api().is_none());
    }
}
