//! Client configuration and layered request options.
//!
//! # Design
//! Options come in three layers: built-in defaults, the client's defaults and
//! the per-call overlay. [`RequestOptions::layered`] merges two layers with a
//! fixed rule (headers key by key, every other field replaced when the
//! overlay sets it), so the precedence never depends on how values were
//! constructed. Both types deserialize from camelCase config so hosts can
//! embed them in their own files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::{HeaderMap, ACCEPT, JSON_MEDIA_TYPE};
use crate::redirect::RedirectPolicy;

/// Per-client or per-call request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
    pub headers: HeaderMap,
    /// Forwarded to the transport; the pipeline never enforces it.
    #[serde(
        rename = "timeoutMs",
        with = "duration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    /// Opaque transport-specific fields, forwarded verbatim.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in bottom layer: `Accept: application/json`.
    pub fn defaults() -> Self {
        Self::new().header(ACCEPT, JSON_MEDIA_TYPE)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Merge `overlay` on top of `self` without touching either.
    pub fn layered(&self, overlay: &RequestOptions) -> RequestOptions {
        let mut merged = self.clone();
        merged.headers.extend(
            overlay
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        if overlay.timeout.is_some() {
            merged.timeout = overlay.timeout;
        }
        merged.extensions.extend(
            overlay
                .extensions
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        merged
    }
}

/// Everything needed to build a `JsonClient` apart from its transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub options: RequestOptions,
    #[serde(default)]
    pub redirects: RedirectPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            options: RequestOptions::default(),
            redirects: RedirectPolicy::default(),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_u64(duration.as_millis() as u64),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
