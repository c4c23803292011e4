//! Minimal JSON-over-HTTP client.
//!
//! # Overview
//! Given a base URL, `JsonClient` issues requests, serializes JSON bodies,
//! parses JSON responses and normalizes every HTTP outcome into one
//! contract: `Ok(Some(value))`, `Ok(None)` for empty success responses, or
//! an `Error` carrying a structured `ApiError`. It is meant as a building
//! block for libraries that talk to JSON REST APIs.
//!
//! # Design
//! - The network sits behind the `Transport` trait. A reqwest backend ships
//!   behind the default `reqwest` feature; anything else can be plugged in.
//! - Each stage is a plain function over plain data: `resolve_url`,
//!   `build_request`, `classify`, `resolve_location`. `JsonClient` only
//!   sequences them and loops on redirects.
//! - Redirect chains are bounded by `RedirectPolicy` (10 hops by default).
//!
//! ```no_run
//! use json_client::{Body, HttpMethod, JsonClient};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), json_client::Error> {
//! let client = JsonClient::new("https://api.example.com/v1")?;
//! let params = json!({ "verbose": true });
//! let widget = client
//!     .request(HttpMethod::Get, "widgets/1", params.as_object(), Body::Empty, None)
//!     .await?;
//! println!("{widget:?}");
//! client.post("widgets", json!({ "name": "gear" })).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod redirect;
pub mod request;
pub mod resolve;
pub mod transport;

#[cfg(feature = "reqwest")]
pub use backends::ReqwestTransport;
pub use classify::{classify, Outcome};
pub use client::{JsonClient, JsonClientBuilder};
pub use config::{ClientConfig, RequestOptions};
pub use error::{ApiError, Error, TransportError};
pub use http::{Body, HeaderMap, HttpMethod, HttpRequest, HttpResponse, Params};
pub use redirect::{resolve_location, Redirect, RedirectPolicy};
pub use request::build_request;
pub use resolve::{encode_query, normalize_base, resolve_url};
pub use transport::Transport;
