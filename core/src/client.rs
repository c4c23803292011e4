//! JSON client: binds a base URL, default options and a transport into a
//! reusable request function.
//!
//! # Design
//! `JsonClient` holds read-only configuration behind an `Arc`, so clones are
//! cheap and concurrent calls share nothing mutable. Each call runs the
//! pipeline resolve -> build -> send -> classify, looping through the
//! redirect follower on 3xx. The first two and the last stage are also
//! exposed on their own (`prepare`, `classify`) for hosts that execute the
//! HTTP round-trip themselves.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::classify::{self, Outcome};
use crate::config::{ClientConfig, RequestOptions};
use crate::error::Error;
use crate::http::{Body, HttpMethod, HttpRequest, HttpResponse, Params};
use crate::redirect::RedirectPolicy;
use crate::request::build_request;
use crate::resolve::{normalize_base, resolve_url};
use crate::transport::Transport;

#[derive(Debug)]
struct Inner {
    base_url: Url,
    /// Built-in defaults already layered under the client's own options.
    options: RequestOptions,
    redirects: RedirectPolicy,
    transport: Arc<dyn Transport>,
}

/// Reusable JSON-over-HTTP client.
#[derive(Debug, Clone)]
pub struct JsonClient {
    inner: Arc<Inner>,
}

impl JsonClient {
    /// Start building a client for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> JsonClientBuilder {
        JsonClientBuilder::new(base_url)
    }

    /// Client for `base_url` using the bundled reqwest transport.
    #[cfg(feature = "reqwest")]
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let transport = crate::backends::ReqwestTransport::new().map_err(Error::Transport)?;
        Self::builder(base_url).transport(transport).build()
    }

    /// Client from deserialized configuration.
    pub fn from_config(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self, Error> {
        JsonClientBuilder {
            base_url: config.base_url,
            options: config.options,
            redirects: config.redirects,
            transport: Some(Arc::new(transport)),
        }
        .build()
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Issue a request and return the parsed JSON body, `None` for an
    /// empty success response.
    ///
    /// `path` is resolved against the base URL, `params` become the query
    /// string and `options` layer over the client's defaults for this call
    /// only.
    #[instrument(skip_all, fields(method = %method, path = path))]
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Params>,
        body: Body,
        options: Option<&RequestOptions>,
    ) -> Result<Option<Value>, Error> {
        let options = self.call_options(options);
        let url = resolve_url(&self.inner.base_url, path, params)?;
        let mut request = build_request(method, url, body, &options)?;
        let mut hops = 0;

        loop {
            let response = self
                .inner
                .transport
                .send(&request)
                .await
                .map_err(Error::Transport)?;
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                "response received"
            );

            match classify::classify(&request, &response) {
                Outcome::Success(value) => return Ok(value),
                Outcome::Failure(err) => return Err(Error::Api(err)),
                Outcome::Redirect(redirect) => {
                    hops += 1;
                    self.inner.redirects.check(hops, &redirect.location)?;
                    tracing::debug!(
                        hop = hops,
                        location = %redirect.location,
                        preserve_method = redirect.preserve_method,
                        "following redirect"
                    );
                    request = redirect.follow(request, &options)?;
                }
            }
        }
    }

    /// Like [`JsonClient::request`], deserializing the result into `R`.
    /// Absent content deserializes from `null`, so `R = Option<T>` accepts
    /// empty responses.
    pub async fn request_as<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Params>,
        body: Body,
        options: Option<&RequestOptions>,
    ) -> Result<R, Error> {
        let value = self
            .request(method, path, params, body, options)
            .await?
            .unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get(&self, path: &str, params: Option<&Params>) -> Result<Option<Value>, Error> {
        self.request(HttpMethod::Get, path, params, Body::Empty, None).await
    }

    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Result<Option<Value>, Error> {
        self.request(HttpMethod::Post, path, None, body.into(), None).await
    }

    pub async fn put(&self, path: &str, body: impl Into<Body>) -> Result<Option<Value>, Error> {
        self.request(HttpMethod::Put, path, None, body.into(), None).await
    }

    pub async fn patch(&self, path: &str, body: impl Into<Body>) -> Result<Option<Value>, Error> {
        self.request(HttpMethod::Patch, path, None, body.into(), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, Error> {
        self.request(HttpMethod::Delete, path, None, Body::Empty, None).await
    }

    /// Build the request `request` would send first, without sending it.
    pub fn prepare(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&Params>,
        body: Body,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, Error> {
        let options = self.call_options(options);
        let url = resolve_url(&self.inner.base_url, path, params)?;
        build_request(method, url, body, &options)
    }

    /// Classify a response the host fetched for `request`.
    pub fn classify(&self, request: &HttpRequest, response: &HttpResponse) -> Outcome {
        classify::classify(request, response)
    }

    fn call_options(&self, overlay: Option<&RequestOptions>) -> RequestOptions {
        match overlay {
            Some(overlay) => self.inner.options.layered(overlay),
            None => self.inner.options.clone(),
        }
    }
}

/// Builder for [`JsonClient`].
#[derive(Debug)]
pub struct JsonClientBuilder {
    base_url: String,
    options: RequestOptions,
    redirects: RedirectPolicy,
    transport: Option<Arc<dyn Transport>>,
}

impl JsonClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            options: RequestOptions::default(),
            redirects: RedirectPolicy::default(),
            transport: None,
        }
    }

    /// Default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.header(name, value);
        self
    }

    /// Client-wide options, layered over the built-in defaults.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn redirects(mut self, policy: RedirectPolicy) -> Self {
        self.redirects = policy;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share one transport between several clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<JsonClient, Error> {
        let transport = self.transport.ok_or(Error::MissingTransport)?;
        let base_url = normalize_base(&self.base_url)?;
        let options = RequestOptions::defaults().layered(&self.options);

        Ok(JsonClient {
            inner: Arc::new(Inner {
                base_url,
                options,
                redirects: self.redirects,
                transport,
            }),
        })
    }
}
