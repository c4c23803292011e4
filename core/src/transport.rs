//! The transport seam: the only place the pipeline touches the network.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

pub use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one prepared request.
///
/// Implementations must not follow redirects themselves and must return
/// every status code as data; only network-level failures (DNS, refused
/// connections, TLS) are errors.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}
