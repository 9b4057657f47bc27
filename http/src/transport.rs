//! Transport seam between the gun and the wire

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use reqwest::Client;
use thiserror::Error;

use crate::request::HttpRequest;

/// Errors from issuing a request or reading its response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client-level failure: connect, TLS, protocol, or body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request descriptor could not be turned into a real request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Response handed back to the gun: the status line plus a body stream the
/// gun is expected to drain to completion.
pub struct TargetResponse {
    /// Protocol status code.
    pub status: u16,

    /// Response body chunks.
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

impl std::fmt::Debug for TargetResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Issues one request descriptor against the target.
///
/// This is the gun's only seam to the wire, which keeps shot bookkeeping
/// testable without a live target. Implementations are used by exactly one
/// gun at a time and need no internal synchronization.
#[async_trait]
pub trait Transport: Send {
    /// Send `req` and return the status plus body stream.
    async fn send(&mut self, req: HttpRequest) -> Result<TargetResponse, TransportError>;
}

/// Production transport over a shared `reqwest` client.
///
/// Cloning is cheap and shares the underlying connection pool, so per-worker
/// transports still reuse connections across the whole run.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Transport over a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over an already-tuned client (timeouts, proxies, TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, desc: HttpRequest) -> Result<reqwest::Request, TransportError> {
        let method = reqwest::Method::from_bytes(desc.method.as_bytes()).map_err(|_| {
            TransportError::InvalidRequest(format!("bad method: {:?}", desc.method))
        })?;
        let url = reqwest::Url::parse(&desc.url)
            .map_err(|err| TransportError::InvalidRequest(format!("bad url {:?}: {err}", desc.url)))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &desc.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = desc.body {
            builder = builder.body(body);
        }
        builder
            .build()
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&mut self, req: HttpRequest) -> Result<TargetResponse, TransportError> {
        let req = self.build(req)?;
        let res = self.client.execute(req).await?;
        let status = res.status().as_u16();
        let body = Box::pin(res.bytes_stream().map_err(TransportError::from));

        Ok(TargetResponse { status, body })
    }
}
