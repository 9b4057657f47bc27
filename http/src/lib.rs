//! volley-http: HTTP gun and transport for the volley load generator
//!
//! This crate gives the pipeline in `volley-core` an HTTP-shaped end:
//!
//! - [`HttpRequest`]: the plain-data request descriptor carried as ammo
//!   payload
//! - [`Transport`]: the single seam between shot bookkeeping and the wire,
//!   with [`ReqwestTransport`] as the production implementation
//! - [`HttpGun`]: the per-worker [`Gun`](volley_core::Gun) that fires one
//!   descriptor, drains the response, and reports one sample
//!
//! Decoders producing `HttpRequest` payloads plug into the provider from
//! `volley-core` unchanged; see the integration tests for a full pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gun;
pub mod request;
pub mod transport;

pub use gun::{ConnectFn, HttpGun};
pub use request::HttpRequest;
pub use transport::{ReqwestTransport, TargetResponse, Transport, TransportError};
