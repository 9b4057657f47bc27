//! volley-core: ammo supply and shot execution for the volley load generator
//!
//! This crate is the backpressure-aware heart of the engine. It turns a
//! stream of decoded test payloads ("ammo") into a steady supply for a pool
//! of concurrent workers ("guns") that fire requests at a target and report
//! one timing/outcome sample per shot:
//!
//! ```text
//! Decoder -> Provider (filter + pool) -> dispatch channel -> Gun -> samples
//!                 ^                                           |
//!                 '------------- release (pool reuse) --------'
//! ```
//!
//! It provides:
//!
//! - Pipeline data types ([`Ammo`], [`Sample`]) and the reusable-slot
//!   [`AmmoPool`]
//! - The seam traits protocol crates implement ([`Decoder`], [`Gun`])
//! - The [`Provider`] decode-dispatch loop with deterministic shutdown
//! - The [`Worker`] shot loop and its stats
//!
//! Payload formats, rate limiting, and sample aggregation live outside this
//! crate; they meet it only at the trait boundaries above.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ammo;
pub mod config;
pub mod error;
pub mod pool;
pub mod provider;
pub mod sample;
pub mod traits;
pub mod worker;

pub use ammo::Ammo;
pub use config::{is_chosen_case, ConfigError, ProviderConfig};
pub use error::{DecodeError, ProviderError, ShootError};
pub use pool::AmmoPool;
pub use provider::{Provider, ProviderBuilder};
pub use sample::Sample;
pub use traits::{Decoder, Gun};
pub use worker::{Worker, WorkerStats};
