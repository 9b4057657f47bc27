//! Contracts at the pipeline's seams
//!
//! Decoders feed the pipeline and guns drain it; both are defined here so
//! protocol crates can implement them without depending on each other.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ammo::Ammo;
use crate::error::{DecodeError, ShootError};
use crate::sample::Sample;

/// A stateful cursor over a payload source.
///
/// The provider owns the only reference for the duration of its run: it
/// invokes [`scan`](Decoder::scan) repeatedly and [`close`](Decoder::close)
/// exactly once at shutdown, and never mutates decoder internals beyond
/// those two calls.
#[async_trait]
pub trait Decoder: Send {
    /// Protocol-specific payload this decoder produces.
    type Payload: Send;

    /// Advance to the next decoded item.
    ///
    /// Returns `Ok(Some((payload, tag)))` for one item, `Ok(None)` at a pass
    /// boundary (the provider re-checks cancellation and scans again), and
    /// `Err` on exhaustion or failure. [`DecodeError::AmmoLimit`] and
    /// [`DecodeError::PassLimit`] are stopping sentinels the provider treats
    /// as successful completion; any other error is fatal to the run.
    ///
    /// # Cancel safety
    ///
    /// The provider races `scan` against its cancellation signal, so the
    /// returned future may be dropped before completion. An implementation
    /// must not lose or corrupt source state when that happens; it will only
    /// ever see [`close`](Decoder::close) afterwards.
    async fn scan(&mut self) -> Result<Option<(Self::Payload, String)>, DecodeError>;

    /// Release the underlying payload resource.
    ///
    /// Invoked exactly once by the provider, on every run exit path. A
    /// failure here is combined with any pending loop error rather than
    /// replacing it.
    async fn close(&mut self) -> Result<(), DecodeError>;
}

/// Per-worker executor: fires one ammo item at the target and reports one
/// sample.
///
/// A gun instance has a strict two-phase lifecycle: bind the results sink
/// exactly once, then shoot any number of times. Shots on one instance are
/// strictly sequential; a gun is never shared across tasks, so
/// implementations need no internal locking.
#[async_trait]
pub trait Gun: Send {
    /// Payload type this gun can fire.
    type Payload: Send;

    /// One-time wiring of the outgoing sample destination.
    ///
    /// # Panics
    ///
    /// Panics when called a second time. A double bind is a wiring bug in
    /// the surrounding scheduler, not a recoverable runtime condition.
    fn bind_results(&mut self, results: mpsc::Sender<Sample>);

    /// Execute one unit of work against the target.
    ///
    /// Emits exactly one sample to the bound sink per measured shot, on
    /// success and failure alike. Failures populate both the sample's error
    /// field and the returned error. Implementations may support a connect
    /// hook that performs connection setup in place of a measured shot; no
    /// sample is emitted on that path.
    ///
    /// # Panics
    ///
    /// Panics when invoked before [`bind_results`](Gun::bind_results).
    async fn shoot(&mut self, ammo: &mut Ammo<Self::Payload>) -> Result<(), ShootError>;

    /// Release gun-held resources at teardown. Safe to call once; the
    /// default does nothing.
    async fn close(&mut self) {}
}
