//! Error types for the ammo pipeline

use thiserror::Error;

/// Errors surfaced by a [`Decoder`](crate::traits::Decoder).
///
/// The two limit variants are stopping sentinels, not failures: the provider
/// classifies them as successful completion of the run. Everything else is
/// fatal to the decode loop.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Configured total-ammo limit reached.
    #[error("ammo limit reached")]
    AmmoLimit,

    /// Configured pass-over-the-source limit reached.
    #[error("pass limit reached")]
    PassLimit,

    /// The payload source could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload source produced data the decoder cannot parse.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The underlying payload resource failed to close.
    #[error("close failed: {0}")]
    Close(String),
}

impl DecodeError {
    /// True for the stopping sentinels that mean "finished as configured".
    pub fn is_limit(&self) -> bool {
        matches!(self, DecodeError::AmmoLimit | DecodeError::PassLimit)
    }
}

/// Errors returned by [`Provider::run`](crate::provider::Provider::run).
///
/// A plain cancellation is requested shutdown, not a failure, and never
/// appears here: `run` returns `Ok(())` for it.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The decoder failed with something other than a limit sentinel.
    #[error("decoding ammo: {0}")]
    Decode(#[source] DecodeError),

    /// The run deadline expired while the loop was still working.
    #[error("error from context: deadline exceeded after {elapsed:?}")]
    DeadlineExceeded {
        /// How long the loop had been running when the deadline fired.
        elapsed: std::time::Duration,
    },

    /// Closing the decoder's underlying resource failed.
    #[error("closing decoder: {0}")]
    CloseFailed(#[source] DecodeError),

    /// Both the decode loop and the decoder close failed.
    ///
    /// Neither cause replaces the other; both stay observable.
    #[error("multiple errors faced: {run}, {close}")]
    Shutdown {
        /// Error the decode loop terminated with.
        run: Box<ProviderError>,
        /// Error from closing the decoder resource.
        close: Box<ProviderError>,
    },

    /// `run` was invoked a second time on the same provider.
    #[error("provider run already started")]
    AlreadyRan,
}

/// Errors returned by [`Gun::shoot`](crate::traits::Gun::shoot).
///
/// Every failure of a measured shot also lands, stringified, in the error
/// field of the emitted [`Sample`](crate::sample::Sample); the returned error
/// and the sample describe the same failure.
#[derive(Debug, Error)]
pub enum ShootError {
    /// The optional connect hook failed.
    #[error("connect: {0}")]
    Connect(String),

    /// Issuing the request against the target failed.
    #[error("issuing request: {0}")]
    Issue(String),

    /// The response body could not be drained to completion.
    #[error("reading response body: {0}")]
    BodyRead(String),

    /// The ammo item carried no payload.
    #[error("ammo has no payload")]
    NoPayload,
}
