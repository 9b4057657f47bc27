//! Provider configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an ammo provider.
///
/// Defines which decoded cases are dispatched, how much buffering the
/// pipeline carries, and an optional wall-clock budget for the decode loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Tags allowed through to dispatch. Empty means every tag passes.
    #[serde(default)]
    pub chosen_cases: Vec<String>,

    /// Dispatch channel capacity; the pipeline's sole backpressure knob.
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,

    /// Free-list capacity of the ammo pool.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Optional wall-clock budget for the whole decode loop.
    ///
    /// Expiry is surfaced as
    /// [`ProviderError::DeadlineExceeded`](crate::error::ProviderError::DeadlineExceeded);
    /// a plain cancellation, by contrast, is not an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_deadline: Option<Duration>,
}

fn default_sink_capacity() -> usize {
    128
}

fn default_pool_capacity() -> usize {
    128
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chosen_cases: Vec::new(),
            sink_capacity: default_sink_capacity(),
            pool_capacity: default_pool_capacity(),
            run_deadline: None,
        }
    }
}

impl ProviderConfig {
    /// Restrict dispatch to the given tags.
    pub fn with_chosen_cases<I, S>(mut self, cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chosen_cases = cases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the dispatch channel capacity.
    pub fn with_sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    /// Set the ammo pool capacity.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Set the run deadline.
    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = Some(deadline);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sink_capacity == 0 {
            return Err(ConfigError::InvalidSinkCapacity(
                "sink capacity must be at least 1".into(),
            ));
        }
        if self.pool_capacity == 0 {
            return Err(ConfigError::InvalidPoolCapacity(
                "pool capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Whether `tag` passes the configured case selection.
///
/// An empty selection admits every tag.
pub fn is_chosen_case(tag: &str, chosen: &[String]) -> bool {
    chosen.is_empty() || chosen.iter().any(|case| case == tag)
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The dispatch channel cannot be unbuffered.
    #[error("invalid sink capacity: {0}")]
    InvalidSinkCapacity(String),

    /// The ammo pool cannot hold zero slots.
    #[error("invalid pool capacity: {0}")]
    InvalidPoolCapacity(String),

    /// A required builder field was never set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
