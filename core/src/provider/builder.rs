//! Builder pattern for Provider construction

use std::time::Duration;

use crate::config::{ConfigError, ProviderConfig};
use crate::traits::Decoder;

use super::executor::Provider;

/// Builder for creating [`Provider`] instances with validated configuration.
///
/// # Example
/// ```ignore
/// let provider = ProviderBuilder::new()
///     .decoder(decoder)
///     .chosen_cases(["checkout", "browse"])
///     .sink_capacity(64)
///     .build()?;
/// ```
pub struct ProviderBuilder<D: Decoder> {
    config: ProviderConfig,
    decoder: Option<D>,
}

impl<D: Decoder> Default for ProviderBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Decoder> ProviderBuilder<D> {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::default(),
            decoder: None,
        }
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the decoder feeding this provider.
    pub fn decoder(mut self, decoder: D) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Restrict dispatch to the given tags.
    pub fn chosen_cases<I, S>(mut self, cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_chosen_cases(cases);
        self
    }

    /// Set the dispatch channel capacity.
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.config.sink_capacity = capacity;
        self
    }

    /// Set the ammo pool capacity.
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Set the run deadline.
    pub fn run_deadline(mut self, deadline: Duration) -> Self {
        self.config.run_deadline = Some(deadline);
        self
    }

    /// Build the provider.
    ///
    /// # Errors
    /// Returns an error when the decoder is missing or the configuration is
    /// invalid.
    pub fn build(self) -> Result<Provider<D>, ConfigError> {
        let decoder = self.decoder.ok_or(ConfigError::MissingField("decoder"))?;
        self.config.validate()?;
        Ok(Provider::new(self.config, decoder))
    }
}
