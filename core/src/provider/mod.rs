//! Ammo provider: decode, filter, pool, dispatch
//!
//! The Provider runs the single decode-dispatch loop at the head of the
//! pipeline:
//!
//! 1. Scans the decoder for the next (payload, tag) pair
//! 2. Discards items whose tag is outside the chosen cases (before any pool
//!    interaction, so filtered items cost no pool churn)
//! 3. Resets a pooled slot with the fresh payload and tag
//! 4. Pushes it into the bounded dispatch channel, racing the push against
//!    cancellation and the optional run deadline
//! 5. Classifies decoder exhaustion: limit sentinels are success, anything
//!    else is fatal
//! 6. Closes the decoder exactly once on exit, combining a close failure
//!    with any pending loop error
//!
//! Workers obtain items through `acquire` (which stamps hand-off identifiers)
//! and retire them through `release` (which clears the payload and parks the
//! slot back in the pool).
//!
//! # Example
//!
//! ```ignore
//! use volley_core::provider::ProviderBuilder;
//!
//! let provider = Arc::new(
//!     ProviderBuilder::new()
//!         .decoder(decoder)
//!         .chosen_cases(["checkout"])
//!         .build()?,
//! );
//!
//! let run = tokio::spawn({
//!     let provider = Arc::clone(&provider);
//!     async move { provider.run(cancel).await }
//! });
//!
//! while let Some(ammo) = provider.acquire().await {
//!     // fire, then:
//!     provider.release(ammo);
//! }
//! run.await??;
//! ```

mod builder;
mod executor;

pub use builder::ProviderBuilder;
pub use executor::Provider;

#[cfg(test)]
mod tests;
