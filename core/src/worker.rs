//! Shot loop glue: acquire -> shoot -> release
//!
//! A worker is the smallest schedulable unit above the provider/gun pair.
//! Each worker owns a private gun (guns are never shared across tasks),
//! holds a shared handle to the provider, and loops:
//!
//! 1. Acquire the next ammo item (blocks under backpressure)
//! 2. Shoot it at the target; the gun reports the sample
//! 3. Release the item's slot back to the pool
//! 4. Repeat until the supply drains or shutdown is signalled
//!
//! How many workers run, and at what rate, is the business of the scheduling
//! layer above this crate.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::traits::{Decoder, Gun};

/// One shot loop over a private gun.
pub struct Worker<D, G>
where
    D: Decoder,
    G: Gun<Payload = D::Payload>,
{
    id: usize,
    provider: Arc<Provider<D>>,
    gun: G,
}

impl<D, G> Worker<D, G>
where
    D: Decoder,
    G: Gun<Payload = D::Payload>,
{
    /// Create a worker over a bound gun.
    ///
    /// The gun's results sink must already be bound; the first shot panics
    /// otherwise, per the [`Gun`] contract.
    pub fn new(id: usize, provider: Arc<Provider<D>>, gun: G) -> Self {
        Self { id, provider, gun }
    }

    /// The worker ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the shot loop until the ammo supply drains or `shutdown` fires.
    ///
    /// Per-shot failures are counted and logged, never fatal: whether a
    /// failing target should stop the run is the scheduling layer's call.
    pub async fn run(mut self, shutdown: CancellationToken) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        tracing::debug!(worker_id = self.id, "worker started");

        loop {
            let acquired = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::debug!(worker_id = self.id, "worker received shutdown signal");
                    break;
                }
                acquired = self.provider.acquire() => acquired,
            };

            let Some(mut ammo) = acquired else {
                tracing::debug!(worker_id = self.id, "ammo supply drained, worker stopping");
                break;
            };

            match self.gun.shoot(&mut ammo).await {
                Ok(()) => stats.record_hit(),
                Err(error) => {
                    stats.record_miss();
                    tracing::warn!(
                        worker_id = self.id,
                        ammo_id = ammo.id(),
                        %error,
                        "shot failed"
                    );
                }
            }

            self.provider.release(ammo);
        }

        self.gun.close().await;
        stats.stop();

        tracing::debug!(
            worker_id = self.id,
            hits = stats.hits,
            misses = stats.misses,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "worker finished"
        );

        stats
    }
}

/// Statistics tracked by each worker.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Shots that completed without error.
    pub hits: usize,

    /// Shots that returned an error.
    pub misses: usize,

    /// Worker start time.
    pub started_at: Option<Instant>,

    /// Worker end time.
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time).
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time).
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Total shots fired (hits + misses).
    pub fn total_shots(&self) -> usize {
        self.hits + self.misses
    }

    /// Miss rate in the range 0.0 - 1.0; zero when nothing was fired.
    pub fn miss_rate(&self) -> f64 {
        if self.total_shots() == 0 {
            0.0
        } else {
            self.misses as f64 / self.total_shots() as f64
        }
    }

    /// Elapsed time since start; running total until stopped.
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Shots per second over the elapsed window.
    pub fn shots_per_second(&self) -> f64 {
        self.elapsed()
            .map(|elapsed| {
                let secs = elapsed.as_secs_f64();
                if secs > 0.0 {
                    self.total_shots() as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Record a successful shot.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a failed shot.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Fold another worker's counters into this one.
    pub fn merge(&mut self, other: &WorkerStats) {
        self.hits += other.hits;
        self.misses += other.misses;
    }
}
