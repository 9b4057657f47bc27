//! The decode-dispatch loop and the acquire/release surface

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::ammo::Ammo;
use crate::config::{is_chosen_case, ProviderConfig};
use crate::error::ProviderError;
use crate::pool::AmmoPool;
use crate::traits::Decoder;

/// Owns the decoder, the ammo pool, and the bounded dispatch channel, and
/// runs the decode-dispatch loop that couples them.
///
/// The dispatch channel is the pipeline's sole backpressure mechanism: the
/// loop blocks when workers fall behind, and workers block in
/// [`acquire`](Provider::acquire) when the loop falls behind. Both blocking
/// points double as cancellation points.
pub struct Provider<D: Decoder> {
    config: ProviderConfig,
    decoder: Mutex<D>,
    pool: AmmoPool<D::Payload>,
    sink_tx: Mutex<Option<mpsc::Sender<Box<Ammo<D::Payload>>>>>,
    sink_rx: Mutex<mpsc::Receiver<Box<Ammo<D::Payload>>>>,
    next_id: AtomicU64,
}

impl<D: Decoder> Provider<D> {
    /// Create a provider over the given decoder.
    ///
    /// Use [`ProviderBuilder`](super::ProviderBuilder) when the configuration
    /// needs validation.
    pub fn new(config: ProviderConfig, decoder: D) -> Self {
        let (sink_tx, sink_rx) = mpsc::channel(config.sink_capacity);
        let pool = AmmoPool::new(config.pool_capacity);

        Self {
            config,
            decoder: Mutex::new(decoder),
            pool,
            sink_tx: Mutex::new(Some(sink_tx)),
            sink_rx: Mutex::new(sink_rx),
            next_id: AtomicU64::new(0),
        }
    }

    /// The provider's configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The shared ammo pool.
    pub fn pool(&self) -> &AmmoPool<D::Payload> {
        &self.pool
    }

    /// Block until the next ammo item is available.
    ///
    /// Stamps a fresh identifier onto the item before returning it, so
    /// identifiers reflect actual hand-off order even when several items sit
    /// buffered in the channel. Returns `None` once the channel is closed and
    /// drained; no more ammo will ever arrive after that.
    ///
    /// Safe to call from any number of worker tasks concurrently.
    pub async fn acquire(&self) -> Option<Box<Ammo<D::Payload>>> {
        let mut rx = self.sink_rx.lock().await;
        let mut ammo = rx.recv().await?;
        // stamped while the receiver is still held, so identifiers match the
        // hand-off order exactly
        ammo.stamp(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        Some(ammo)
    }

    /// Return a spent item's slot to the pool.
    ///
    /// Clears the payload reference first, so pool reuse can never expose a
    /// previous shot's data. Purely local: never blocks, no side effects
    /// beyond pool bookkeeping. Call exactly once per successful acquire,
    /// after the worker is fully done reading the item.
    pub fn release(&self, mut ammo: Box<Ammo<D::Payload>>) {
        ammo.clear();
        self.pool.put(ammo);
    }

    /// Run the decode-dispatch loop until cancelled, exhausted, or failed.
    ///
    /// On every exit path the dispatch channel is closed (so `acquire` drains
    /// to `None`) and the decoder is closed exactly once. A close failure is
    /// combined with any pending loop error as
    /// [`ProviderError::Shutdown`](crate::error::ProviderError::Shutdown)
    /// rather than replacing it.
    ///
    /// Returns `Ok(())` on plain cancellation and on decoder limit sentinels:
    /// both mean the run finished as requested. Deadline expiry and all other
    /// decoder errors are surfaced.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ProviderError> {
        let sink_tx = self
            .sink_tx
            .lock()
            .await
            .take()
            .ok_or(ProviderError::AlreadyRan)?;

        tracing::info!(
            chosen_cases = ?self.config.chosen_cases,
            sink_capacity = self.config.sink_capacity,
            run_deadline = ?self.config.run_deadline,
            "provider starting"
        );

        let started = Instant::now();
        let mut decoder = self.decoder.lock().await;

        let loop_result = self
            .dispatch_loop(&mut decoder, &sink_tx, &cancel, started)
            .await;

        // closing the channel lets acquire drain remaining items, then stop
        drop(sink_tx);

        let close_result = decoder.close().await;

        let result = match (loop_result, close_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(run), Ok(())) => Err(run),
            (Ok(()), Err(close)) => Err(ProviderError::CloseFailed(close)),
            (Err(run), Err(close)) => Err(ProviderError::Shutdown {
                run: Box::new(run),
                close: Box::new(ProviderError::CloseFailed(close)),
            }),
        };

        match &result {
            Ok(()) => tracing::info!(
                elapsed_secs = started.elapsed().as_secs_f64(),
                "provider finished"
            ),
            Err(error) => tracing::error!(%error, "provider failed"),
        }

        result
    }

    async fn dispatch_loop(
        &self,
        decoder: &mut D,
        sink_tx: &mpsc::Sender<Box<Ammo<D::Payload>>>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<(), ProviderError> {
        let deadline = self.config.run_deadline;

        loop {
            // inner scan pass
            loop {
                let scanned = tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        tracing::debug!("cancelled during scan, stopping decode loop");
                        return Ok(());
                    }
                    _ = deadline_sleep(started, deadline) => {
                        return Err(ProviderError::DeadlineExceeded {
                            elapsed: started.elapsed(),
                        });
                    }
                    scanned = decoder.scan() => scanned,
                };

                let (payload, tag) = match scanned {
                    Ok(Some(item)) => item,
                    Ok(None) => break,
                    Err(err) if err.is_limit() => {
                        tracing::info!(sentinel = %err, "decoder reached configured limit");
                        return Ok(());
                    }
                    Err(err) => return Err(ProviderError::Decode(err)),
                };

                // filter before pooling: discarded tags cost no pool churn
                if !is_chosen_case(&tag, &self.config.chosen_cases) {
                    tracing::debug!(%tag, "tag not in chosen cases, discarding");
                    continue;
                }

                let mut slot = self.pool.get();
                slot.reset(payload, tag);

                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        // the undelivered slot is dropped here, never
                        // reachable from the pool
                        tracing::debug!("cancelled during dispatch, stopping decode loop");
                        return Ok(());
                    }
                    _ = deadline_sleep(started, deadline) => {
                        return Err(ProviderError::DeadlineExceeded {
                            elapsed: started.elapsed(),
                        });
                    }
                    sent = sink_tx.send(slot) => {
                        if sent.is_err() {
                            // the receiver lives inside this provider; losing
                            // it means the provider itself is being torn down
                            tracing::debug!("dispatch channel gone, stopping decode loop");
                            return Ok(());
                        }
                    }
                }
            }

            // pass boundary without an item: bound how long a finished but
            // not-yet-cancelled loop can live
            if cancel.is_cancelled() {
                tracing::debug!("cancelled at pass boundary, stopping decode loop");
                return Ok(());
            }
            if let Some(deadline) = deadline {
                if started.elapsed() >= deadline {
                    return Err(ProviderError::DeadlineExceeded {
                        elapsed: started.elapsed(),
                    });
                }
            }
        }
    }
}

impl<D: Decoder> std::fmt::Debug for Provider<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .field("pool_idle", &self.pool.idle())
            .field(
                "next_id",
                &self.next_id.load(std::sync::atomic::Ordering::Relaxed),
            )
            .finish()
    }
}

async fn deadline_sleep(started: Instant, deadline: Option<Duration>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep(deadline.saturating_sub(started.elapsed())).await;
        }
        None => std::future::pending().await,
    }
}
