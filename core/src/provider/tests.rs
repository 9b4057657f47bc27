//! Integration tests for the Provider module

use super::*;
use crate::config::ProviderConfig;
use crate::error::{DecodeError, ProviderError};
use crate::traits::Decoder;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock Decoder
// ============================================================================

struct MockDecoder {
    items: VecDeque<(String, String)>,
    endless: bool,
    produced: usize,
    terminal: Option<DecodeError>,
    close_error: Option<DecodeError>,
    closes: Arc<AtomicUsize>,
}

impl MockDecoder {
    fn new<const N: usize>(items: [(&str, &str); N]) -> Self {
        Self {
            items: items
                .iter()
                .map(|(payload, tag)| (payload.to_string(), tag.to_string()))
                .collect(),
            endless: false,
            produced: 0,
            terminal: Some(DecodeError::AmmoLimit),
            close_error: None,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never exhausts; produces `payload-N` items tagged `t` forever.
    fn endless() -> Self {
        let mut decoder = Self::new([]);
        decoder.endless = true;
        decoder
    }

    fn with_terminal(mut self, terminal: DecodeError) -> Self {
        self.terminal = Some(terminal);
        self
    }

    fn with_close_error(mut self, error: DecodeError) -> Self {
        self.close_error = Some(error);
        self
    }

    fn closes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

#[async_trait]
impl Decoder for MockDecoder {
    type Payload = String;

    async fn scan(&mut self) -> Result<Option<(String, String)>, DecodeError> {
        if self.endless {
            self.produced += 1;
            return Ok(Some((format!("payload-{}", self.produced), "t".into())));
        }
        if let Some(item) = self.items.pop_front() {
            return Ok(Some(item));
        }
        match self.terminal.take() {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), DecodeError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn provider_with(decoder: MockDecoder, config: ProviderConfig) -> Arc<Provider<MockDecoder>> {
    Arc::new(Provider::new(config, decoder))
}

// ============================================================================
// Acquire / Release
// ============================================================================

#[tokio::test]
async fn acquire_stamps_strictly_increasing_ids() {
    let provider = provider_with(
        MockDecoder::new([("p1", "a"), ("p2", "a"), ("p3", "a")]),
        ProviderConfig::default(),
    );

    let run = tokio::spawn({
        let provider = Arc::clone(&provider);
        async move { provider.run(CancellationToken::new()).await }
    });

    let mut last_id = 0;
    for _ in 0..3 {
        let ammo = provider.acquire().await.expect("item expected");
        assert!(ammo.id() > last_id, "ids must strictly increase");
        last_id = ammo.id();
        provider.release(ammo);
    }

    run.await.unwrap().expect("run should classify limit as ok");

    // closed and drained: acquire must stay None forever
    assert!(provider.acquire().await.is_none());
    assert!(provider.acquire().await.is_none());
}

#[tokio::test]
async fn concurrent_acquirers_see_unique_ids() {
    let items: Vec<(String, String)> = (0..20)
        .map(|i| (format!("p{i}"), "t".to_string()))
        .collect();
    let mut decoder = MockDecoder::new([]);
    decoder.items = items.into_iter().collect();

    let provider = provider_with(decoder, ProviderConfig::default());

    let run = tokio::spawn({
        let provider = Arc::clone(&provider);
        async move { provider.run(CancellationToken::new()).await }
    });

    let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let mut workers = Vec::new();
    for _ in 0..4 {
        let provider = Arc::clone(&provider);
        let seen = Arc::clone(&seen);
        workers.push(tokio::spawn(async move {
            while let Some(ammo) = provider.acquire().await {
                seen.lock().await.push(ammo.id());
                provider.release(ammo);
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }
    run.await.unwrap().unwrap();

    let mut ids = seen.lock().await.clone();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20, "every id must be unique");
}

#[tokio::test]
async fn release_clears_payload_before_pool_reuse() {
    let provider = provider_with(MockDecoder::new([("first", "a")]), ProviderConfig::default());

    provider
        .run(CancellationToken::new())
        .await
        .expect("run should finish");

    let ammo = provider.acquire().await.expect("item expected");
    assert_eq!(ammo.payload().map(String::as_str), Some("first"));
    let addr = &*ammo as *const _;

    provider.release(ammo);

    // the recycled slot is the same object, with the old payload gone
    let mut recycled = provider.pool().get();
    assert_eq!(&*recycled as *const _, addr);
    assert!(!recycled.has_payload());

    recycled.reset("second".to_string(), "b");
    assert_eq!(recycled.payload().map(String::as_str), Some("second"));
}

// ============================================================================
// Filtering
// ============================================================================

#[tokio::test]
async fn excluded_tags_never_reach_acquire() {
    let provider = provider_with(
        MockDecoder::new([("p1", "a"), ("p2", "b"), ("p3", "a")]),
        ProviderConfig::default().with_chosen_cases(["a"]),
    );

    provider
        .run(CancellationToken::new())
        .await
        .expect("run should finish");

    let mut tags = Vec::new();
    while let Some(ammo) = provider.acquire().await {
        tags.push(ammo.tag().to_string());
        provider.release(ammo);
    }
    assert_eq!(tags, vec!["a", "a"]);
}

#[tokio::test]
async fn empty_selection_dispatches_everything() {
    let provider = provider_with(
        MockDecoder::new([("p1", "a"), ("p2", "b")]),
        ProviderConfig::default(),
    );

    provider.run(CancellationToken::new()).await.unwrap();

    let mut count = 0;
    while let Some(ammo) = provider.acquire().await {
        count += 1;
        provider.release(ammo);
    }
    assert_eq!(count, 2);
}

// ============================================================================
// Termination classification
// ============================================================================

#[tokio::test]
async fn ammo_limit_is_success() {
    let decoder = MockDecoder::new([("p1", "a")]).with_terminal(DecodeError::AmmoLimit);
    let closes = decoder.closes();
    let provider = provider_with(decoder, ProviderConfig::default());

    let result = provider.run(CancellationToken::new()).await;

    assert!(result.is_ok(), "ammo limit is a sentinel, not a failure");
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pass_limit_is_success() {
    let decoder = MockDecoder::new([]).with_terminal(DecodeError::PassLimit);
    let provider = provider_with(decoder, ProviderConfig::default());

    assert!(provider.run(CancellationToken::new()).await.is_ok());
}

#[tokio::test]
async fn other_decoder_errors_are_fatal() {
    let decoder =
        MockDecoder::new([("p1", "a")]).with_terminal(DecodeError::Malformed("bad json".into()));
    let closes = decoder.closes();
    let provider = provider_with(decoder, ProviderConfig::default());

    let err = provider
        .run(CancellationToken::new())
        .await
        .expect_err("malformed input must fail the run");

    assert!(matches!(
        err,
        ProviderError::Decode(DecodeError::Malformed(_))
    ));
    assert!(err.to_string().contains("bad json"));
    assert_eq!(closes.load(Ordering::SeqCst), 1, "cleanup still runs");
}

#[tokio::test]
async fn close_failure_alone_is_surfaced() {
    let decoder = MockDecoder::new([]).with_close_error(DecodeError::Close("fd gone".into()));
    let provider = provider_with(decoder, ProviderConfig::default());

    let err = provider
        .run(CancellationToken::new())
        .await
        .expect_err("close failure must be visible");

    assert!(matches!(err, ProviderError::CloseFailed(_)));
    assert!(err.to_string().contains("fd gone"));
}

#[tokio::test]
async fn close_failure_combines_with_loop_error() {
    let decoder = MockDecoder::new([])
        .with_terminal(DecodeError::Malformed("bad json".into()))
        .with_close_error(DecodeError::Close("fd gone".into()));
    let provider = provider_with(decoder, ProviderConfig::default());

    let err = provider
        .run(CancellationToken::new())
        .await
        .expect_err("both failures must be visible");

    let msg = err.to_string();
    assert!(matches!(err, ProviderError::Shutdown { .. }));
    assert!(msg.contains("bad json"), "missing loop cause: {msg}");
    assert!(msg.contains("fd gone"), "missing close cause: {msg}");
}

#[tokio::test]
async fn second_run_is_rejected() {
    let decoder = MockDecoder::new([]);
    let closes = decoder.closes();
    let provider = provider_with(decoder, ProviderConfig::default());

    provider.run(CancellationToken::new()).await.unwrap();
    let err = provider
        .run(CancellationToken::new())
        .await
        .expect_err("a provider runs once");

    assert!(matches!(err, ProviderError::AlreadyRan));
    assert_eq!(
        closes.load(Ordering::SeqCst),
        1,
        "the rejected run must not close the decoder again"
    );
}

// ============================================================================
// Cancellation and deadline
// ============================================================================

#[tokio::test]
async fn cancel_during_full_channel_dispatch_returns_promptly() {
    let decoder = MockDecoder::endless();
    let closes = decoder.closes();
    let provider = provider_with(
        decoder,
        ProviderConfig::default().with_sink_capacity(1).with_pool_capacity(1),
    );

    let cancel = CancellationToken::new();
    let run = tokio::spawn({
        let provider = Arc::clone(&provider);
        let cancel = cancel.clone();
        async move { provider.run(cancel).await }
    });

    // let the loop fill the channel and block on dispatch
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("run must not deadlock on a full channel")
        .unwrap();

    assert!(result.is_ok(), "plain cancellation is requested shutdown");
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deadline_expiry_is_an_error() {
    let provider = provider_with(
        MockDecoder::endless(),
        ProviderConfig::default()
            .with_sink_capacity(1)
            .with_run_deadline(Duration::from_millis(50)),
    );

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        provider.run(CancellationToken::new()),
    )
    .await
    .expect("run must not deadlock on a full channel");

    assert!(matches!(
        result,
        Err(ProviderError::DeadlineExceeded { .. })
    ));
}

#[tokio::test]
async fn pre_cancelled_token_stops_the_loop_immediately() {
    let decoder = MockDecoder::endless();
    let closes = decoder.closes();
    let provider = provider_with(decoder, ProviderConfig::default());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), provider.run(cancel))
        .await
        .expect("cancellation must win over an endless decoder");

    assert!(result.is_ok());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[tokio::test]
async fn end_to_end_filtered_run() {
    let decoder = MockDecoder::new([("p1", "a"), ("p2", "b"), ("p3", "a")]);
    let closes = decoder.closes();
    let provider = provider_with(decoder, ProviderConfig::default().with_chosen_cases(["a"]));

    let run = tokio::spawn({
        let provider = Arc::clone(&provider);
        async move { provider.run(CancellationToken::new()).await }
    });

    let mut delivered = Vec::new();
    while let Some(ammo) = provider.acquire().await {
        delivered.push((ammo.id(), ammo.tag().to_string()));
        provider.release(ammo);
    }

    run.await.unwrap().expect("run should finish clean");

    assert_eq!(delivered.len(), 2, "only chosen cases are delivered");
    assert!(delivered.iter().all(|(_, tag)| tag == "a"));
    assert!(delivered[0].0 < delivered[1].0, "ids increase with hand-off");
    assert_eq!(closes.load(Ordering::SeqCst), 1, "decoder closed exactly once");
}
