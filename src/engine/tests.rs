//! Tests for the engine module
//!
//! Fetches sleep for `INTERVAL` on a paused tokio clock, so tests step time
//! explicitly the way a virtual scheduler would.

use super::*;
use crate::error::Error;
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(1);

/// Let the driver task run until it is idle
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Pull everything currently buffered in a stream
fn drain<T>(stream: &mut (impl Stream<Item = T> + Unpin)) -> Vec<T> {
    let mut items = Vec::new();
    while let Some(Some(item)) = stream.next().now_or_never() {
        items.push(item);
    }
    items
}

struct Harness {
    requests: UnboundedSender<i32>,
    pages: UnboundedSender<()>,
    streams: PageStreams<i32>,
    values: Vec<Vec<i32>>,
    loading: Vec<bool>,
}

impl Harness {
    /// Params `p` map to `[p]`, cursor `c` maps to `[c]` while `c <= 2`
    fn new(clear_on_new_request: bool, delay: Duration) -> Self {
        let (requests, request_rx) = mpsc::unbounded();
        let (pages, page_rx) = mpsc::unbounded();

        let streams = paginate(
            request_rx,
            page_rx,
            clear_on_new_request,
            |envelope: &Vec<i32>| envelope.clone(),
            |envelope: &Vec<i32>| envelope.last().copied().unwrap_or(0) + 1,
            move |params: i32| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(vec![params])
            },
            move |cursor: i32| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(if cursor <= 2 { vec![cursor] } else { vec![] })
            },
        );

        Self {
            requests,
            pages,
            streams,
            values: Vec::new(),
            loading: Vec::new(),
        }
    }

    fn from_streams(
        requests: UnboundedSender<i32>,
        pages: UnboundedSender<()>,
        streams: PageStreams<i32>,
    ) -> Self {
        Self {
            requests,
            pages,
            streams,
            values: Vec::new(),
            loading: Vec::new(),
        }
    }

    fn collect(&mut self) {
        self.values.extend(drain(self.streams.values()));
        self.loading.extend(drain(self.streams.loading()));
    }

    async fn new_request(&mut self, params: i32) {
        self.requests.unbounded_send(params).unwrap();
        settle().await;
        self.collect();
    }

    async fn next_page(&mut self) {
        self.pages.unbounded_send(()).unwrap();
        settle().await;
        self.collect();
    }

    async fn advance(&mut self, duration: Duration) {
        tokio::time::advance(duration).await;
        settle().await;
        self.collect();
    }
}

// ============================================================================
// Flow Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_paginate_flow() {
    let mut h = Harness::new(true, INTERVAL);
    settle().await;
    h.collect();
    assert!(h.values.is_empty(), "No values emit immediately");
    assert!(h.loading.is_empty(), "No loading happens immediately");

    h.new_request(1).await;
    assert!(h.values.is_empty());
    assert_eq!(h.loading, vec![true], "Loading starts");

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1]]);
    assert_eq!(h.loading, vec![true, false]);

    h.next_page().await;
    assert_eq!(h.values, vec![vec![1]]);
    assert_eq!(h.loading, vec![true, false, true]);

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false]);

    // This page is empty, so pagination is exhausted
    h.next_page().await;
    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);

    h.next_page().await;
    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);

    h.new_request(0).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2], vec![]], "Values clear immediately");
    assert_eq!(h.loading, vec![true, false, true, false, true, false, true]);

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2], vec![], vec![0]]);
    assert_eq!(
        h.loading,
        vec![true, false, true, false, true, false, true, false]
    );
}

#[tokio::test(start_paused = true)]
async fn test_paginate_does_not_clear_on_new_request() {
    let mut h = Harness::new(false, INTERVAL);

    h.new_request(1).await;
    h.advance(INTERVAL).await;
    h.next_page().await;
    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);

    h.new_request(1).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false, true]);

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2], vec![1]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

#[tokio::test]
async fn test_immediate_fetches_still_signal_loading_first() {
    let mut h = Harness::new(true, Duration::ZERO);

    h.new_request(1).await;
    assert_eq!(h.values, vec![vec![1]]);
    assert_eq!(h.loading, vec![true, false]);

    h.next_page().await;
    h.next_page().await;
    h.next_page().await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

// ============================================================================
// Interleaving Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_next_page_while_loading_is_ignored() {
    let mut h = Harness::new(true, INTERVAL);

    h.new_request(1).await;
    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1]]);

    h.next_page().await;
    h.advance(INTERVAL / 2).await;
    assert_eq!(h.loading, vec![true, false, true], "Still loading");

    h.next_page().await;
    assert_eq!(h.loading, vec![true, false, true], "Second trigger ignored");

    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false]);

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]], "Nothing else was fetched");
}

#[tokio::test(start_paused = true)]
async fn test_new_request_supersedes_next_page_with_clear() {
    let mut h = Harness::new(true, INTERVAL);

    h.new_request(1).await;
    h.advance(INTERVAL).await;

    h.next_page().await;
    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1]]);
    assert_eq!(h.loading, vec![true, false, true]);

    h.new_request(0).await;
    assert_eq!(h.values, vec![vec![1], vec![]], "Values clear immediately");
    assert_eq!(h.loading, vec![true, false, true, false, true]);

    // The superseded next page resolves here and is dropped
    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1], vec![]]);
    assert_eq!(h.loading, vec![true, false, true, false, true]);

    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1], vec![], vec![0]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_new_request_supersedes_next_page_without_clear() {
    let mut h = Harness::new(false, INTERVAL);

    h.new_request(1).await;
    h.advance(INTERVAL).await;

    h.next_page().await;
    h.advance(INTERVAL / 2).await;

    h.new_request(0).await;
    assert_eq!(h.values, vec![vec![1]], "Does not clear immediately");
    assert_eq!(h.loading, vec![true, false, true, false, true]);

    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1]]);

    h.advance(INTERVAL / 2).await;
    assert_eq!(h.values, vec![vec![1], vec![0]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_new_requests_keep_only_latest() {
    let mut h = Harness::new(true, INTERVAL);

    h.new_request(5).await;
    h.new_request(6).await;
    h.new_request(7).await;
    assert_eq!(h.loading, vec![true, false, true, false, true]);

    h.advance(INTERVAL).await;
    assert_eq!(h.values, vec![vec![7]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_fetch_stops_loading_and_keeps_values() {
    let (requests, request_rx) = mpsc::unbounded();
    let (pages, page_rx) = mpsc::unbounded();
    let attempts = Arc::new(AtomicUsize::new(0));
    let cursor_attempts = Arc::clone(&attempts);

    let streams = paginate(
        request_rx,
        page_rx,
        true,
        |envelope: &Vec<i32>| envelope.clone(),
        |envelope: &Vec<i32>| envelope.last().copied().unwrap_or(0) + 1,
        |params: i32| async move { Ok(vec![params]) },
        move |cursor: i32| {
            let attempt = cursor_attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(Error::fetch("connection reset"))
                } else {
                    Ok(vec![cursor])
                }
            }
        },
    );
    let mut h = Harness::from_streams(requests, pages, streams);

    h.new_request(1).await;
    h.next_page().await;
    assert_eq!(h.values, vec![vec![1]]);
    assert_eq!(h.loading, vec![true, false, true, false]);

    // The cursor survived the failure and can be retried
    h.next_page().await;
    assert_eq!(h.values, vec![vec![1], vec![1, 2]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_fetch_blocks_next_page_but_not_new_request() {
    let (requests, request_rx) = mpsc::unbounded();
    let (pages, page_rx) = mpsc::unbounded();

    let streams = paginate(
        request_rx,
        page_rx,
        true,
        |envelope: &Vec<i32>| envelope.clone(),
        |envelope: &Vec<i32>| envelope.last().copied().unwrap_or(0) + 1,
        |params: i32| async move { Ok(vec![params]) },
        |_cursor: i32| futures::future::pending::<Result<Vec<i32>>>(),
    );
    let mut h = Harness::from_streams(requests, pages, streams);

    h.new_request(1).await;
    h.next_page().await;
    h.advance(Duration::from_secs(3600)).await;
    h.next_page().await;
    assert_eq!(h.loading, vec![true, false, true], "Stuck loading");

    h.new_request(4).await;
    assert_eq!(h.values, vec![vec![1], vec![], vec![4]]);
    assert_eq!(h.loading, vec![true, false, true, false, true, false]);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_streams_end_after_inputs_end_and_fetch_resolves() {
    let Harness {
        requests,
        pages,
        streams,
        ..
    } = Harness::new(true, INTERVAL);

    requests.unbounded_send(3).unwrap();
    drop(requests);
    drop(pages);

    let (values, loading) = streams.into_streams();
    let values: Vec<Vec<i32>> = values.collect().await;
    let loading: Vec<bool> = loading.collect().await;

    assert_eq!(values, vec![vec![3]]);
    assert_eq!(loading, vec![true, false]);
}

#[tokio::test]
async fn test_driver_stops_when_outputs_dropped() {
    let (requests, request_rx) = mpsc::unbounded::<i32>();
    let (_pages, page_rx) = mpsc::unbounded();

    let streams = paginate(
        request_rx,
        page_rx,
        true,
        |envelope: &Vec<i32>| envelope.clone(),
        |envelope: &Vec<i32>| envelope.len() as i32,
        |params: i32| async move { Ok(vec![params]) },
        |cursor: i32| async move { Ok(vec![cursor]) },
    );
    let (values, loading, handle) = streams.into_parts();
    drop(values);
    drop(loading);

    requests.unbounded_send(1).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_streams_end_while_superseded_fetch_hangs() {
    let (requests, request_rx) = mpsc::unbounded::<i32>();
    let (pages, page_rx) = mpsc::unbounded();

    let streams = paginate(
        request_rx,
        page_rx,
        true,
        |envelope: &Vec<i32>| envelope.clone(),
        |envelope: &Vec<i32>| envelope.len() as i32,
        |params: i32| async move {
            if params == 1 {
                futures::future::pending::<()>().await;
            }
            Ok(vec![params])
        },
        |cursor: i32| async move { Ok(vec![cursor]) },
    );

    requests.unbounded_send(1).unwrap();
    requests.unbounded_send(2).unwrap();
    drop(requests);
    drop(pages);

    let (values, loading, handle) = streams.into_parts();
    let outputs = async { tokio::join!(values.collect::<Vec<_>>(), loading.collect::<Vec<_>>()) };
    let (values, loading) = tokio::time::timeout(Duration::from_secs(2), outputs)
        .await
        .expect("output streams should end");

    assert_eq!(values, vec![vec![2]]);
    assert_eq!(loading, vec![true, false, true, false]);
    assert!(tokio::time::timeout(INTERVAL, handle).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_driver_stops_when_outputs_dropped_while_inputs_idle() {
    let mut harness = Harness::new(true, Duration::ZERO);
    harness.new_request(4).await;
    assert_eq!(harness.values, vec![vec![4]]);

    let Harness {
        requests,
        pages,
        streams,
        ..
    } = harness;
    let (values, loading, handle) = streams.into_parts();
    drop(values);
    drop(loading);

    tokio::time::timeout(INTERVAL, handle)
        .await
        .expect("driver should stop without further input")
        .unwrap();
    drop(requests);
    drop(pages);
}

// ============================================================================
// PageSource Tests
// ============================================================================

/// Source that counts calls and resolves after `INTERVAL`
#[derive(Default)]
struct CountingSource {
    by_params: AtomicUsize,
    by_cursor: AtomicUsize,
    completed: AtomicUsize,
}

#[async_trait]
impl PageSource for CountingSource {
    type Params = u32;
    type Cursor = u32;
    type Envelope = (Vec<String>, u32);
    type Value = String;

    async fn fetch_by_params(&self, params: u32) -> Result<Self::Envelope> {
        self.by_params.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok((vec![format!("q{params}-0")], 1))
    }

    async fn fetch_by_cursor(&self, cursor: u32) -> Result<Self::Envelope> {
        self.by_cursor.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(INTERVAL).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok((vec![format!("page-{cursor}")], cursor + 1))
    }

    fn values_of(&self, envelope: &Self::Envelope) -> Vec<String> {
        envelope.0.clone()
    }

    fn cursor_of(&self, envelope: &Self::Envelope) -> u32 {
        envelope.1
    }
}

#[tokio::test(start_paused = true)]
async fn test_paginator_over_custom_source() {
    let source = Arc::new(CountingSource::default());
    let (requests, request_rx) = mpsc::unbounded();
    let (pages, page_rx) = mpsc::unbounded();

    let mut streams = Paginator::from_arc(Arc::clone(&source))
        .clear_on_new_request(false)
        .spawn(request_rx, page_rx);

    // No cursor yet: the trigger is dropped without calling the source
    pages.unbounded_send(()).unwrap();
    settle().await;
    assert_eq!(source.by_cursor.load(Ordering::SeqCst), 0);

    requests.unbounded_send(9).unwrap();
    settle().await;
    pages.unbounded_send(()).unwrap();
    settle().await;
    assert_eq!(source.by_cursor.load(Ordering::SeqCst), 0);

    tokio::time::advance(INTERVAL).await;
    settle().await;
    pages.unbounded_send(()).unwrap();
    settle().await;
    tokio::time::advance(INTERVAL).await;
    settle().await;

    assert_eq!(
        drain(streams.values()),
        vec![
            vec!["q9-0".to_string()],
            vec!["q9-0".to_string(), "page-1".to_string()],
        ]
    );
    assert_eq!(drain(streams.loading()), vec![true, false, true, false]);
    assert_eq!(source.by_params.load(Ordering::SeqCst), 1);
    assert_eq!(source.by_cursor.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_fetch_runs_to_completion() {
    let source = Arc::new(CountingSource::default());
    let (requests, request_rx) = mpsc::unbounded();
    let (_pages, page_rx) = mpsc::unbounded::<()>();

    let mut streams = Paginator::from_arc(Arc::clone(&source)).spawn(request_rx, page_rx);

    requests.unbounded_send(1).unwrap();
    settle().await;
    tokio::time::advance(INTERVAL / 2).await;
    requests.unbounded_send(2).unwrap();
    settle().await;

    tokio::time::advance(INTERVAL / 2).await;
    settle().await;
    assert_eq!(source.completed.load(Ordering::SeqCst), 1);
    assert!(drain(streams.values()).is_empty(), "Stale page dropped");

    tokio::time::advance(INTERVAL / 2).await;
    settle().await;
    assert_eq!(source.completed.load(Ordering::SeqCst), 2);
    assert_eq!(drain(streams.values()), vec![vec!["q2-0".to_string()]]);
    assert_eq!(drain(streams.loading()), vec![true, false, true, false]);
}
