//! Execution engine module
//!
//! Runs a [`PaginationState`] on a single tokio task.
//!
//! # Overview
//!
//! The engine provides:
//! - [`Paginator`] - Drives any [`PageSource`] from two input streams
//! - [`paginate`] - The same, from two projections and two fetch functions
//! - [`PageStreams`] - The values and loading output streams
//!
//! Both inputs and all fetch completions are merged into one ordered event
//! sequence on the driver task, so the state is never shared. Fetches run as
//! futures owned by the driver and keep running when superseded; their
//! results carry the generation they were started in and are dropped by the
//! state machine on arrival. Once the inputs have ended and the live fetch
//! has resolved, superseded fetches are abandoned.

mod types;

pub use types::{LoadingStream, PageStreams, ValuesStream};

use crate::config::PaginatorConfig;
use crate::error::Result;
use crate::pagination::{Effect, Event, FetchKind, Generation, PaginationState};
use crate::source::{FnSource, PageSource};
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, FuturesUnordered};
use futures::{FutureExt, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

type SourceEvent<S> =
    Event<<S as PageSource>::Params, <S as PageSource>::Value, <S as PageSource>::Cursor>;

/// Paginator over a page source
///
/// ```rust,ignore
/// let streams = Paginator::new(source)
///     .with_config(PaginatorConfig::new(false))
///     .spawn(new_requests, next_pages);
/// ```
pub struct Paginator<S: PageSource> {
    source: Arc<S>,
    config: PaginatorConfig,
}

impl<S: PageSource> Paginator<S> {
    /// Create a paginator with the default configuration
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Create a paginator over a shared source
    pub fn from_arc(source: Arc<S>) -> Self {
        Self {
            source,
            config: PaginatorConfig::default(),
        }
    }

    /// Set paginator configuration
    #[must_use]
    pub fn with_config(mut self, config: PaginatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set whether new requests clear the visible values immediately
    #[must_use]
    pub fn clear_on_new_request(mut self, clear: bool) -> Self {
        self.config.clear_on_new_request = clear;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &PaginatorConfig {
        &self.config
    }

    /// Start the driver task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R, N>(self, new_requests: R, next_pages: N) -> PageStreams<S::Value>
    where
        R: Stream<Item = S::Params> + Send + 'static,
        N: Stream<Item = ()> + Send + 'static,
    {
        let (values_tx, values_rx) = mpsc::unbounded_channel();
        let (loading_tx, loading_rx) = mpsc::unbounded_channel();

        let inputs: BoxStream<'static, SourceEvent<S>> = stream::select(
            new_requests.map(Event::NewRequest).boxed(),
            next_pages.map(|()| Event::NextPage).boxed(),
        )
        .boxed();

        let driver = Driver {
            source: self.source,
            state: PaginationState::new(self.config.clear_on_new_request),
            in_flight: FuturesUnordered::new(),
            values_tx,
            loading_tx,
        };

        let handle = tokio::spawn(driver.run(inputs));
        PageStreams::new(
            UnboundedReceiverStream::new(values_rx),
            UnboundedReceiverStream::new(loading_rx),
            handle,
        )
    }
}

impl<S: PageSource> std::fmt::Debug for Paginator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Paginate with plain functions as collaborators
///
/// Turns a stream of new-request parameters and a stream of next-page
/// triggers into a stream of accumulated values and a stream of loading
/// flags. `fetch_by_params` serves first pages, `fetch_by_cursor` serves
/// every later page, and the two projections split an envelope into its
/// values and the cursor for the page after it.
///
/// Must be called from within a tokio runtime.
#[allow(clippy::too_many_arguments)]
pub fn paginate<P, C, E, V, R, N, VO, CO, FP, FutP, FC, FutC>(
    new_requests: R,
    next_pages: N,
    clear_on_new_request: bool,
    values_of: VO,
    cursor_of: CO,
    fetch_by_params: FP,
    fetch_by_cursor: FC,
) -> PageStreams<V>
where
    P: Send + 'static,
    C: Clone + Send + 'static,
    E: Send + 'static,
    V: Clone + Send + 'static,
    R: Stream<Item = P> + Send + 'static,
    N: Stream<Item = ()> + Send + 'static,
    VO: Fn(&E) -> Vec<V> + Send + Sync + 'static,
    CO: Fn(&E) -> C + Send + Sync + 'static,
    FP: Fn(P) -> FutP + Send + Sync + 'static,
    FutP: Future<Output = Result<E>> + Send + 'static,
    FC: Fn(C) -> FutC + Send + Sync + 'static,
    FutC: Future<Output = Result<E>> + Send + 'static,
{
    let source = FnSource::new(values_of, cursor_of, fetch_by_params, fetch_by_cursor);
    Paginator::new(source)
        .clear_on_new_request(clear_on_new_request)
        .spawn(new_requests, next_pages)
}

/// Owner of the pagination state for one running paginator
struct Driver<S: PageSource> {
    source: Arc<S>,
    state: PaginationState<S::Value, S::Cursor>,
    in_flight: FuturesUnordered<BoxFuture<'static, SourceEvent<S>>>,
    values_tx: UnboundedSender<Vec<S::Value>>,
    loading_tx: UnboundedSender<bool>,
}

impl<S: PageSource> Driver<S> {
    async fn run(mut self, mut inputs: BoxStream<'static, SourceEvent<S>>) {
        let mut inputs_done = false;

        loop {
            // Anything still in flight now belongs to a superseded request
            if inputs_done && !self.state.is_loading() {
                break;
            }

            let event = tokio::select! {
                input = inputs.next(), if !inputs_done => match input {
                    Some(event) => event,
                    None => {
                        debug!("Input streams ended");
                        inputs_done = true;
                        continue;
                    }
                },
                Some(resolved) = self.in_flight.next(), if !self.in_flight.is_empty() => resolved,
                () = outputs_closed(&self.values_tx, &self.loading_tx) => {
                    debug!("Output streams dropped, stopping paginator");
                    break;
                }
            };

            self.apply(event);
        }

        debug!(
            generation = %self.state.generation(),
            abandoned = self.in_flight.len(),
            "Paginator stopped"
        );
    }

    fn apply(&mut self, event: SourceEvent<S>) {
        for effect in self.state.handle(event) {
            match effect {
                Effect::Values(values) => {
                    if self.values_tx.send(values).is_err() {
                        trace!("Values stream dropped");
                    }
                }
                Effect::Loading(loading) => {
                    if self.loading_tx.send(loading).is_err() {
                        trace!("Loading stream dropped");
                    }
                }
                Effect::FetchFirst { generation, params } => {
                    self.dispatch_first(generation, params);
                }
                Effect::FetchNext { generation, cursor } => {
                    self.dispatch_next(generation, cursor);
                }
            }
        }
    }

    fn dispatch_first(&mut self, generation: Generation, params: S::Params) {
        let source = Arc::clone(&self.source);
        self.in_flight.push(
            async move {
                let outcome = source.fetch_by_params(params).await;
                resolution(&*source, generation, FetchKind::FirstPage, outcome)
            }
            .boxed(),
        );
    }

    fn dispatch_next(&mut self, generation: Generation, cursor: S::Cursor) {
        let source = Arc::clone(&self.source);
        self.in_flight.push(
            async move {
                let outcome = source.fetch_by_cursor(cursor).await;
                resolution(&*source, generation, FetchKind::NextPage, outcome)
            }
            .boxed(),
        );
    }
}

/// Resolves once both output receivers are gone
async fn outputs_closed<A, B>(values: &UnboundedSender<A>, loading: &UnboundedSender<B>) {
    tokio::join!(values.closed(), loading.closed());
}

/// Turn a fetch outcome into a tagged resolution event
fn resolution<S: PageSource>(
    source: &S,
    generation: Generation,
    kind: FetchKind,
    outcome: Result<S::Envelope>,
) -> SourceEvent<S> {
    match outcome {
        Ok(envelope) => Event::resolved(generation, kind, source.project(&envelope)),
        Err(e) => Event::failed(generation, kind, e.to_string()),
    }
}

#[cfg(test)]
mod tests;
