//! Pagination state machine
//!
//! `PaginationState::handle` is the whole transition function: it takes one
//! event, mutates the state and returns the effects to perform, in order.
//! The async driver in `crate::engine` only merges inputs, runs fetches and
//! forwards effects.

use super::types::{CursorState, Effect, Event, FetchKind, Generation, Page};
use tracing::{debug, trace, warn};

/// State owned by a single paginator
#[derive(Debug, Clone)]
pub struct PaginationState<V, C> {
    /// Clear the visible values as soon as a new request arrives
    clear_on_new_request: bool,
    /// Values visible to observers
    values: Vec<V>,
    /// Continuation token for the next page
    cursor: CursorState<C>,
    /// Set when a page came back empty
    exhausted: bool,
    /// Current epoch
    generation: Generation,
    /// Fetch outstanding for the current generation
    in_flight: Option<FetchKind>,
    /// Whether any values snapshot was emitted yet
    emitted: bool,
}

impl<V, C> PaginationState<V, C> {
    /// Create an idle state
    pub fn new(clear_on_new_request: bool) -> Self {
        Self {
            clear_on_new_request,
            values: Vec::new(),
            cursor: CursorState::Unset,
            exhausted: false,
            generation: Generation::INITIAL,
            in_flight: None,
            emitted: false,
        }
    }

    /// Values accumulated so far
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Current cursor state
    pub fn cursor(&self) -> &CursorState<C> {
        &self.cursor
    }

    /// Whether the last page came back empty
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Current generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether a fetch is outstanding for the current generation
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Kind of the outstanding fetch, if any
    pub fn in_flight(&self) -> Option<FetchKind> {
        self.in_flight
    }

    /// Whether the clear-on-new-request behaviour is enabled
    pub fn clears_on_new_request(&self) -> bool {
        self.clear_on_new_request
    }
}

impl<V: Clone, C: Clone> PaginationState<V, C> {
    /// Apply one event and return the effects it causes
    pub fn handle<P>(&mut self, event: Event<P, V, C>) -> Vec<Effect<P, V, C>> {
        match event {
            Event::NewRequest(params) => self.new_request(params),
            Event::NextPage => self.next_page(),
            Event::Resolved {
                generation,
                kind,
                outcome,
            } => self.resolve(generation, kind, outcome),
        }
    }

    fn new_request<P>(&mut self, params: P) -> Vec<Effect<P, V, C>> {
        let mut effects = Vec::with_capacity(4);
        self.generation = self.generation.next();

        // The superseded fetch will be dropped on arrival; close its loading edge now
        if let Some(kind) = self.in_flight.take() {
            debug!(generation = %self.generation, %kind, "Superseding in-flight fetch");
            effects.push(Effect::Loading(false));
        }

        // Values only become non-empty through an emitted snapshot, so an empty
        // list has nothing visible to clear
        if self.clear_on_new_request && !self.values.is_empty() {
            self.values.clear();
            effects.push(Effect::Values(Vec::new()));
        }

        self.exhausted = false;
        self.cursor = CursorState::Unset;
        self.in_flight = Some(FetchKind::FirstPage);

        debug!(generation = %self.generation, "Dispatching first page");
        effects.push(Effect::Loading(true));
        effects.push(Effect::FetchFirst {
            generation: self.generation,
            params,
        });
        effects
    }

    fn next_page<P>(&mut self) -> Vec<Effect<P, V, C>> {
        let CursorState::Set(cursor) = &self.cursor else {
            trace!("Ignoring next page: no cursor yet");
            return Vec::new();
        };
        if self.exhausted {
            trace!("Ignoring next page: exhausted");
            return Vec::new();
        }
        if self.in_flight.is_some() {
            trace!("Ignoring next page: fetch in flight");
            return Vec::new();
        }

        let cursor = cursor.clone();
        self.in_flight = Some(FetchKind::NextPage);

        debug!(generation = %self.generation, "Dispatching next page");
        vec![
            Effect::Loading(true),
            Effect::FetchNext {
                generation: self.generation,
                cursor,
            },
        ]
    }

    fn resolve<P>(
        &mut self,
        generation: Generation,
        kind: FetchKind,
        outcome: Result<Page<V, C>, String>,
    ) -> Vec<Effect<P, V, C>> {
        if generation != self.generation {
            debug!(
                stale = %generation,
                current = %self.generation,
                %kind,
                "Discarding stale fetch result"
            );
            return Vec::new();
        }
        if self.in_flight != Some(kind) {
            warn!(%generation, %kind, "Discarding unexpected fetch result");
            return Vec::new();
        }
        self.in_flight = None;

        let page = match outcome {
            Ok(page) => page,
            Err(message) => {
                warn!(%generation, %kind, error = %message, "Fetch failed, keeping state");
                return vec![Effect::Loading(false)];
            }
        };

        let replaces = kind == FetchKind::FirstPage;
        // Appends, replacements and the first snapshot are emitted; a first
        // page is not compared against the values it replaces
        let emits =
            !page.values.is_empty() || !self.emitted || (replaces && !self.values.is_empty());

        if replaces {
            self.values.clear();
        }
        self.exhausted = page.values.is_empty();
        self.values.extend(page.values);
        self.cursor = CursorState::Set(page.cursor);

        debug!(
            %generation,
            %kind,
            total = self.values.len(),
            exhausted = self.exhausted,
            "Page resolved"
        );

        let mut effects = Vec::with_capacity(2);
        if emits {
            self.emitted = true;
            effects.push(Effect::Values(self.values.clone()));
        }
        effects.push(Effect::Loading(false));
        effects
    }
}

impl<V, C> Default for PaginationState<V, C> {
    fn default() -> Self {
        Self::new(true)
    }
}
