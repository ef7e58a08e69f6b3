//! Pagination types
//!
//! Events fed into the state machine and the effects it asks the driver to
//! perform. None of these types know anything about async execution.

use std::fmt;

/// Epoch counter for new requests
///
/// Every accepted new request moves the paginator into the next generation.
/// Fetches are tagged with the generation they were dispatched in, and a
/// resolution whose tag is not the current generation is discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any new request was seen
    pub const INITIAL: Self = Self(0);

    /// Create a generation from a raw counter value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation that follows this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Continuation token state
///
/// `Unset` until the first envelope of a generation resolves. Next-page
/// triggers are only honoured once the cursor is `Set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CursorState<C> {
    /// No envelope received yet in this generation
    #[default]
    Unset,
    /// Cursor derived from the most recent envelope
    Set(C),
}

impl<C> CursorState<C> {
    /// Check if a cursor is established
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Borrow the cursor, if any
    pub fn as_ref(&self) -> Option<&C> {
        match self {
            Self::Unset => None,
            Self::Set(cursor) => Some(cursor),
        }
    }
}

/// Which collaborator a fetch was dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// `fetch_by_params`, issued by a new request
    FirstPage,
    /// `fetch_by_cursor`, issued by a next-page trigger
    NextPage,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstPage => f.write_str("first page"),
            Self::NextPage => f.write_str("next page"),
        }
    }
}

/// An envelope after projection into its values and cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<V, C> {
    /// Values carried by the envelope, in order
    pub values: Vec<V>,
    /// Cursor to continue from
    pub cursor: C,
}

impl<V, C> Page<V, C> {
    /// Create a page
    pub fn new(values: Vec<V>, cursor: C) -> Self {
        Self { values, cursor }
    }
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<P, V, C> {
    /// Start a new paginated query
    NewRequest(P),
    /// Ask for the page after the current cursor
    NextPage,
    /// A fetch dispatched in `generation` has completed
    Resolved {
        /// Generation the fetch was dispatched in
        generation: Generation,
        /// Which collaborator produced the result
        kind: FetchKind,
        /// The projected envelope, or the collaborator's failure message
        outcome: Result<Page<V, C>, String>,
    },
}

impl<P, V, C> Event<P, V, C> {
    /// Create a successful resolution
    pub fn resolved(generation: Generation, kind: FetchKind, page: Page<V, C>) -> Self {
        Self::Resolved {
            generation,
            kind,
            outcome: Ok(page),
        }
    }

    /// Create a failed resolution
    pub fn failed(generation: Generation, kind: FetchKind, message: impl Into<String>) -> Self {
        Self::Resolved {
            generation,
            kind,
            outcome: Err(message.into()),
        }
    }
}

/// Output of the state machine, in the order it must be observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<P, V, C> {
    /// Emit a snapshot of the accumulated values
    Values(Vec<V>),
    /// Emit a loading flag
    Loading(bool),
    /// Dispatch `fetch_by_params`
    FetchFirst {
        /// Tag for the eventual resolution
        generation: Generation,
        /// Parameters of the new request
        params: P,
    },
    /// Dispatch `fetch_by_cursor`
    FetchNext {
        /// Tag for the eventual resolution
        generation: Generation,
        /// Cursor to continue from
        cursor: C,
    },
}

impl<P, V, C> Effect<P, V, C> {
    /// Check if this effect dispatches a fetch
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::FetchFirst { .. } | Self::FetchNext { .. })
    }
}
