//! Pagination module
//!
//! The synchronous core of the paginator.
//!
//! # Overview
//!
//! Two independent inputs (new requests and next-page triggers) and the
//! completions of the fetches they start are applied one at a time to a
//! [`PaginationState`]. Each event yields an ordered list of [`Effect`]s:
//! values snapshots, loading flags and fetch dispatches. Fetches are tagged
//! with the [`Generation`] they were started in, and completions from an
//! older generation are dropped without touching the state.

mod machine;
mod types;

pub use machine::PaginationState;
pub use types::{CursorState, Effect, Event, FetchKind, Generation, Page};
