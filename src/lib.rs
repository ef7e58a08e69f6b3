// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::type_complexity)]

//! # pagestream
//!
//! Reactive pagination: turns a stream of new requests and a stream of
//! next-page triggers into a stream of accumulated values and a stream of
//! loading flags.
//!
//! ## Features
//!
//! - **Pure state machine**: every transition is a function from event to effects
//! - **Generation tagging**: results of superseded requests are discarded on arrival
//! - **Pluggable sources**: closures or any [`source::PageSource`]
//! - **HTTP source**: cursor, offset, page number, link header and next URL strategies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::{stream, StreamExt};
//! use pagestream::paginate;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut streams = paginate(
//!         stream::iter([1]),
//!         stream::pending(),
//!         true,
//!         |envelope: &Vec<i32>| envelope.clone(),
//!         |envelope: &Vec<i32>| envelope.last().copied().unwrap_or(0) + 1,
//!         |params: i32| async move { Ok(vec![params]) },
//!         |cursor: i32| async move { Ok(vec![cursor]) },
//!     );
//!
//!     assert_eq!(streams.values().next().await, Some(vec![1]));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! new_requests ─┐                      ┌─> values
//!               ├─> driver task ───────┤
//! next_pages ───┘   (PaginationState)  └─> loading
//!                        │   ▲
//!              FetchFirst │   │ Resolved { generation, .. }
//!              FetchNext  ▼   │
//!                      PageSource
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pagination state machine
pub mod pagination;

/// Page source seam
pub mod source;

/// Async driver
pub mod engine;

/// HTTP client with retry and rate limiting
pub mod http;

/// HTTP pagination strategies
pub mod strategy;

/// Configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use engine::{paginate, PageStreams, Paginator};
pub use error::{Error, Result};
pub use source::{FnSource, PageSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
