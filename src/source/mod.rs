//! Page source module
//!
//! The collaborator seam of the paginator. A [`PageSource`] knows how to
//! fetch the first page for some parameters, how to fetch the page after a
//! cursor, and how to project an envelope into values and the next cursor.
//!
//! - [`FnSource`] - Builds a source from four closures
//! - [`crate::strategy::HttpSource`] - Pages through a JSON REST endpoint

mod fn_source;
mod types;

pub use fn_source::FnSource;
pub use types::PageSource;
