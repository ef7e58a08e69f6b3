//! HTTP pagination strategies
//!
//! Supports: Cursor, Offset, Page Number, Link Header, Next URL
//!
//! # Overview
//!
//! A strategy turns one fetched [`HttpPage`] into the [`NextPage`] cursor the
//! paginator stores. [`HttpSource`] wires a strategy, a stop condition and
//! the HTTP client into a [`crate::source::PageSource`].

mod extract;
mod source;
mod strategies;
mod types;

pub use extract::{extract_path, extract_records, extract_string, parse_link_header};
pub use source::HttpSource;
pub use types::{HttpPage, NextPage, PaginationStrategy, Progress, StopCondition};
