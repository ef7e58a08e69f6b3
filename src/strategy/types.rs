//! Strategy types
//!
//! `NextPage` is the cursor the HTTP source hands to the paginator; `HttpPage`
//! is its envelope.

use crate::error::{Error, Result};
use crate::types::StringMap;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Position within one chain of pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Pages fetched so far, this one included
    pub pages: u32,
    /// Records fetched so far, this page included
    pub records: u64,
}

impl Progress {
    /// Progress after one more page of `records` records
    #[must_use]
    pub fn advance(self, records: usize) -> Self {
        Self {
            pages: self.pages.saturating_add(1),
            records: self.records.saturating_add(records as u64),
        }
    }
}

/// Where the next page lives
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// More pages available
    Continue {
        /// Complete query for the next request
        query_params: StringMap,
        /// Replacement URL (link header / next URL strategies)
        url: Option<String>,
        /// Progress carried into the next page
        progress: Progress,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: StringMap, progress: Progress) -> Self {
        Self::Continue {
            query_params: params,
            url: None,
            progress,
        }
    }

    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>, progress: Progress) -> Self {
        Self::Continue {
            query_params: HashMap::new(),
            url: Some(url.into()),
            progress,
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct HttpPage {
    /// URL the page was requested from, without the query
    pub url: String,
    /// Query the page was requested with
    pub query: StringMap,
    /// Parsed response body
    pub body: Value,
    /// Response headers
    pub headers: HeaderMap,
    /// Records extracted from the body
    pub records: Vec<Value>,
    /// Progress including this page
    pub progress: Progress,
}

impl HttpPage {
    /// A page that was never requested: no records, no headers
    pub fn empty(url: impl Into<String>, progress: Progress) -> Self {
        Self {
            url: url.into(),
            query: HashMap::new(),
            body: Value::Null,
            headers: HeaderMap::new(),
            records: Vec::new(),
            progress,
        }
    }

    /// Number of records on this page
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// How the next page of an endpoint is located
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// Single page
    #[default]
    None,

    /// Cursor taken from the body (e.g. Stripe `starting_after`)
    Cursor {
        /// Query parameter name for the cursor
        cursor_param: String,
        /// Path of the cursor in the response body
        cursor_path: String,
    },

    /// Offset and limit parameters
    Offset {
        /// Query parameter name for offset
        offset_param: String,
        /// Query parameter name for limit
        limit_param: String,
        /// Number of records per page
        limit: u32,
    },

    /// Page number parameter
    PageNumber {
        /// Query parameter name for page number
        page_param: String,
        /// First page number (usually 0 or 1)
        #[serde(default = "default_start_page")]
        start_page: u32,
        /// Optional page size parameter name
        #[serde(default)]
        page_size_param: Option<String>,
        /// Page size value
        #[serde(default)]
        page_size: Option<u32>,
    },

    /// RFC 8288 `Link` header
    LinkHeader {
        /// Rel value to follow
        #[serde(default = "default_rel")]
        rel: String,
    },

    /// Next page URL in the response body
    NextUrl {
        /// Path of the URL in the response body
        path: String,
    },
}

fn default_start_page() -> u32 {
    1
}

fn default_rel() -> String {
    "next".to_string()
}

impl PaginationStrategy {
    /// Create cursor pagination
    pub fn cursor(cursor_param: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self::Cursor {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
        }
    }

    /// Create offset pagination
    pub fn offset(offset_param: impl Into<String>, limit_param: impl Into<String>, limit: u32) -> Self {
        Self::Offset {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
            limit,
        }
    }

    /// Create page number pagination
    pub fn page_number(page_param: impl Into<String>, start_page: u32) -> Self {
        Self::PageNumber {
            page_param: page_param.into(),
            start_page,
            page_size_param: None,
            page_size: None,
        }
    }

    /// Create link header pagination
    pub fn link_header(rel: impl Into<String>) -> Self {
        Self::LinkHeader { rel: rel.into() }
    }

    /// Create next URL pagination
    pub fn next_url(path: impl Into<String>) -> Self {
        Self::NextUrl { path: path.into() }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cursor { .. } => "cursor",
            Self::Offset { .. } => "offset",
            Self::PageNumber { .. } => "page_number",
            Self::LinkHeader { .. } => "link_header",
            Self::NextUrl { .. } => "next_url",
        }
    }

    /// Check that every required name is present
    pub fn validate(&self) -> Result<()> {
        fn required(field: &str, value: &str) -> Result<()> {
            if value.trim().is_empty() {
                Err(Error::missing_field(format!("source.pagination.{field}")))
            } else {
                Ok(())
            }
        }

        match self {
            Self::None => Ok(()),
            Self::Cursor {
                cursor_param,
                cursor_path,
            } => {
                required("cursor_param", cursor_param)?;
                required("cursor_path", cursor_path)
            }
            Self::Offset {
                offset_param,
                limit_param,
                limit,
            } => {
                required("offset_param", offset_param)?;
                required("limit_param", limit_param)?;
                if *limit == 0 {
                    return Err(Error::invalid_value(
                        "source.pagination.limit",
                        "must be greater than 0",
                    ));
                }
                Ok(())
            }
            Self::PageNumber {
                page_param,
                page_size_param,
                page_size,
                ..
            } => {
                required("page_param", page_param)?;
                match (page_size_param, page_size) {
                    (_, Some(0)) => Err(Error::invalid_value(
                        "source.pagination.page_size",
                        "must be greater than 0",
                    )),
                    (Some(_), None) => Err(Error::missing_field("source.pagination.page_size")),
                    _ => Ok(()),
                }
            }
            Self::LinkHeader { rel } => required("rel", rel),
            Self::NextUrl { path } => required("path", path),
        }
    }
}

/// Condition that ends a chain of pages early
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopCondition {
    /// Stop when a page has no records
    #[default]
    EmptyPage,

    /// Stop when a body field has a specific value
    Field {
        /// Path to the field
        path: String,
        /// Value that ends pagination
        value: Value,
    },

    /// Stop once the records fetched reach a total from the body
    TotalCount {
        /// Path to the total count field
        path: String,
    },

    /// Stop once the pages fetched reach a page total from the body
    TotalPages {
        /// Path to the total pages field
        path: String,
    },
}

impl StopCondition {
    /// Create a field-based stop condition
    pub fn field(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Create a total count stop condition
    pub fn total_count(path: impl Into<String>) -> Self {
        Self::TotalCount { path: path.into() }
    }

    /// Create a total pages stop condition
    pub fn total_pages(path: impl Into<String>) -> Self {
        Self::TotalPages { path: path.into() }
    }
}
