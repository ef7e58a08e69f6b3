//! Next-page computation for each strategy
//!
//! Strategies are stateless: everything needed for the following request is
//! read from the page just fetched (its query, body, headers and progress).

use super::extract::{extract_path, extract_string, parse_link_header};
use super::types::{HttpPage, NextPage, PaginationStrategy, StopCondition};
use crate::types::StringMap;
use std::collections::HashMap;

impl PaginationStrategy {
    /// Query parameters for the first page
    pub fn initial_params(&self) -> StringMap {
        let mut params = HashMap::new();
        match self {
            Self::Offset {
                offset_param,
                limit_param,
                limit,
            } => {
                params.insert(offset_param.clone(), "0".to_string());
                params.insert(limit_param.clone(), limit.to_string());
            }
            Self::PageNumber {
                page_param,
                start_page,
                page_size_param,
                page_size,
            } => {
                params.insert(page_param.clone(), start_page.to_string());
                if let (Some(param), Some(size)) = (page_size_param, page_size) {
                    params.insert(param.clone(), size.to_string());
                }
            }
            Self::None | Self::Cursor { .. } | Self::LinkHeader { .. } | Self::NextUrl { .. } => {}
        }
        params
    }

    /// Locate the page after `page`
    pub fn next_page(&self, page: &HttpPage, stop: &StopCondition) -> NextPage {
        // An empty page exhausts the paginator whatever cursor it carries.
        if matches!(self, Self::None) || page.records.is_empty() || stop.should_stop(page) {
            return NextPage::Done;
        }

        let progress = page.progress;
        let records = page.record_count();

        match self {
            Self::None => NextPage::Done,

            Self::Cursor {
                cursor_param,
                cursor_path,
            } => match extract_string(&page.body, cursor_path) {
                Some(cursor) if !cursor.is_empty() => {
                    let mut params = page.query.clone();
                    params.insert(cursor_param.clone(), cursor);
                    NextPage::with_params(params, progress)
                }
                _ => NextPage::Done,
            },

            Self::Offset {
                offset_param,
                limit_param,
                limit,
            } => {
                if records < *limit as usize {
                    return NextPage::Done;
                }
                let offset = current_number(&page.query, offset_param).unwrap_or(0);
                let mut params = page.query.clone();
                params.insert(offset_param.clone(), (offset + u64::from(*limit)).to_string());
                params.insert(limit_param.clone(), limit.to_string());
                NextPage::with_params(params, progress)
            }

            Self::PageNumber {
                page_param,
                start_page,
                page_size,
                ..
            } => {
                if page_size.is_some_and(|size| records < size as usize) {
                    return NextPage::Done;
                }
                let current = current_number(&page.query, page_param).unwrap_or(u64::from(*start_page));
                let mut params = page.query.clone();
                params.insert(page_param.clone(), (current + 1).to_string());
                NextPage::with_params(params, progress)
            }

            Self::LinkHeader { rel } => page
                .headers
                .get("link")
                .and_then(|v| v.to_str().ok())
                .and_then(|header| parse_link_header(header, rel))
                .map_or(NextPage::Done, |url| NextPage::with_url(url, progress)),

            Self::NextUrl { path } => match extract_string(&page.body, path) {
                Some(url) if !url.is_empty() => NextPage::with_url(url, progress),
                _ => NextPage::Done,
            },
        }
    }
}

impl StopCondition {
    /// Check whether `page` ends its chain
    pub fn should_stop(&self, page: &HttpPage) -> bool {
        match self {
            Self::EmptyPage => page.records.is_empty(),
            Self::Field { path, value } => {
                extract_path(&page.body, path).is_some_and(|found| &found == value)
            }
            Self::TotalCount { path } => extract_string(&page.body, path)
                .and_then(|s| s.parse::<u64>().ok())
                .is_some_and(|total| page.progress.records >= total),
            Self::TotalPages { path } => extract_string(&page.body, path)
                .and_then(|s| s.parse::<u32>().ok())
                .is_some_and(|total| page.progress.pages >= total),
        }
    }
}

fn current_number(query: &StringMap, param: &str) -> Option<u64> {
    query.get(param).and_then(|v| v.parse().ok())
}
