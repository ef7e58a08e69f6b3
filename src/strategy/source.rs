//! HTTP page source
//!
//! Pages through a JSON REST endpoint using one of the strategies. The cursor
//! is a [`NextPage`]; once a strategy answers `Done`, the next fetch resolves
//! to an empty page without touching the network, which the paginator reads
//! as exhaustion.

use super::extract::extract_records;
use super::types::{HttpPage, NextPage, PaginationStrategy, Progress, StopCondition};
use crate::config::SourceConfig;
use crate::error::{Result, ResultExt};
use crate::http::{HttpClient, RequestConfig};
use crate::source::PageSource;
use crate::types::StringMap;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// A [`PageSource`] backed by an HTTP endpoint
#[derive(Debug)]
pub struct HttpSource {
    client: HttpClient,
    url: String,
    params: StringMap,
    records_path: Option<String>,
    strategy: PaginationStrategy,
    stop_condition: StopCondition,
}

impl HttpSource {
    /// Build a source from its configuration
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::with_config(config.http.to_client_config(&config.headers))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            params: config.params.clone(),
            records_path: config.records_path.clone(),
            strategy: config.pagination.clone(),
            stop_condition: config.stop_condition.clone(),
        })
    }

    /// Build a source around an existing client
    pub fn with_client(client: HttpClient, url: impl Into<String>, strategy: PaginationStrategy) -> Self {
        Self {
            client,
            url: url.into(),
            params: StringMap::new(),
            records_path: None,
            strategy,
            stop_condition: StopCondition::default(),
        }
    }

    /// Set the records path
    #[must_use]
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Set the stop condition
    #[must_use]
    pub fn stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_condition = condition;
        self
    }

    /// Add a parameter sent with every first-page request
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Endpoint of the first page
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Active strategy
    pub fn strategy(&self) -> &PaginationStrategy {
        &self.strategy
    }

    async fn fetch(&self, url: &str, query: StringMap, before: Progress) -> Result<HttpPage> {
        debug!(
            "Fetching {} (strategy: {}, page {})",
            url,
            self.strategy.name(),
            before.pages + 1
        );

        let response = self
            .client
            .get_json_response(url, RequestConfig::new().queries(&query))
            .await?;
        let records = extract_records(&response.body, self.records_path.as_deref())
            .with_context(|| format!("Failed to extract records from {url}"))?;
        let progress = before.advance(records.len());

        debug!("Fetched {} records from {}", records.len(), url);

        Ok(HttpPage {
            url: url.to_string(),
            query,
            body: response.body,
            headers: response.headers,
            records,
            progress,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    type Params = StringMap;
    type Cursor = NextPage;
    type Envelope = HttpPage;
    type Value = Value;

    async fn fetch_by_params(&self, params: StringMap) -> Result<HttpPage> {
        let mut query = self.strategy.initial_params();
        query.extend(self.params.clone());
        query.extend(params);
        self.fetch(&self.url, query, Progress::default()).await
    }

    async fn fetch_by_cursor(&self, cursor: NextPage) -> Result<HttpPage> {
        match cursor {
            NextPage::Done => Ok(HttpPage::empty(&self.url, Progress::default())),
            NextPage::Continue {
                query_params,
                url,
                progress,
            } => {
                let url = url.unwrap_or_else(|| self.url.clone());
                self.fetch(&url, query_params, progress).await
            }
        }
    }

    fn values_of(&self, envelope: &HttpPage) -> Vec<Value> {
        envelope.records.clone()
    }

    fn cursor_of(&self, envelope: &HttpPage) -> NextPage {
        self.strategy.next_page(envelope, &self.stop_condition)
    }
}
