//! Page source trait

use crate::error::Result;
use crate::pagination::Page;
use async_trait::async_trait;

/// Collaborator that produces pages for the paginator
///
/// Fetch failures are reported through `Result`; the paginator treats them
/// as a resolution without an envelope. Retry, backoff and rate limiting are
/// the source's business.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Parameters of a first-page query
    type Params: Send + 'static;
    /// Continuation token
    type Cursor: Clone + Send + 'static;
    /// Raw response for one page
    type Envelope: Send + 'static;
    /// Item of the accumulated result list
    type Value: Clone + Send + 'static;

    /// Fetch the first page for a new request
    async fn fetch_by_params(&self, params: Self::Params) -> Result<Self::Envelope>;

    /// Fetch the page that follows `cursor`
    async fn fetch_by_cursor(&self, cursor: Self::Cursor) -> Result<Self::Envelope>;

    /// Values carried by an envelope
    fn values_of(&self, envelope: &Self::Envelope) -> Vec<Self::Value>;

    /// Cursor derived from an envelope, even one without values
    fn cursor_of(&self, envelope: &Self::Envelope) -> Self::Cursor;

    /// Project an envelope into a page
    fn project(&self, envelope: &Self::Envelope) -> Page<Self::Value, Self::Cursor> {
        Page::new(self.values_of(envelope), self.cursor_of(envelope))
    }
}
