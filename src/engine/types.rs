//! Engine types
//!
//! Output handles returned by a running paginator.

use crate::error::{Error, Result};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Stream of accumulated values snapshots
pub type ValuesStream<V> = UnboundedReceiverStream<Vec<V>>;

/// Stream of loading flags
pub type LoadingStream = UnboundedReceiverStream<bool>;

/// The two output streams of a running paginator
///
/// Neither stream carries an initial value. Both end once the driver task
/// stops: after both inputs have ended and the fetch of the live request (if
/// any) has resolved, or as soon as both streams are dropped. Fetches of
/// superseded requests never hold the streams open.
#[derive(Debug)]
pub struct PageStreams<V> {
    values: ValuesStream<V>,
    loading: LoadingStream,
    handle: JoinHandle<()>,
}

impl<V> PageStreams<V> {
    pub(crate) fn new(values: ValuesStream<V>, loading: LoadingStream, handle: JoinHandle<()>) -> Self {
        Self {
            values,
            loading,
            handle,
        }
    }

    /// Values snapshots
    ///
    /// One per resolution that adds values, replaces them or first
    /// establishes them, plus the empty snapshot of a clear. A first page
    /// equal to what is already visible is still emitted.
    pub fn values(&mut self) -> &mut ValuesStream<V> {
        &mut self.values
    }

    /// Loading flags, strictly alternating and starting with `true`
    pub fn loading(&mut self) -> &mut LoadingStream {
        &mut self.loading
    }

    /// Split into the two streams, detaching the driver task
    pub fn into_streams(self) -> (ValuesStream<V>, LoadingStream) {
        (self.values, self.loading)
    }

    /// Split into the two streams and the driver task handle
    pub fn into_parts(self) -> (ValuesStream<V>, LoadingStream, JoinHandle<()>) {
        (self.values, self.loading, self.handle)
    }

    /// Stop the driver task; outstanding fetches are dropped
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Check if the driver task has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the driver task to stop
    pub async fn join(self) -> Result<()> {
        self.handle
            .await
            .map_err(|e| Error::stopped(format!("driver task failed: {e}")))
    }
}
