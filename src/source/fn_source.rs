//! Closure-backed page source

use super::types::PageSource;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// A [`PageSource`] assembled from plain functions
///
/// ```rust,ignore
/// let source = FnSource::new(
///     |envelope: &Vec<i32>| envelope.clone(),
///     |envelope: &Vec<i32>| envelope.last().copied().unwrap_or(0) + 1,
///     |params: i32| async move { Ok(vec![params]) },
///     |cursor: i32| async move { Ok(if cursor <= 2 { vec![cursor] } else { vec![] }) },
/// );
/// ```
pub struct FnSource<P, C, E, V, VO, CO, FP, FC> {
    values_of: VO,
    cursor_of: CO,
    fetch_by_params: FP,
    fetch_by_cursor: FC,
    _types: PhantomData<fn(P, C) -> (E, V)>,
}

impl<P, C, E, V, VO, CO, FP, FC> FnSource<P, C, E, V, VO, CO, FP, FC> {
    /// Create a source from two projections and two fetch functions
    pub fn new<FutP, FutC>(
        values_of: VO,
        cursor_of: CO,
        fetch_by_params: FP,
        fetch_by_cursor: FC,
    ) -> Self
    where
        VO: Fn(&E) -> Vec<V>,
        CO: Fn(&E) -> C,
        FP: Fn(P) -> FutP,
        FutP: Future<Output = Result<E>>,
        FC: Fn(C) -> FutC,
        FutC: Future<Output = Result<E>>,
    {
        Self {
            values_of,
            cursor_of,
            fetch_by_params,
            fetch_by_cursor,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<P, C, E, V, VO, CO, FP, FutP, FC, FutC> PageSource for FnSource<P, C, E, V, VO, CO, FP, FC>
where
    P: Send + 'static,
    C: Clone + Send + 'static,
    E: Send + 'static,
    V: Clone + Send + 'static,
    VO: Fn(&E) -> Vec<V> + Send + Sync + 'static,
    CO: Fn(&E) -> C + Send + Sync + 'static,
    FP: Fn(P) -> FutP + Send + Sync + 'static,
    FutP: Future<Output = Result<E>> + Send + 'static,
    FC: Fn(C) -> FutC + Send + Sync + 'static,
    FutC: Future<Output = Result<E>> + Send + 'static,
{
    type Params = P;
    type Cursor = C;
    type Envelope = E;
    type Value = V;

    async fn fetch_by_params(&self, params: P) -> Result<E> {
        (self.fetch_by_params)(params).await
    }

    async fn fetch_by_cursor(&self, cursor: C) -> Result<E> {
        (self.fetch_by_cursor)(cursor).await
    }

    fn values_of(&self, envelope: &E) -> Vec<V> {
        (self.values_of)(envelope)
    }

    fn cursor_of(&self, envelope: &E) -> C {
        (self.cursor_of)(envelope)
    }
}

impl<P, C, E, V, VO, CO, FP, FC> fmt::Debug for FnSource<P, C, E, V, VO, CO, FP, FC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}
