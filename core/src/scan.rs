//! Sequential walk over numeric ids until the collection runs out.
//!
//! # Design
//! Some APIs expose no listing endpoint, only `/users/{id}`. `Fetcher::scan`
//! requests `start, start + 1, ...` one at a time and treats the first 404 as
//! the end of the collection. Any other failure ends the walk too, but is
//! reported in `ScanStop::Failed` together with everything collected before
//! it, never swallowed.

use crate::error::ApiError;
use crate::fetch::{round_trip, Endpoint, Fetcher};
use crate::transport::Transport;
use crate::types::RequestId;

/// Items collected by a scan and why it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<R> {
    pub items: Vec<R>,
    pub stop: ScanStop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStop {
    /// `next_id` answered 404.
    Exhausted { next_id: u64 },
    /// `max_items` were collected; `next_id` was not requested.
    Limit { next_id: u64 },
    /// `id` failed for a reason other than 404.
    Failed { id: RequestId, error: ApiError },
    /// `last_id` was `u64::MAX`; there is no next id to request.
    Overflow { last_id: u64 },
}

impl<T: Transport + ?Sized> Fetcher<T> {
    pub async fn scan<E: Endpoint + ?Sized>(
        &self,
        endpoint: &E,
        start: u64,
        max_items: usize,
    ) -> Scan<E::Output> {
        let mut items = Vec::new();
        let mut next_id = start;

        let stop = loop {
            if items.len() >= max_items {
                break ScanStop::Limit { next_id };
            }
            let id = RequestId::from(next_id);
            match round_trip(self.transport(), endpoint, &id).await {
                Ok(item) => {
                    tracing::debug!(%id, "scan collected item");
                    items.push(item);
                    match next_id.checked_add(1) {
                        Some(id) => next_id = id,
                        None => break ScanStop::Overflow { last_id: next_id },
                    }
                }
                Err(ApiError::NotFound) => break ScanStop::Exhausted { next_id },
                Err(error) => {
                    tracing::warn!(%id, %error, "scan stopped on error");
                    break ScanStop::Failed { id, error };
                }
            }
        };

        tracing::info!(collected = items.len(), ?stop, "scan finished");
        Scan { items, stop }
    }
}
