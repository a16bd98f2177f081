//! Concurrent fan-out of independent requests with ordered result collection.
//!
//! # Design
//! `Fetcher::fetch_all` spawns one tokio task per id. The join handles are
//! kept in input order and joined as a whole, so slot `i` of the returned
//! `ResultSet` always belongs to id `i` no matter which response arrives
//! first. Each task owns its slot outright (it hands the value back through
//! its handle), so no lock guards the buffer.
//!
//! A failed round trip, a cancelled unit and a panicking unit all end up as
//! an `Err` in their own slot. Nothing short-circuits the barrier.

use std::slice;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{ApiError, FetchError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::RequestId;

/// A resource addressable by `RequestId`: how to ask for it and how to read
/// the answer.
pub trait Endpoint: Send + Sync + 'static {
    type Output: Send + 'static;

    fn request(&self, id: &RequestId) -> Result<HttpRequest, ApiError>;

    fn decode(&self, response: HttpResponse) -> Result<Self::Output, ApiError>;
}

pub type FetchResult<R> = Result<R, FetchError>;

/// Results of one fan-out, index-aligned with the ids that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet<R> {
    slots: Vec<FetchResult<R>>,
}

impl<R> ResultSet<R> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&FetchResult<R>> {
        self.slots.get(slot)
    }

    pub fn iter(&self) -> slice::Iter<'_, FetchResult<R>> {
        self.slots.iter()
    }

    /// Successful slots with their positions.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &R)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, result)| result.as_ref().ok().map(|value| (slot, value)))
    }

    /// Failed slots with their positions.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &FetchError)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, result)| result.as_ref().err().map(|error| (slot, error)))
    }

    /// True when there was at least one slot and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Result::is_err)
    }

    pub fn into_vec(self) -> Vec<FetchResult<R>> {
        self.slots
    }
}

impl<R> From<Vec<FetchResult<R>>> for ResultSet<R> {
    fn from(slots: Vec<FetchResult<R>>) -> Self {
        Self { slots }
    }
}

impl<R> IntoIterator for ResultSet<R> {
    type Item = FetchResult<R>;
    type IntoIter = std::vec::IntoIter<FetchResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a ResultSet<R> {
    type Item = &'a FetchResult<R>;
    type IntoIter = slice::Iter<'a, FetchResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Fans requests out over one shared transport.
///
/// Cheap to clone; clones share the transport.
#[derive(Debug)]
pub struct Fetcher<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: ?Sized> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport + ?Sized> Fetcher<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every id concurrently and wait for all of them.
    ///
    /// Must be called from within a tokio runtime. Returns an empty set for
    /// empty input without spawning anything.
    pub async fn fetch_all<E: Endpoint>(
        &self,
        endpoint: &Arc<E>,
        ids: &[RequestId],
    ) -> ResultSet<E::Output> {
        self.fan_out(endpoint, ids, None).await
    }

    /// Like `fetch_all`, but units still in flight when `cancel` fires stop
    /// waiting on the network and record `FetchError::Cancelled`.
    pub async fn fetch_all_with_cancel<E: Endpoint>(
        &self,
        endpoint: &Arc<E>,
        ids: &[RequestId],
        cancel: &CancellationToken,
    ) -> ResultSet<E::Output> {
        self.fan_out(endpoint, ids, Some(cancel)).await
    }

    /// Fetch a single id on the current task.
    pub async fn fetch_one<E: Endpoint>(
        &self,
        endpoint: &E,
        id: &RequestId,
    ) -> Result<E::Output, ApiError> {
        round_trip(&*self.transport, endpoint, id).await
    }

    async fn fan_out<E: Endpoint>(
        &self,
        endpoint: &Arc<E>,
        ids: &[RequestId],
        cancel: Option<&CancellationToken>,
    ) -> ResultSet<E::Output> {
        if ids.is_empty() {
            return ResultSet { slots: Vec::new() };
        }
        tracing::debug!(units = ids.len(), "starting fan-out");

        let mut handles: Vec<JoinHandle<FetchResult<E::Output>>> = Vec::with_capacity(ids.len());
        for (slot, id) in ids.iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let endpoint = Arc::clone(endpoint);
            let cancel = cancel.cloned();
            let id = id.clone();
            let span = tracing::debug_span!("fetch", slot, id = %id);

            let unit = async move {
                let outcome = match cancel {
                    Some(token) => tokio::select! {
                        biased;
                        () = token.cancelled() => Err(FetchError::Cancelled),
                        result = round_trip(&*transport, &*endpoint, &id) => result.map_err(FetchError::from),
                    },
                    None => round_trip(&*transport, &*endpoint, &id)
                        .await
                        .map_err(FetchError::from),
                };
                match &outcome {
                    Ok(_) => tracing::debug!("unit completed"),
                    Err(error) => tracing::warn!(%error, "unit failed"),
                }
                outcome
            };
            handles.push(tokio::spawn(unit.instrument(span)));
        }

        // Join barrier: every handle is awaited; order follows `handles`.
        let slots = futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(slot, joined)| {
                joined.unwrap_or_else(|e| {
                    tracing::error!(slot, error = %e, "unit of work did not complete");
                    Err(FetchError::Aborted(e.to_string()))
                })
            })
            .collect::<Vec<_>>();

        let results = ResultSet { slots };
        tracing::debug!(
            units = results.len(),
            failed = results.failures().count(),
            "fan-out joined"
        );
        results
    }
}

/// Execute one prepared request and hand the response to `parse`.
///
/// The single-shot counterpart of a fan-out unit, used for POST and DELETE.
pub async fn execute<T, R, P>(transport: &T, request: HttpRequest, parse: P) -> Result<R, ApiError>
where
    T: Transport + ?Sized,
    P: FnOnce(HttpResponse) -> Result<R, ApiError>,
{
    let method = request.method.as_str();
    let url = request.url.clone();
    let response = transport.execute(request).await?;
    tracing::debug!(method, %url, status = response.status, "round trip finished");
    parse(response)
}

pub(crate) async fn round_trip<T, E>(transport: &T, endpoint: &E, id: &RequestId) -> Result<E::Output, ApiError>
where
    T: Transport + ?Sized,
    E: Endpoint + ?Sized,
{
    let request = endpoint.request(id)?;
    execute(transport, request, |response| endpoint.decode(response)).await
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::client::UserClient;
    use crate::testing::StubTransport;
    use crate::types::User;

    fn ids(raw: &[&str]) -> Vec<RequestId> {
        raw.iter().map(|id| RequestId::from(*id)).collect()
    }

    fn user(name: &str) -> User {
        User {
            name: name.to_string(),
        }
    }

    fn users() -> Arc<UserClient> {
        Arc::new(UserClient::new("http://stub"))
    }

    #[tokio::test]
    async fn fetch_all_returns_users_in_input_order() {
        let stub = StubTransport::new().user("1").user("2").user("3");
        let fetcher = Fetcher::new(Arc::new(stub));

        let results = fetcher.fetch_all(&users(), &ids(&["1", "2", "3"])).await;

        assert_eq!(
            results.into_vec(),
            vec![Ok(user("User-1")), Ok(user("User-2")), Ok(user("User-3"))]
        );
    }

    #[tokio::test]
    async fn one_slot_per_id_including_duplicates() {
        let stub = StubTransport::new().user("4").user("9");
        let fetcher = Fetcher::new(Arc::new(stub));
        let input = ids(&["4", "9", "4", "missing", "9"]);

        let results = fetcher.fetch_all(&users(), &input).await;

        assert_eq!(results.len(), input.len());
        assert_eq!(results.get(2), Some(&Ok(user("User-4"))));
        assert_eq!(results.get(4), Some(&Ok(user("User-9"))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_first_id_keeps_slot_zero() {
        let stub = Arc::new(
            StubTransport::new()
                .user("1")
                .user("2")
                .delay("1", Duration::from_millis(150)),
        );
        let fetcher = Fetcher::new(Arc::clone(&stub));

        let results = fetcher.fetch_all(&users(), &ids(&["1", "2"])).await;

        assert_eq!(stub.completed(), vec!["2".to_string(), "1".to_string()]);
        assert_eq!(results.get(0), Some(&Ok(user("User-1"))));
        assert_eq!(results.get(1), Some(&Ok(user("User-2"))));
    }

    #[tokio::test]
    async fn not_found_is_confined_to_its_slot() {
        let stub = StubTransport::new().user("1");
        let fetcher = Fetcher::new(Arc::new(stub));

        let results = fetcher.fetch_all(&users(), &ids(&["1", "bad"])).await;

        assert_eq!(results.get(0), Some(&Ok(user("User-1"))));
        assert!(results.get(1).unwrap().as_ref().unwrap_err().is_not_found());
        assert!(!results.all_failed());
    }

    #[tokio::test]
    async fn malformed_body_is_confined_to_its_slot() {
        let stub = StubTransport::new()
            .user("1")
            .respond("2", 200, r#"{"nom":"wrong shape"}"#)
            .user("3");
        let fetcher = Fetcher::new(Arc::new(stub));

        let results = fetcher.fetch_all(&users(), &ids(&["1", "2", "3"])).await;

        let failures: Vec<_> = results.failures().map(|(slot, _)| slot).collect();
        assert_eq!(failures, vec![1]);
        assert!(matches!(
            results.get(1),
            Some(Err(FetchError::Api(ApiError::Deserialization(_))))
        ));
        assert_eq!(results.successes().count(), 2);
    }

    #[tokio::test]
    async fn every_slot_failing_still_returns() {
        let stub = StubTransport::new().respond("x", 500, "boom");
        let fetcher = Fetcher::new(Arc::new(stub));

        let results = fetcher.fetch_all(&users(), &ids(&["x", "y"])).await;

        assert_eq!(results.len(), 2);
        assert!(results.all_failed());
        assert_eq!(
            results.get(0),
            Some(&Err(FetchError::Api(ApiError::Http {
                status: 500,
                body: "boom".to_string()
            })))
        );
    }

    #[tokio::test]
    async fn repeated_fetches_are_equal() {
        let stub = StubTransport::new().user("1").user("2");
        let fetcher = Fetcher::new(Arc::new(stub));
        let input = ids(&["2", "nope", "1"]);

        let first = fetcher.fetch_all(&users(), &input).await;
        let second = fetcher.fetch_all(&users(), &input).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_set() {
        let stub = Arc::new(StubTransport::new());
        let fetcher = Fetcher::new(Arc::clone(&stub));

        let results = fetcher.fetch_all(&users(), &[]).await;

        assert!(results.is_empty());
        assert!(!results.all_failed());
        assert!(stub.completed().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_stops_waiting_on_slow_units() {
        let stub = StubTransport::new()
            .user("1")
            .user("2")
            .delay("2", Duration::from_secs(30));
        let fetcher = Fetcher::new(Arc::new(stub));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let results = fetcher
            .fetch_all_with_cancel(&users(), &ids(&["1", "2"]), &token)
            .await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(results.get(0), Some(&Ok(user("User-1"))));
        assert_eq!(results.get(1), Some(&Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_token_cancels_every_unit() {
        let stub = StubTransport::new().user("1").user("2");
        let fetcher = Fetcher::new(Arc::new(stub));
        let token = CancellationToken::new();
        token.cancel();

        let results = fetcher
            .fetch_all_with_cancel(&users(), &ids(&["1", "2"]), &token)
            .await;

        assert!(results.iter().all(|slot| slot == &Err(FetchError::Cancelled)));
    }

    struct PanicsOn(&'static str);

    impl Endpoint for PanicsOn {
        type Output = String;

        fn request(&self, id: &RequestId) -> Result<HttpRequest, ApiError> {
            if id.as_str() == self.0 {
                panic!("endpoint refused {id}");
            }
            Ok(HttpRequest::get(format!("http://stub/users/{id}")))
        }

        fn decode(&self, response: HttpResponse) -> Result<String, ApiError> {
            Ok(response.body)
        }
    }

    #[tokio::test]
    async fn panicking_unit_is_recorded_as_aborted() {
        let stub = StubTransport::new().user("1");
        let fetcher = Fetcher::new(Arc::new(stub));

        let results = fetcher
            .fetch_all(&Arc::new(PanicsOn("2")), &ids(&["1", "2"]))
            .await;

        assert!(results.get(0).unwrap().is_ok());
        assert!(matches!(results.get(1), Some(Err(FetchError::Aborted(_)))));
    }

    #[tokio::test]
    async fn fetch_one_uses_the_shared_transport() {
        let stub = StubTransport::new().user("7");
        let fetcher = Fetcher::new(Arc::new(stub));

        let found = fetcher.fetch_one(&*users(), &RequestId::from("7")).await;
        let missing = fetcher.fetch_one(&*users(), &RequestId::from("8")).await;

        assert_eq!(found, Ok(user("User-7")));
        assert_eq!(missing, Err(ApiError::NotFound));
    }

    #[tokio::test]
    async fn dyn_transport_is_accepted() {
        let transport: Arc<dyn Transport> = Arc::new(StubTransport::new().user("1"));
        let fetcher = Fetcher::new(transport);

        let results = fetcher.fetch_all(&users(), &ids(&["1"])).await;

        assert_eq!(results.into_vec(), vec![Ok(user("User-1"))]);
    }
}
