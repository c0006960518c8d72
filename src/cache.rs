//! Keyed cache of server-derived data.
//!
//! Reads are memoized per `QueryKey`; concurrent reads of a key share one in-flight fetch;
//! mutations never touch the cache themselves, callers invalidate the keys listed for the
//! mutation in `invalidation`. Every fetch is stamped with a generation and its result is
//! dropped if the key was invalidated (or the cache cleared) while it was in flight.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ApiError;
use crate::invalidation::Mutation;

// --- Keys ---

/// One primitive component of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Text(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyPart::Null, Into::into)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(text) => write!(f, "{text:?}"),
            KeyPart::Int(value) => write!(f, "{value}"),
            KeyPart::Bool(value) => write!(f, "{value}"),
            KeyPart::Null => f.write_str("null"),
        }
    }
}

/// QueryKey
///
/// Ordered tuple identifying a cached dataset: the resource name first, then its
/// parameters, e.g. `("feedback", 7)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self(vec![KeyPart::from(resource)])
    }

    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn resource(&self) -> Option<&str> {
        match self.0.first() {
            Some(KeyPart::Text(resource)) => Some(resource),
            _ => None,
        }
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, part) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{part}")?;
        }
        f.write_str(")")
    }
}

/// The keys the client reads under.
pub mod keys {
    use super::QueryKey;

    pub fn sessions() -> QueryKey {
        QueryKey::new("sessions")
    }

    pub fn my_registrations() -> QueryKey {
        QueryKey::new("my-registrations")
    }

    pub fn my_proposals() -> QueryKey {
        QueryKey::new("my-proposals")
    }

    pub fn proposals() -> QueryKey {
        QueryKey::new("proposals")
    }

    pub fn admin_users() -> QueryKey {
        QueryKey::new("admin-users")
    }

    /// `("feedback", null)` while no session is selected.
    pub fn feedback(session_id: Option<i64>) -> QueryKey {
        QueryKey::new("feedback").with(session_id)
    }

    pub fn user_profile(username: &str) -> QueryKey {
        QueryKey::new("user-profile").with(username)
    }
}

// --- Entries ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Error,
    Ready,
}

/// Entry
///
/// A snapshot of one cached dataset. `data` may be stale (kept across invalidations and
/// failed refetches); only `ready_data` is to be trusted.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub key: QueryKey,
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
    /// Invalidated since `data` was fetched.
    pub stale: bool,
}

impl<T> Entry<T> {
    pub fn ready_data(&self) -> Option<&T> {
        match self.status {
            QueryStatus::Ready => self.data.as_deref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

// --- Cache ---

type Payload = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<Payload, ApiError>;
type InFlight = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Default)]
struct Slot {
    data: Option<Payload>,
    status: QueryStatus,
    error: Option<ApiError>,
    stale: bool,
    // Generation of the fetch whose result this slot will accept.
    generation: u64,
    in_flight: Option<InFlight>,
}

impl Slot {
    fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Entry<T> {
        let data = self
            .data
            .clone()
            .and_then(|payload| payload.downcast::<T>().ok());
        if self.data.is_some() && data.is_none() {
            tracing::warn!(%key, "cached data has a different type than requested");
        }
        Entry {
            key: key.clone(),
            data,
            status: self.status,
            error: self.error.clone(),
            stale: self.stale,
        }
    }

    fn is_fresh(&self) -> bool {
        self.status == QueryStatus::Ready && !self.stale
    }
}

#[derive(Default)]
struct Inner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    // Process-wide so a slot recreated after `clear` never matches an older fetch.
    next_generation: AtomicU64,
}

impl Inner {
    fn complete(&self, key: &QueryKey, generation: u64, outcome: FetchOutcome) {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.get_mut(key) else {
            tracing::debug!(%key, "cache cleared during fetch; dropping result");
            return;
        };
        if slot.generation != generation {
            tracing::debug!(
                %key,
                generation,
                current = slot.generation,
                "discarding superseded fetch"
            );
            return;
        }

        slot.in_flight = None;
        match outcome {
            Ok(data) => {
                slot.data = Some(data);
                slot.status = QueryStatus::Ready;
                slot.error = None;
                slot.stale = false;
                tracing::debug!(%key, "fetch complete");
            }
            Err(error) => {
                tracing::warn!(%key, %error, "fetch failed");
                slot.status = QueryStatus::Error;
                slot.error = Some(error);
            }
        }
    }
}

/// QueryCache
///
/// Shared handle; clones see the same entries.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// read
    ///
    /// - `enabled == false`: no fetch; the entry is created idle if new and returned as is.
    /// - fresh ready entry: returned without a fetch.
    /// - fetch in flight: waits for that same fetch.
    /// - otherwise (idle, error, stale): starts a fetch and waits for it.
    ///
    /// `fetcher` is called under the cache lock and must only build the future. The fetch
    /// runs on its own task, so dropping the returned future does not abort it. If the key
    /// is invalidated while the fetch is in flight, the snapshot returned is the current
    /// (stale) state and the next read fetches again.
    pub async fn read<T, F, Fut>(&self, key: QueryKey, fetcher: F, enabled: bool) -> Entry<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let waiter = {
            let mut slots = self.inner.slots.lock();
            let slot = slots.entry(key.clone()).or_default();

            if !enabled {
                return slot.snapshot(&key);
            }
            if slot.is_fresh() {
                tracing::debug!(%key, "cache hit");
                return slot.snapshot(&key);
            }
            match &slot.in_flight {
                Some(in_flight) => {
                    tracing::debug!(%key, "joining in-flight fetch");
                    in_flight.clone()
                }
                None => self.start_fetch(&key, slot, fetcher()),
            }
        };

        let _ = waiter.await;
        self.snapshot(&key)
    }

    fn start_fetch<T, Fut>(&self, key: &QueryKey, slot: &mut Slot, fetch: Fut) -> InFlight
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        slot.generation = generation;
        slot.status = QueryStatus::Loading;
        tracing::debug!(%key, generation, "fetching");

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            // A panicking fetcher must still settle the slot, or the key stays loading.
            let outcome: FetchOutcome = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result.map(|data| Arc::new(data) as Payload),
                Err(_) => {
                    tracing::error!(key = %task_key, "fetcher panicked");
                    Err(ApiError::network("fetch panicked"))
                }
            };
            inner.complete(&task_key, generation, outcome.clone());
            outcome
        });

        let inner = Arc::clone(&self.inner);
        let waiter_key = key.clone();
        let in_flight = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(error) => {
                    let outcome: FetchOutcome =
                        Err(ApiError::network(format!("fetch task failed: {error}")));
                    inner.complete(&waiter_key, generation, outcome.clone());
                    outcome
                }
            }
        }
        .boxed()
        .shared();
        slot.in_flight = Some(in_flight.clone());
        in_flight
    }

    /// Current state of `key` without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Entry<T>> {
        self.inner.slots.lock().get(key).map(|slot| slot.snapshot(key))
    }

    fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Entry<T> {
        self.peek(key).unwrap_or_else(|| Entry {
            key: key.clone(),
            data: None,
            status: QueryStatus::Idle,
            error: None,
            stale: false,
        })
    }

    /// invalidate
    ///
    /// Marks the entry stale without dropping its data. A fetch still in flight is
    /// disowned: its result will be discarded and the next read fetches again.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.inner.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            Self::invalidate_slot(key, slot);
        }
    }

    /// Invalidates every key whose resource name is `resource`, whatever its parameters.
    pub fn invalidate_resource(&self, resource: &str) {
        let mut slots = self.inner.slots.lock();
        for (key, slot) in slots.iter_mut() {
            if key.resource() == Some(resource) {
                Self::invalidate_slot(key, slot);
            }
        }
    }

    fn invalidate_slot(key: &QueryKey, slot: &mut Slot) {
        slot.stale = true;
        // Nothing will match this generation any more.
        slot.generation = 0;
        if slot.in_flight.take().is_some() {
            slot.status = if slot.data.is_some() {
                QueryStatus::Ready
            } else {
                QueryStatus::Idle
            };
        }
        tracing::debug!(%key, "invalidated");
    }

    /// Drops every entry. In-flight fetches finish into the void.
    pub fn clear(&self) {
        self.inner.slots.lock().clear();
        tracing::debug!("cache cleared");
    }

    /// mutate
    ///
    /// Runs a one-off write. The cache is left untouched whatever the outcome.
    pub async fn mutate<T, Fut>(&self, fetch: Fut) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = fetch.await;
        if let Err(error) = &result {
            tracing::warn!(%error, "mutation failed");
        }
        result
    }

    /// mutate_and_invalidate
    ///
    /// Runs the write, then invalidates every key `mutation` affects. A failed write
    /// invalidates nothing.
    pub async fn mutate_and_invalidate<T, Fut>(
        &self,
        mutation: &Mutation,
        fetch: Fut,
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let value = self.mutate(fetch).await?;
        for key in mutation.invalidates() {
            self.invalidate(&key);
        }
        Ok(value)
    }
}
