//! # Query Store
//!
//! Process-wide keyed cache of asynchronous results.
//!
//! The store implements the read side of the client's CQRS split:
//! mutations go through [`QueryStore::mutate`], which on success marks the
//! statically declared dependent keys stale; reads go through
//! [`QueryStore::read`], which refetches stale entries and serves fresh
//! ones without touching the remote.
//!
//! Concurrency rules:
//! - At most one in-flight fetch per key. Readers arriving while a fetch
//!   is pending park on the event channel and share its outcome.
//! - Commits are guarded by a per-entry generation counter so a fetch
//!   that was overtaken by an invalidation can never clobber the entry.
//! - A failed fetch keeps the last good value visible
//!   (stale-while-revalidate) and surfaces the error only to the caller
//!   that triggered the fetch.

use crate::entry::{Entry, QueryStatus, Snapshot};
use crate::key::{KeyPattern, QueryKey};
use crate::mutation::MutationKind;
use chirp_core::error::ApiError;
use chirp_core::time::Clock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Freshness window applied when a read does not override it.
pub const DEFAULT_STALE_AFTER_MS: u64 = 30_000;

/// Capacity of the commit/invalidation event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Per-read options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// How long a committed value counts as fresh.
    pub stale_after_ms: u64,
    /// Disabled reads return the current snapshot without fetching. Used
    /// while prerequisite state (an unresolved session) would make the
    /// fetch meaningless.
    pub enabled: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            enabled: true,
        }
    }
}

impl ReadOptions {
    pub fn enabled_if(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn with_stale_after(mut self, stale_after_ms: u64) -> Self {
        self.stale_after_ms = stale_after_ms;
        self
    }
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// A fetch result was committed; the entry is fresh.
    Committed,
    /// The entry was marked stale by an invalidation.
    Invalidated,
    /// A fetch failed; the entry carries the error, old value retained.
    FetchFailed,
    /// A fetch result arrived after the entry moved on and was dropped.
    Discarded,
}

/// Change notification delivered to subscribers. Views filter for the
/// keys they depend on and re-read snapshots at their next scheduling
/// point.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
}

/// Keyed cache of asynchronous results with staleness windows, pending
/// coalescing and mutation-driven invalidation.
pub struct QueryStore {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<CacheEvent>,
    clock: Arc<dyn Clock>,
}

impl QueryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
            clock,
        }
    }

    /// Subscribe to change events. Only events sent after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Current snapshot for a key without triggering any fetch.
    pub async fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Snapshot<T> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_else(Snapshot::absent)
    }

    /// Read a key, refetching if the entry is absent, stale or errored.
    ///
    /// Returns the snapshot after any fetch this call performed or joined.
    /// A fetch failure is returned only to the caller whose read triggered
    /// the fetch; parked readers receive the degraded snapshot instead.
    pub async fn read<T, F, Fut>(
        &self,
        key: QueryKey,
        options: ReadOptions,
        fetch: F,
    ) -> Result<Snapshot<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !options.enabled {
            return Ok(self.peek(&key).await);
        }

        let now = self.clock.now_ms().await;
        let generation = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(options.stale_after_ms));

            match entry.status {
                QueryStatus::Pending => {
                    // Subscribe while holding the lock: a commit needs the
                    // write lock, so no event for this key can slip past.
                    let rx = self.events.subscribe();
                    drop(entries);
                    return Ok(self.await_settled(rx, &key).await);
                }
                QueryStatus::Fresh if entry.within_window(now) => {
                    return Ok(entry.snapshot());
                }
                _ => {
                    entry.status = QueryStatus::Pending;
                    entry.stale_after_ms = options.stale_after_ms;
                    entry.generation
                }
            }
        };

        tracing::debug!(key = %key, "fetch started");
        match fetch().await {
            Ok(value) => Ok(self.commit(&key, generation, value).await),
            Err(err) => {
                self.record_failure(&key, generation, &err).await;
                Err(err)
            }
        }
    }

    /// Mark every entry matching the pattern stale. Values are not
    /// evicted: stale data stays visible until replaced.
    pub async fn invalidate(&self, pattern: &KeyPattern) {
        let mut entries = self.entries.write().await;
        for (key, entry) in entries.iter_mut() {
            if !pattern.matches(key) {
                continue;
            }
            entry.generation += 1;
            if entry.status != QueryStatus::Pending {
                // A pending entry keeps its status so concurrent readers
                // stay parked on the single in-flight fetch; the bumped
                // generation forces that fetch's result to be discarded.
                entry.status = QueryStatus::Stale;
            }
            tracing::debug!(key = %key, "invalidated");
            let _ = self.events.send(CacheEvent {
                key: key.clone(),
                kind: CacheEventKind::Invalidated,
            });
        }
    }

    /// Execute a mutation; on success, invalidate the kind's declared
    /// dependency set. On failure nothing is invalidated and the error
    /// propagates to the caller.
    pub async fn mutate<T, F, Fut>(&self, kind: MutationKind, op: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let out = op().await?;
        tracing::debug!(mutation = kind.name(), "mutation confirmed");
        for pattern in kind.invalidates() {
            self.invalidate(&pattern).await;
        }
        Ok(out)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn commit<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        generation: u64,
        value: T,
    ) -> Snapshot<T> {
        let now = self.clock.now_ms().await;
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            // Entries are never removed while a fetch is in flight.
            return Snapshot::absent();
        };

        if entry.generation == generation {
            entry.value = Some(Arc::new(value));
            entry.status = QueryStatus::Fresh;
            entry.last_fetched_at_ms = Some(now);
            entry.last_error = None;
            entry.generation += 1;
            let snapshot = entry.snapshot();
            let _ = self.events.send(CacheEvent {
                key: key.clone(),
                kind: CacheEventKind::Committed,
            });
            snapshot
        } else {
            // Overtaken by an invalidation while in flight: drop the
            // result so it cannot clobber a fresher state, leave the
            // entry stale for the next natural read.
            tracing::debug!(key = %key, "late fetch result discarded");
            if entry.status == QueryStatus::Pending {
                entry.status = QueryStatus::Stale;
            }
            let snapshot = entry.snapshot();
            let _ = self.events.send(CacheEvent {
                key: key.clone(),
                kind: CacheEventKind::Discarded,
            });
            snapshot
        }
    }

    async fn record_failure(&self, key: &QueryKey, generation: u64, err: &ApiError) {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        if entry.generation == generation && entry.status == QueryStatus::Pending {
            entry.status = QueryStatus::Error;
            entry.last_error = Some(err.clone());
            tracing::warn!(key = %key, error = %err, "fetch failed");
            let _ = self.events.send(CacheEvent {
                key: key.clone(),
                kind: CacheEventKind::FetchFailed,
            });
        } else if entry.status == QueryStatus::Pending {
            entry.status = QueryStatus::Stale;
            let _ = self.events.send(CacheEvent {
                key: key.clone(),
                kind: CacheEventKind::Discarded,
            });
        }
    }

    async fn await_settled<T: Send + Sync + 'static>(
        &self,
        mut rx: broadcast::Receiver<CacheEvent>,
        key: &QueryKey,
    ) -> Snapshot<T> {
        loop {
            match rx.recv().await {
                Ok(event) if event.key == *key => {
                    let snapshot = self.peek(key).await;
                    if snapshot.status != QueryStatus::Pending {
                        return snapshot;
                    }
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed events; re-check the entry directly.
                    let snapshot = self.peek(key).await;
                    if snapshot.status != QueryStatus::Pending {
                        return snapshot;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return self.peek(key).await;
                }
            }
        }
    }
}
