//! Cache entries and the snapshots handed to readers.

use chirp_core::error::ApiError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    /// A fetch is in flight. Any previously committed value stays visible.
    Pending,
    /// Committed within its freshness window.
    Fresh,
    /// Committed but past its window or explicitly invalidated; the next
    /// enabled read refetches.
    Stale,
    /// The last fetch failed; the last good value, if any, stays visible.
    Error,
}

/// What a reader sees for a key: the current value (possibly absent),
/// the entry status, and when the value was last committed.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub value: Option<Arc<T>>,
    pub status: QueryStatus,
    pub last_fetched_at_ms: Option<u64>,
}

impl<T> Snapshot<T> {
    /// Snapshot of a key that has never been fetched.
    pub fn absent() -> Self {
        Self {
            value: None,
            status: QueryStatus::Stale,
            last_fetched_at_ms: None,
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// Internal per-key state. One entry per structural key; commits are
/// atomic with respect to the key.
pub(crate) struct Entry {
    /// Type-erased committed value; readers downcast to their own T.
    pub value: Option<Arc<dyn Any + Send + Sync>>,
    pub status: QueryStatus,
    pub last_fetched_at_ms: Option<u64>,
    pub stale_after_ms: u64,
    /// Bumped on every commit and invalidation. A fetch may only commit
    /// if the generation it started under is still current.
    pub generation: u64,
    pub last_error: Option<ApiError>,
}

impl Entry {
    pub fn new(stale_after_ms: u64) -> Self {
        Self {
            value: None,
            status: QueryStatus::Stale,
            last_fetched_at_ms: None,
            stale_after_ms,
            generation: 0,
            last_error: None,
        }
    }

    /// Whether the committed value is still inside its freshness window.
    pub fn within_window(&self, now_ms: u64) -> bool {
        match self.last_fetched_at_ms {
            Some(at) => now_ms.saturating_sub(at) < self.stale_after_ms,
            None => false,
        }
    }

    /// Typed view of this entry. A value committed under a different type
    /// than the reader expects is reported absent (and logged); the next
    /// read heals the entry by refetching.
    pub fn snapshot<T: Send + Sync + 'static>(&self) -> Snapshot<T> {
        let value = match &self.value {
            Some(erased) => match Arc::clone(erased).downcast::<T>() {
                Ok(typed) => Some(typed),
                Err(_) => {
                    tracing::warn!(
                        expected = std::any::type_name::<T>(),
                        "cache entry holds a different type than the reader expects"
                    );
                    None
                }
            },
            None => None,
        };
        Snapshot {
            value,
            status: self.status,
            last_fetched_at_ms: self.last_fetched_at_ms,
        }
    }
}
