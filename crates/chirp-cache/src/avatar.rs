//! Profile-picture payloads and display handles.
//!
//! Fetching the payload and materializing a display handle are separate
//! steps: the payload is cached and retryable through the query store
//! like any other read, while a handle is a lifecycle-bound resource
//! that must be released when superseded or when its owning view goes
//! away. Pictures change far less often than feed data, so the payload
//! window is much longer than the store default.

use crate::entry::Snapshot;
use crate::key::QueryKey;
use crate::store::{QueryStore, ReadOptions};
use chirp_core::api::SocialApi;
use chirp_core::error::ApiError;
use chirp_core::identifiers::UserId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Freshness window for picture payloads.
pub const AVATAR_STALE_MS: u64 = 5 * 60 * 1_000;

struct HandleInner {
    user: UserId,
    /// The committed payload this handle was materialized from. The
    /// store hands out the same `Arc` until a new payload is committed,
    /// so pointer identity tells a reused payload from a superseding one.
    payload: Arc<Option<Vec<u8>>>,
    released: AtomicBool,
}

/// Display-ready handle over a fetched picture payload.
///
/// Clones share the same underlying resource; releasing any clone
/// releases them all.
#[derive(Clone)]
pub struct AvatarHandle {
    inner: Arc<HandleInner>,
}

impl AvatarHandle {
    fn new(user: UserId, payload: Arc<Option<Vec<u8>>>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                user,
                payload,
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn user(&self) -> UserId {
        self.inner.user
    }

    /// The picture bytes, or `None` once the handle has been released.
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.is_released() {
            return None;
        }
        (*self.inner.payload).as_deref()
    }

    /// Release the underlying resource. Idempotent.
    pub fn release(&self) {
        self.inner.released.store(true, Ordering::SeqCst);
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    fn same_payload(&self, payload: &Arc<Option<Vec<u8>>>) -> bool {
        Arc::ptr_eq(&self.inner.payload, payload)
    }
}

impl std::fmt::Debug for AvatarHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarHandle")
            .field("user", &self.inner.user)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Cache of picture payloads plus the registry of live display handles.
pub struct AvatarStore {
    store: Arc<QueryStore>,
    api: Arc<dyn SocialApi>,
    live: Mutex<HashMap<UserId, AvatarHandle>>,
}

impl AvatarStore {
    pub fn new(store: Arc<QueryStore>, api: Arc<dyn SocialApi>) -> Self {
        Self {
            store,
            api,
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch (or reuse) the picture payload for a user and return a
    /// display handle over it. A user with no picture yields `Ok(None)`.
    ///
    /// Re-calling for the same user while the payload is unchanged
    /// returns the same live handle; a newer payload supersedes and
    /// releases the old handle.
    pub async fn handle_for(
        &self,
        user: UserId,
        enabled: bool,
    ) -> Result<Option<AvatarHandle>, ApiError> {
        let api = Arc::clone(&self.api);
        let snapshot: Snapshot<Option<Vec<u8>>> = self
            .store
            .read(
                QueryKey::profile_picture(user),
                ReadOptions::enabled_if(enabled).with_stale_after(AVATAR_STALE_MS),
                move || async move { api.profile_picture(user).await },
            )
            .await?;

        let Some(payload) = snapshot.value else {
            return Ok(None);
        };
        if payload.is_none() {
            // No picture set: a defined "no handle" outcome, and any
            // handle from an earlier payload is now superseded.
            self.release(user);
            return Ok(None);
        }

        Ok(Some(self.materialize(user, payload)))
    }

    /// Release the live handle for a user, if any. Called on view
    /// teardown.
    pub fn release(&self, user: UserId) {
        if let Some(handle) = self.live.lock().remove(&user) {
            handle.release();
            tracing::debug!(%user, "avatar handle released");
        }
    }

    /// Release every live handle. Called when the owning surface is torn
    /// down wholesale.
    pub fn release_all(&self) {
        let mut live = self.live.lock();
        for (_, handle) in live.drain() {
            handle.release();
        }
    }

    /// Number of handles that have been materialized and not released.
    pub fn live_handles(&self) -> usize {
        self.live
            .lock()
            .values()
            .filter(|h| !h.is_released())
            .count()
    }

    fn materialize(&self, user: UserId, payload: Arc<Option<Vec<u8>>>) -> AvatarHandle {
        let mut live = self.live.lock();
        if let Some(existing) = live.get(&user) {
            if existing.same_payload(&payload) && !existing.is_released() {
                return existing.clone();
            }
            // Newer payload supersedes the old handle
            existing.release();
        }
        let handle = AvatarHandle::new(user, payload);
        live.insert(user, handle.clone());
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_core::time::SimulatedClock;
    use chirp_testkit::MockSocialApi;

    const PICTURE: &str = "profile_picture";

    fn avatar_store() -> (AvatarStore, Arc<MockSocialApi>, SimulatedClock) {
        let clock = SimulatedClock::new(50_000);
        let api = Arc::new(MockSocialApi::new());
        let store = Arc::new(QueryStore::new(Arc::new(clock.clone())));
        (AvatarStore::new(store, api.clone()), api, clock)
    }

    fn user(n: u8) -> UserId {
        UserId::new_from_entropy([n; 32])
    }

    #[tokio::test]
    async fn absent_payload_yields_no_handle() {
        let (avatars, _api, _clock) = avatar_store();
        let handle = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds");
        assert!(handle.is_none());
        assert_eq!(avatars.live_handles(), 0);
    }

    #[tokio::test]
    async fn payload_fetched_once_within_window() {
        let (avatars, api, _clock) = avatar_store();
        api.set_picture(user(1), vec![1, 2, 3]);

        let first = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");
        let second = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");

        assert_eq!(api.call_count(PICTURE), 1);
        assert!(Arc::ptr_eq(&first.inner, &second.inner), "same live handle reused");
        assert_eq!(first.bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(avatars.live_handles(), 1);
    }

    #[tokio::test]
    async fn newer_payload_supersedes_and_releases_old_handle() {
        let (avatars, api, clock) = avatar_store();
        api.set_picture(user(1), vec![1]);

        let old = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");

        api.set_picture(user(1), vec![2]);
        clock.advance(AVATAR_STALE_MS);

        let new = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");

        assert!(old.is_released(), "superseded handle was released");
        assert_eq!(old.bytes(), None);
        assert_eq!(new.bytes(), Some(&[2u8][..]));
        assert_eq!(avatars.live_handles(), 1, "no handle accumulation");
    }

    #[tokio::test]
    async fn removing_the_picture_releases_the_handle() {
        let (avatars, api, clock) = avatar_store();
        api.set_picture(user(1), vec![1]);

        let handle = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");

        api.clear_picture(user(1));
        clock.advance(AVATAR_STALE_MS);

        let gone = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds");
        assert!(gone.is_none());
        assert!(handle.is_released());
        assert_eq!(avatars.live_handles(), 0);
    }

    #[tokio::test]
    async fn explicit_release_on_view_teardown() {
        let (avatars, api, _clock) = avatar_store();
        api.set_picture(user(1), vec![1]);

        let handle = avatars
            .handle_for(user(1), true)
            .await
            .expect("read succeeds")
            .expect("handle materialized");

        avatars.release(user(1));
        assert!(handle.is_released());
        assert_eq!(avatars.live_handles(), 0);
    }

    #[tokio::test]
    async fn disabled_read_fetches_nothing() {
        let (avatars, api, _clock) = avatar_store();
        api.set_picture(user(1), vec![1]);

        let handle = avatars
            .handle_for(user(1), false)
            .await
            .expect("disabled read returns");
        assert!(handle.is_none());
        assert_eq!(api.call_count(PICTURE), 0);
    }
}
