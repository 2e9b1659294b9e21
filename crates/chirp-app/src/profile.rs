//! Profile reads, follow-graph operations and the save-profile path.
//!
//! Username-based profile viewing resolves the alias to a stable
//! identity through the cache; an alias that fails to resolve renders a
//! not-found state and never falls back to another view.

use crate::navigator::UserListKind;
use chirp_cache::{MutationKind, QueryKey, QueryStore, ReadOptions, Snapshot};
use chirp_core::api::SocialApi;
use chirp_core::error::ApiError;
use chirp_core::identifiers::UserId;
use chirp_core::records::{ProfileDraft, UserProfile};
use chirp_core::username::{normalize_username, validate_username_format};
use std::sync::Arc;

/// Username→identity and username→profile lookups change rarely; cache
/// them longer than the store default.
pub const USERNAME_LOOKUP_STALE_MS: u64 = 60_000;

/// Outcome of resolving a username to a stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameResolution {
    /// Resolution has not completed; render a loading indicator.
    Loading,
    /// No such username, or the lookup failed; render not-found.
    NotFound,
    Resolved(UserId),
}

/// Typed profile operations over the shared store.
pub struct ProfileService {
    store: Arc<QueryStore>,
    api: Arc<dyn SocialApi>,
}

impl ProfileService {
    pub fn new(store: Arc<QueryStore>, api: Arc<dyn SocialApi>) -> Self {
        Self { store, api }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The viewer's own profile, if stored.
    pub async fn own_profile(
        &self,
        enabled: bool,
    ) -> Result<Snapshot<Option<UserProfile>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::own_profile(),
                ReadOptions::enabled_if(enabled),
                move || async move { api.own_profile().await },
            )
            .await
    }

    /// Another user's profile with follow-graph stats.
    pub async fn profile_with_stats(
        &self,
        user: UserId,
        enabled: bool,
    ) -> Result<Snapshot<Option<UserProfile>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::profile_with_stats(user),
                ReadOptions::enabled_if(enabled),
                move || async move { api.profile_with_stats(user).await },
            )
            .await
    }

    /// Profile lookup by username alias.
    pub async fn profile_by_username(
        &self,
        username: &str,
        enabled: bool,
    ) -> Result<Snapshot<Option<UserProfile>>, ApiError> {
        let api = Arc::clone(&self.api);
        let username_owned = username.to_string();
        self.store
            .read(
                QueryKey::user_by_username(username),
                ReadOptions::enabled_if(enabled).with_stale_after(USERNAME_LOOKUP_STALE_MS),
                move || async move { api.profile_by_username(&username_owned).await },
            )
            .await
    }

    /// Resolve a username alias to its stable identity. Lookup failure
    /// is folded into `NotFound`: the view renders a not-found state, it
    /// never falls back to a different view.
    pub async fn resolve_username(&self, username: &str, enabled: bool) -> UsernameResolution {
        let api = Arc::clone(&self.api);
        let username_owned = username.to_string();
        let read = self
            .store
            .read(
                QueryKey::identity_by_username(username),
                ReadOptions::enabled_if(enabled).with_stale_after(USERNAME_LOOKUP_STALE_MS),
                move || async move { api.identity_by_username(&username_owned).await },
            )
            .await;

        match read {
            Err(_) => UsernameResolution::NotFound,
            Ok(snapshot) => match snapshot.value.as_deref() {
                Some(Some(user)) => UsernameResolution::Resolved(*user),
                Some(None) => UsernameResolution::NotFound,
                None => match snapshot.status {
                    chirp_cache::QueryStatus::Error => UsernameResolution::NotFound,
                    _ => UsernameResolution::Loading,
                },
            },
        }
    }

    /// Users the subject follows.
    pub async fn following_list(
        &self,
        user: UserId,
        enabled: bool,
    ) -> Result<Snapshot<Vec<UserId>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::following_list(user),
                ReadOptions::enabled_if(enabled),
                move || async move { api.following_list(user).await },
            )
            .await
    }

    /// Users following the subject.
    pub async fn followers_list(
        &self,
        user: UserId,
        enabled: bool,
    ) -> Result<Snapshot<Vec<UserId>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::followers_list(user),
                ReadOptions::enabled_if(enabled),
                move || async move { api.followers_list(user).await },
            )
            .await
    }

    /// The list backing the user-list overlay.
    pub async fn user_list(
        &self,
        kind: UserListKind,
        subject: UserId,
        enabled: bool,
    ) -> Result<Snapshot<Vec<UserId>>, ApiError> {
        match kind {
            UserListKind::Followers => self.followers_list(subject, enabled).await,
            UserListKind::Following => self.following_list(subject, enabled).await,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn follow(&self, user: UserId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::Follow, move || async move {
                api.follow(user).await
            })
            .await
    }

    pub async fn unfollow(&self, user: UserId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::Unfollow, move || async move {
                api.unfollow(user).await
            })
            .await
    }

    /// Create or replace the viewer's profile. The username is
    /// normalized and format-checked client-side before the remote is
    /// involved.
    pub async fn save_profile(&self, mut draft: ProfileDraft) -> Result<(), ApiError> {
        draft.username = normalize_username(&draft.username);
        validate_username_format(&draft.username)
            .map_err(|e| ApiError::validation(e.to_string()))?;

        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::SaveProfile, move || async move {
                api.save_profile(draft).await
            })
            .await
    }
}
