//! # App Core
//!
//! Wires the store, services, session workflow and navigator into one
//! headless application core. Frontends hold an `AppCore`, dispatch
//! intents, and read snapshots; they never touch the collaborators
//! directly.

use crate::feed::FeedService;
use crate::intent::NavIntent;
use crate::navigator::{reduce, NavigationState};
use crate::profile::ProfileService;
use crate::profile_gate::{profile_lookup, ProfileSetupGate};
use crate::session::SessionManager;
use chirp_cache::{AvatarStore, QueryStore, UsernameValidator};
use chirp_core::api::{SessionApi, SocialApi};
use chirp_core::error::SessionError;
use chirp_core::identifiers::UserId;
use chirp_core::time::Clock;
use parking_lot::Mutex;
use std::sync::Arc;

/// Process-wide application core: one store, one session, one
/// navigation state.
pub struct AppCore {
    clock: Arc<dyn Clock>,
    store: Arc<QueryStore>,
    session: SessionManager,
    feed: FeedService,
    profiles: ProfileService,
    avatars: AvatarStore,
    validator: UsernameValidator,
    nav: Mutex<NavigationState>,
    gate: Mutex<ProfileSetupGate>,
}

impl AppCore {
    pub fn new(
        api: Arc<dyn SocialApi>,
        session_api: Arc<dyn SessionApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(QueryStore::new(clock.clone()));
        Self {
            session: SessionManager::new(session_api, clock.clone()),
            feed: FeedService::new(Arc::clone(&store), Arc::clone(&api)),
            profiles: ProfileService::new(Arc::clone(&store), Arc::clone(&api)),
            avatars: AvatarStore::new(Arc::clone(&store), Arc::clone(&api)),
            validator: UsernameValidator::new(api, clock.clone()),
            store,
            clock,
            nav: Mutex::new(NavigationState::new()),
            gate: Mutex::new(ProfileSetupGate::new()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &Arc<QueryStore> {
        &self.store
    }

    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn avatars(&self) -> &AvatarStore {
        &self.avatars
    }

    pub fn validator(&self) -> &UsernameValidator {
        &self.validator
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Whether remote reads have their prerequisites (an established
    /// session) and should be enabled.
    pub fn reads_enabled(&self) -> bool {
        self.session.current_user().is_some()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigation(&self) -> NavigationState {
        self.nav.lock().clone()
    }

    /// Reduce an intent into the navigation state and return the result.
    pub fn apply(&self, intent: NavIntent) -> NavigationState {
        let mut nav = self.nav.lock();
        *nav = reduce(&nav, intent);
        nav.clone()
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Restore a pre-existing session on startup, if any.
    pub async fn resume(&self) -> Option<UserId> {
        let restored = self.session.resume().await;
        if restored.is_some() {
            let now = self.clock.now_ms().await;
            self.gate.lock().session_established(now);
        }
        restored
    }

    pub async fn login(&self) -> Result<UserId, SessionError> {
        match self.session.login().await {
            Ok(user) => {
                let now = self.clock.now_ms().await;
                self.gate.lock().session_established(now);
                Ok(user)
            }
            Err(err) => {
                // Worst case is a full reset of session-dependent state
                self.reset_session_state();
                Err(err)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        let outcome = self.session.logout().await;
        self.reset_session_state();
        outcome
    }

    fn reset_session_state(&self) {
        self.gate.lock().session_ended();
        self.avatars.release_all();
        self.apply(NavIntent::SessionEnded);
    }

    // =========================================================================
    // Profile setup gating
    // =========================================================================

    /// Whether the profile-setup overlay is currently reachable:
    /// authenticated, settle delay elapsed, own-profile lookup resolved
    /// to absent, and no lookup error.
    pub async fn profile_setup_required(&self) -> bool {
        if !self.reads_enabled() {
            return false;
        }
        let Ok(snapshot) = self.profiles.own_profile(true).await else {
            return false;
        };
        let lookup = profile_lookup(&snapshot);
        let now = self.clock.now_ms().await;
        self.gate.lock().is_open(now, lookup)
    }

    /// Open the profile-setup overlay if and only if the gate is open.
    /// Returns whether it opened.
    pub async fn maybe_open_profile_setup(&self) -> bool {
        if self.profile_setup_required().await {
            self.apply(NavIntent::OpenProfileSetup);
            true
        } else {
            false
        }
    }
}
