//! In-memory session/identity collaborator.

use async_trait::async_trait;
use chirp_core::api::SessionApi;
use chirp_core::error::SessionError;
use chirp_core::identifiers::UserId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scriptable [`SessionApi`]: queue outcomes for login/logout, otherwise
/// succeed with a fixed default identity.
pub struct MockSessionApi {
    identity: Mutex<Option<UserId>>,
    default_user: UserId,
    login_script: Mutex<VecDeque<Result<UserId, SessionError>>>,
    logout_script: Mutex<VecDeque<Result<(), SessionError>>>,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl MockSessionApi {
    pub fn new() -> Self {
        Self {
            identity: Mutex::new(None),
            default_user: UserId::new_from_entropy([0xAA; 32]),
            login_script: Mutex::new(VecDeque::new()),
            logout_script: Mutex::new(VecDeque::new()),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    /// Start pre-authenticated as the given user.
    pub fn with_identity(user: UserId) -> Self {
        let api = Self::new();
        *api.identity.lock() = Some(user);
        api
    }

    /// Identity handed out by unscripted successful logins.
    pub fn default_user(&self) -> UserId {
        self.default_user
    }

    /// Queue the outcome of the next login call.
    pub fn push_login(&self, result: Result<UserId, SessionError>) {
        self.login_script.lock().push_back(result);
    }

    /// Queue the outcome of the next logout call.
    pub fn push_logout(&self, result: Result<(), SessionError>) {
        self.logout_script.lock().push_back(result);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSessionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionApi for MockSessionApi {
    async fn current_identity(&self) -> Option<UserId> {
        *self.identity.lock()
    }

    async fn login(&self) -> Result<UserId, SessionError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.login_script.lock().pop_front();
        let outcome = scripted.unwrap_or(Ok(self.default_user));
        if let Ok(user) = &outcome {
            *self.identity.lock() = Some(*user);
        }
        outcome
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.logout_script.lock().pop_front();
        let outcome = scripted.unwrap_or(Ok(()));
        if outcome.is_ok() {
            *self.identity.lock() = None;
        }
        outcome
    }
}
