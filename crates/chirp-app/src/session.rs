//! Session workflow over the identity collaborator.
//!
//! Login can fail with an already-authenticated conflict when a previous
//! session never tore down cleanly; recovery is to clear the session,
//! let it settle, and retry exactly once. If the retry fails too, the
//! session state is fully reset. Nothing here is fatal.

use chirp_core::api::SessionApi;
use chirp_core::error::SessionError;
use chirp_core::identifiers::UserId;
use chirp_core::time::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Settle delay between clearing a conflicted session and retrying login.
pub const LOGIN_RETRY_SETTLE_MS: u64 = 500;
/// Settle delay after logout before dependent state is reset.
pub const LOGOUT_SETTLE_MS: u64 = 300;

/// Client-side session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated {
        user: UserId,
    },
}

impl SessionState {
    pub fn user(&self) -> Option<UserId> {
        match self {
            Self::Authenticated { user } => Some(*user),
            _ => None,
        }
    }
}

/// Drives login/logout against the identity collaborator and publishes
/// the resulting state.
pub struct SessionManager {
    api: Arc<dyn SessionApi>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn SessionApi>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self { api, clock, state }
    }

    /// Watch session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.state.borrow().user()
    }

    /// Adopt an identity the collaborator already holds (session restore
    /// on startup). Returns the restored identity, if any.
    pub async fn resume(&self) -> Option<UserId> {
        let identity = self.api.current_identity().await;
        if let Some(user) = identity {
            tracing::debug!(%user, "restored existing session");
            self.state.send_replace(SessionState::Authenticated { user });
        }
        identity
    }

    /// Establish a session, recovering once from an
    /// already-authenticated conflict.
    pub async fn login(&self) -> Result<UserId, SessionError> {
        self.state.send_replace(SessionState::Authenticating);
        match self.api.login().await {
            Ok(user) => {
                self.state.send_replace(SessionState::Authenticated { user });
                Ok(user)
            }
            Err(SessionError::AlreadyAuthenticated) => {
                tracing::warn!("login conflict, clearing session and retrying once");
                if let Err(err) = self.api.logout().await {
                    self.state.send_replace(SessionState::Anonymous);
                    return Err(err);
                }
                self.clock.sleep_ms(LOGIN_RETRY_SETTLE_MS).await;
                match self.api.login().await {
                    Ok(user) => {
                        self.state.send_replace(SessionState::Authenticated { user });
                        Ok(user)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "login retry failed, resetting session state");
                        self.state.send_replace(SessionState::Anonymous);
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.state.send_replace(SessionState::Anonymous);
                Err(err)
            }
        }
    }

    /// Terminate the session. State is reset even if the collaborator
    /// reports a failure; the error is surfaced so the caller can decide
    /// whether a harder reset is warranted.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let outcome = self.api.logout().await;
        self.clock.sleep_ms(LOGOUT_SETTLE_MS).await;
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "logout failed, resetting session state anyway");
        }
        self.state.send_replace(SessionState::Anonymous);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_core::time::SimulatedClock;
    use chirp_testkit::{run_until_settled, MockSessionApi};

    fn manager() -> (SessionManager, Arc<MockSessionApi>, SimulatedClock) {
        let clock = SimulatedClock::new_at_epoch();
        let api = Arc::new(MockSessionApi::new());
        let manager = SessionManager::new(api.clone(), Arc::new(clock.clone()));
        (manager, api, clock)
    }

    #[tokio::test]
    async fn plain_login_authenticates() {
        let (manager, api, _clock) = manager();
        let user = manager.login().await.expect("login succeeds");
        assert_eq!(user, api.default_user());
        assert_eq!(manager.current(), SessionState::Authenticated { user });
    }

    #[tokio::test]
    async fn conflict_recovers_by_clearing_and_retrying_once() {
        let (manager, api, clock) = manager();
        api.push_login(Err(SessionError::AlreadyAuthenticated));

        let login = manager.login();
        let driver = async {
            run_until_settled().await;
            clock.advance(LOGIN_RETRY_SETTLE_MS);
        };
        let (outcome, _) = tokio::join!(login, driver);

        let user = outcome.expect("retry succeeds");
        assert_eq!(manager.current(), SessionState::Authenticated { user });
        assert_eq!(api.login_calls(), 2);
        assert_eq!(api.logout_calls(), 1, "conflicted session was cleared first");
    }

    #[tokio::test]
    async fn failed_retry_resets_to_anonymous() {
        let (manager, api, clock) = manager();
        api.push_login(Err(SessionError::AlreadyAuthenticated));
        api.push_login(Err(SessionError::failed("provider outage")));

        let login = manager.login();
        let driver = async {
            run_until_settled().await;
            clock.advance(LOGIN_RETRY_SETTLE_MS);
        };
        let (outcome, _) = tokio::join!(login, driver);

        assert!(outcome.is_err());
        assert_eq!(manager.current(), SessionState::Anonymous);
        assert_eq!(api.login_calls(), 2, "retried exactly once");
    }

    #[tokio::test]
    async fn non_conflict_failure_is_not_retried() {
        let (manager, api, _clock) = manager();
        api.push_login(Err(SessionError::failed("user aborted")));

        let outcome = manager.login().await;
        assert!(outcome.is_err());
        assert_eq!(api.login_calls(), 1);
        assert_eq!(manager.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn logout_settles_then_resets() {
        let (manager, _api, clock) = manager();
        manager.login().await.expect("login succeeds");

        let logout = manager.logout();
        let driver = async {
            run_until_settled().await;
            clock.advance(LOGOUT_SETTLE_MS);
        };
        let (outcome, _) = tokio::join!(logout, driver);

        outcome.expect("logout succeeds");
        assert_eq!(manager.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn failed_logout_still_resets_state() {
        let (manager, api, clock) = manager();
        manager.login().await.expect("login succeeds");
        api.push_logout(Err(SessionError::failed("provider outage")));

        let logout = manager.logout();
        let driver = async {
            run_until_settled().await;
            clock.advance(LOGOUT_SETTLE_MS);
        };
        let (outcome, _) = tokio::join!(logout, driver);

        assert!(outcome.is_err());
        assert_eq!(manager.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn resume_adopts_existing_identity() {
        let clock = SimulatedClock::new_at_epoch();
        let existing = chirp_core::identifiers::UserId::new_from_entropy([5u8; 32]);
        let api = Arc::new(MockSessionApi::with_identity(existing));
        let manager = SessionManager::new(api, Arc::new(clock));

        let restored = manager.resume().await;
        assert_eq!(restored, Some(existing));
        assert_eq!(manager.current_user(), Some(existing));
    }
}
