//! Debounced username-availability validator.
//!
//! Input is checked remotely only after it has stopped changing for the
//! settle window, and only if the synchronous format check passes.
//! Verdicts are cached per exact input value with a short TTL. Transient
//! failures are retried once after a fixed backoff; domain rejections are
//! never retried. Checks for different values run independently, but only
//! the verdict for the latest settled value is ever surfaced.

use chirp_core::api::SocialApi;
use chirp_core::error::ApiError;
use chirp_core::time::Clock;
use chirp_core::username::{normalize_username, validate_username_format, UsernameFormatError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// How long input must stay unchanged before the remote check fires.
pub const SETTLE_MS: u64 = 600;
/// How long a remote verdict stays usable for the same exact value.
pub const VERDICT_TTL_MS: u64 = 60_000;
/// Backoff before the single retry of a transient failure.
pub const RETRY_BACKOFF_MS: u64 = 1_000;

/// What the profile form renders next to the username field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationState {
    /// No input yet.
    Idle,
    /// Failed the synchronous format check; no remote call was made.
    InvalidFormat { reason: UsernameFormatError },
    /// Settled and waiting on the remote verdict.
    Checking,
    Available,
    /// Taken, reserved, or rejected by the remote's own rules.
    Taken,
    /// Transient failure even after the retry.
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy)]
struct Verdict {
    available: bool,
    checked_at_ms: u64,
}

struct ValidatorInner {
    /// Bumped on every input change; stale generations publish nothing.
    generation: u64,
    verdicts: HashMap<String, Verdict>,
}

/// Debounced, cached availability checker for the profile-setup form.
#[derive(Clone)]
pub struct UsernameValidator {
    api: Arc<dyn SocialApi>,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<ValidationState>>,
    inner: Arc<Mutex<ValidatorInner>>,
}

impl UsernameValidator {
    pub fn new(api: Arc<dyn SocialApi>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(ValidationState::Idle);
        Self {
            api,
            clock,
            state: Arc::new(state),
            inner: Arc::new(Mutex::new(ValidatorInner {
                generation: 0,
                verdicts: HashMap::new(),
            })),
        }
    }

    /// Watch validation state changes.
    pub fn subscribe(&self) -> watch::Receiver<ValidationState> {
        self.state.subscribe()
    }

    /// Current validation state.
    pub fn state(&self) -> ValidationState {
        self.state.borrow().clone()
    }

    /// Feed the current input value. Supersedes any earlier value still
    /// settling or in flight.
    pub fn set_input(&self, raw: &str) {
        let value = normalize_username(raw);
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.generation
        };

        if value.is_empty() {
            self.publish_if_current(generation, ValidationState::Idle);
            return;
        }
        if let Err(reason) = validate_username_format(&value) {
            // Too-short and malformed input never reaches the remote
            self.publish_if_current(generation, ValidationState::InvalidFormat { reason });
            return;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.settle_and_check(value, generation).await;
        });
    }

    async fn settle_and_check(&self, value: String, generation: u64) {
        self.clock.sleep_ms(SETTLE_MS).await;
        if self.superseded(generation) {
            tracing::debug!(%value, "input superseded during settle");
            return;
        }

        let now = self.clock.now_ms().await;
        if let Some(verdict) = self.cached_verdict(&value, now) {
            self.publish_if_current(generation, Self::verdict_state(verdict));
            return;
        }

        self.publish_if_current(generation, ValidationState::Checking);
        match self.check_remote(&value).await {
            Ok(available) => {
                let checked_at_ms = self.clock.now_ms().await;
                // Verdicts are keyed by exact value, not by who asked, so
                // cache them even when this input was superseded.
                self.inner.lock().verdicts.insert(
                    value.clone(),
                    Verdict {
                        available,
                        checked_at_ms,
                    },
                );
                let state = if available {
                    ValidationState::Available
                } else {
                    ValidationState::Taken
                };
                self.publish_if_current(generation, state);
            }
            Err(err) if err.is_validation() => {
                // The remote rejected the value itself; no retry will
                // change that verdict within the TTL.
                let checked_at_ms = self.clock.now_ms().await;
                self.inner.lock().verdicts.insert(
                    value.clone(),
                    Verdict {
                        available: false,
                        checked_at_ms,
                    },
                );
                self.publish_if_current(generation, ValidationState::Taken);
            }
            Err(err) => {
                tracing::warn!(%value, error = %err, "availability check failed");
                self.publish_if_current(
                    generation,
                    ValidationState::Failed {
                        reason: err.to_string(),
                    },
                );
            }
        }
    }

    /// One remote check with a single backoff retry on transient failure.
    async fn check_remote(&self, value: &str) -> Result<bool, ApiError> {
        match self.api.check_username_availability(value).await {
            Ok(available) => Ok(available),
            Err(err) if err.is_transient() => {
                tracing::debug!(%value, error = %err, "retrying availability check once");
                self.clock.sleep_ms(RETRY_BACKOFF_MS).await;
                self.api.check_username_availability(value).await
            }
            Err(err) => Err(err),
        }
    }

    fn cached_verdict(&self, value: &str, now_ms: u64) -> Option<Verdict> {
        let inner = self.inner.lock();
        inner
            .verdicts
            .get(value)
            .filter(|v| now_ms.saturating_sub(v.checked_at_ms) < VERDICT_TTL_MS)
            .copied()
    }

    fn verdict_state(verdict: Verdict) -> ValidationState {
        if verdict.available {
            ValidationState::Available
        } else {
            ValidationState::Taken
        }
    }

    fn superseded(&self, generation: u64) -> bool {
        self.inner.lock().generation != generation
    }

    fn publish_if_current(&self, generation: u64, state: ValidationState) {
        let inner = self.inner.lock();
        if inner.generation == generation {
            self.state.send_replace(state);
        }
    }
}
