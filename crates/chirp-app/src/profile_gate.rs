//! Profile-setup overlay gating.
//!
//! Right after authentication there is a window where the session exists
//! but the profile lookup has not landed; showing the setup prompt in
//! that window flashes it at users who already have a profile. The gate
//! opens only once the session has settled and the lookup has resolved
//! to "no profile, no error".

use chirp_cache::{QueryStatus, Snapshot};
use chirp_core::records::UserProfile;

/// Minimum time the session must have existed before the setup overlay
/// can appear.
pub const PROFILE_SETUP_SETTLE_MS: u64 = 500;

/// Outcome of the own-profile lookup, as the gate sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLookup {
    /// Not fetched yet, or a fetch is in flight.
    Pending,
    Resolved { exists: bool },
    Errored,
}

/// Interpret an own-profile cache snapshot for the gate.
pub fn profile_lookup(snapshot: &Snapshot<Option<UserProfile>>) -> ProfileLookup {
    match snapshot.status {
        QueryStatus::Pending => ProfileLookup::Pending,
        QueryStatus::Error => ProfileLookup::Errored,
        QueryStatus::Fresh | QueryStatus::Stale => match snapshot.value.as_deref() {
            Some(profile) => ProfileLookup::Resolved {
                exists: profile.is_some(),
            },
            None => ProfileLookup::Pending,
        },
    }
}

/// Tracks when the session was established and decides whether the
/// profile-setup overlay is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSetupGate {
    authenticated_at_ms: Option<u64>,
}

impl ProfileSetupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record session establishment. Idempotent: repeated calls keep the
    /// original timestamp so the settle window is not restarted.
    pub fn session_established(&mut self, now_ms: u64) {
        self.authenticated_at_ms.get_or_insert(now_ms);
    }

    pub fn session_ended(&mut self) {
        self.authenticated_at_ms = None;
    }

    /// Whether the setup overlay may be shown: session established, the
    /// settle delay elapsed, and the profile lookup resolved to absent
    /// without error.
    pub fn is_open(&self, now_ms: u64, lookup: ProfileLookup) -> bool {
        let Some(at) = self.authenticated_at_ms else {
            return false;
        };
        now_ms.saturating_sub(at) >= PROFILE_SETUP_SETTLE_MS
            && matches!(lookup, ProfileLookup::Resolved { exists: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn resolved(exists: bool) -> ProfileLookup {
        ProfileLookup::Resolved { exists }
    }

    #[test]
    fn closed_without_a_session() {
        let gate = ProfileSetupGate::new();
        assert!(!gate.is_open(10_000, resolved(false)));
    }

    #[test]
    fn closed_until_settle_elapses() {
        let mut gate = ProfileSetupGate::new();
        gate.session_established(1_000);
        assert!(!gate.is_open(1_000, resolved(false)));
        assert!(!gate.is_open(1_499, resolved(false)));
        assert!(gate.is_open(1_500, resolved(false)));
    }

    #[test]
    fn closed_when_profile_exists_or_lookup_unsettled() {
        let mut gate = ProfileSetupGate::new();
        gate.session_established(0);
        assert!(!gate.is_open(5_000, resolved(true)));
        assert!(!gate.is_open(5_000, ProfileLookup::Pending));
        assert!(!gate.is_open(5_000, ProfileLookup::Errored));
    }

    #[test]
    fn repeated_establishment_keeps_the_original_clock() {
        let mut gate = ProfileSetupGate::new();
        gate.session_established(1_000);
        gate.session_established(9_000);
        assert!(gate.is_open(1_500, resolved(false)));
    }

    #[test]
    fn session_end_closes_the_gate() {
        let mut gate = ProfileSetupGate::new();
        gate.session_established(0);
        gate.session_ended();
        assert!(!gate.is_open(10_000, resolved(false)));
    }

    #[test]
    fn lookup_interprets_snapshots() {
        let pending: Snapshot<Option<UserProfile>> = Snapshot {
            value: None,
            status: QueryStatus::Pending,
            last_fetched_at_ms: None,
        };
        assert_eq!(profile_lookup(&pending), ProfileLookup::Pending);

        let absent: Snapshot<Option<UserProfile>> = Snapshot {
            value: Some(Arc::new(None)),
            status: QueryStatus::Fresh,
            last_fetched_at_ms: Some(10),
        };
        assert_eq!(profile_lookup(&absent), resolved(false));

        let errored: Snapshot<Option<UserProfile>> = Snapshot {
            value: None,
            status: QueryStatus::Error,
            last_fetched_at_ms: None,
        };
        assert_eq!(profile_lookup(&errored), ProfileLookup::Errored);
    }
}
