//! # Chirp Testkit
//!
//! In-memory implementations of the external collaborators
//! ([`chirp_core::SocialApi`], [`chirp_core::SessionApi`]) plus record
//! fixtures, for exercising the cache and view-state layers without a
//! network.
//!
//! The mocks count calls per endpoint, support one-shot failure
//! injection and optional clock-driven latency, and otherwise behave
//! like a small but honest remote: the follow graph, like sets and
//! username registry are real state, not canned responses.

pub mod fixtures;
pub mod session;
pub mod social;

pub use session::MockSessionApi;
pub use social::MockSocialApi;

/// Drive the cooperative scheduler until spawned tasks have had ample
/// opportunity to run up to their next timer. Pair with
/// `SimulatedClock::advance` in tests.
pub async fn run_until_settled() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
