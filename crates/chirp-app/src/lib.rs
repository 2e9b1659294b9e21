//! # Chirp App
//!
//! Portable headless application core for the chirp social feed client.
//!
//! The split follows CQRS:
//! - Intents (write): [`intent::NavIntent`] reduced purely by
//!   [`navigator::reduce`]
//! - Queries (read): [`feed::FeedService`] and [`profile::ProfileService`]
//!   over the shared `chirp_cache::QueryStore`
//!
//! [`app::AppCore`] owns the wiring; frontends dispatch intents and read
//! snapshots through it.

pub mod app;
pub mod feed;
pub mod intent;
pub mod navigator;
pub mod profile;
pub mod profile_gate;
pub mod session;
pub mod sorting;

// Re-export primary types
pub use app::AppCore;
pub use feed::FeedService;
pub use intent::NavIntent;
pub use navigator::{ActiveView, FeedTab, NavigationState, Overlay, UserListKind};
pub use profile::{ProfileService, UsernameResolution};
pub use profile_gate::{ProfileLookup, ProfileSetupGate, PROFILE_SETUP_SETTLE_MS};
pub use session::{SessionManager, SessionState};
pub use sorting::{sort_collections, sort_items, SortCriterion, SortMemo, Sortable};
