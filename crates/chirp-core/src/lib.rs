//! # Chirp Core
//!
//! Core types and effect contracts for the chirp client-side data layer.
//!
//! This crate is the bottom of the dependency stack:
//! - Identifiers and domain records shared by every other crate
//! - The error taxonomy (`ApiError`, `SessionError`)
//! - Effect traits for the external collaborators (`SocialApi`,
//!   `SessionApi`, `Clock`) plus their production and simulated handlers
//!
//! It carries no caching or view-state logic of its own; those live in
//! `chirp-cache` and `chirp-app` respectively.

pub mod api;
pub mod error;
pub mod identifiers;
pub mod records;
pub mod time;
pub mod username;

// Re-export primary types
pub use api::{SessionApi, SocialApi};
pub use error::{ApiError, SessionError};
pub use identifiers::{CommentId, PostId, UserId};
pub use records::{Comment, Post, ProfileDraft, UserProfile};
pub use time::{Clock, SimulatedClock, SystemClock};
pub use username::{normalize_username, validate_username_format, UsernameFormatError};
