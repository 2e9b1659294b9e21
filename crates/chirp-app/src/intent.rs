//! # Intents: User Actions on Navigation State
//!
//! An intent is a user action that moves the navigation state machine.
//! Intents are reduced purely (`navigator::reduce`); anything that needs
//! the remote (feeds, profiles, mutations) lives in the services, not
//! here.

use crate::navigator::{FeedTab, UserListKind};
use crate::sorting::SortCriterion;
use chirp_core::identifiers::UserId;
use serde::{Deserialize, Serialize};

/// A user action affecting which view and overlays are visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavIntent {
    /// Return to the home feed, clearing profile-viewing state and any
    /// overlay.
    NavigateHome,

    /// View a public profile via its stable identity reference.
    ViewProfileById { user: UserId },

    /// View a public profile via username; resolution happens in the
    /// profile service.
    ViewProfileByUsername { username: String },

    /// Flip between the viewer's own profile and the previous view.
    ToggleOwnProfile,

    SetFeedTab { tab: FeedTab },

    SetSortCriterion { criterion: SortCriterion },

    /// Open or close the post-composition overlay.
    ToggleCreatePost,

    /// Open the profile-setup overlay. Only dispatched once the setup
    /// gate reports open; the reducer itself stays mechanical.
    OpenProfileSetup,

    /// Open the follower/following list overlay for a subject.
    OpenUserList { kind: UserListKind, subject: UserId },

    CloseOverlay,

    /// The session was terminated; drop every view tied to an
    /// authenticated lookup.
    SessionEnded,
}
