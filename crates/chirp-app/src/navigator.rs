//! # View-State Navigator
//!
//! Finite state machine selecting the active view and overlay. State is
//! stored the way the rendering layer consumes it (an own-profile flag
//! plus optional viewed username/identity); [`NavigationState::active_view`]
//! derives the single active view from those fields by fixed precedence,
//! so exactly one view is ever active.
//!
//! Transitions are pure: `reduce(state, intent)` returns the next state
//! and never touches the cache or the remote.

use crate::intent::NavIntent;
use crate::sorting::SortCriterion;
use chirp_core::identifiers::UserId;
use serde::{Deserialize, Serialize};

/// Which feed the home view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedTab {
    #[default]
    Community,
    Following,
}

/// Which list the user-list overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserListKind {
    Followers,
    Following,
}

/// Modal-like state layered atop the active view. At most one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Overlay {
    #[default]
    None,
    CreatePost,
    ProfileSetup,
    UserList { kind: UserListKind, subject: UserId },
}

/// The single active view, derived from navigation fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveView {
    Home,
    OwnProfile,
    PublicProfileByName { username: String },
    PublicProfileByIdentity { user: UserId },
}

/// Navigation state of the whole client surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationState {
    show_own_profile: bool,
    viewing_username: Option<String>,
    viewing_identity: Option<UserId>,
    pub feed_tab: FeedTab,
    pub sort: SortCriterion,
    pub overlay: Overlay,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active view, by precedence: own profile, then identity-based
    /// viewing, then username-based viewing, then home.
    pub fn active_view(&self) -> ActiveView {
        if self.show_own_profile {
            return ActiveView::OwnProfile;
        }
        if let Some(user) = self.viewing_identity {
            return ActiveView::PublicProfileByIdentity { user };
        }
        if let Some(username) = &self.viewing_username {
            return ActiveView::PublicProfileByName {
                username: username.clone(),
            };
        }
        ActiveView::Home
    }

    /// Whether any profile-viewing field is set.
    pub fn is_viewing_profile(&self) -> bool {
        self.show_own_profile || self.viewing_identity.is_some() || self.viewing_username.is_some()
    }

    pub fn viewing_identity(&self) -> Option<UserId> {
        self.viewing_identity
    }

    pub fn viewing_username(&self) -> Option<&str> {
        self.viewing_username.as_deref()
    }
}

/// Reduce an intent into the next navigation state.
pub fn reduce(state: &NavigationState, intent: NavIntent) -> NavigationState {
    let mut next = state.clone();
    match intent {
        NavIntent::NavigateHome => {
            next.show_own_profile = false;
            next.viewing_username = None;
            next.viewing_identity = None;
            next.feed_tab = FeedTab::Community;
            next.overlay = Overlay::None;
        }
        NavIntent::ViewProfileById { user } => {
            next.viewing_identity = Some(user);
            next.viewing_username = None;
            next.show_own_profile = false;
            next.overlay = Overlay::None;
        }
        NavIntent::ViewProfileByUsername { username } => {
            next.viewing_username = Some(username);
            next.viewing_identity = None;
            next.show_own_profile = false;
            next.overlay = Overlay::None;
        }
        NavIntent::ToggleOwnProfile => {
            next.show_own_profile = !next.show_own_profile;
        }
        NavIntent::SetFeedTab { tab } => {
            next.feed_tab = tab;
        }
        NavIntent::SetSortCriterion { criterion } => {
            next.sort = criterion;
        }
        NavIntent::ToggleCreatePost => {
            next.overlay = if next.overlay == Overlay::CreatePost {
                Overlay::None
            } else {
                Overlay::CreatePost
            };
        }
        NavIntent::OpenProfileSetup => {
            next.overlay = Overlay::ProfileSetup;
        }
        NavIntent::OpenUserList { kind, subject } => {
            next.overlay = Overlay::UserList { kind, subject };
        }
        NavIntent::CloseOverlay => {
            next.overlay = Overlay::None;
        }
        NavIntent::SessionEnded => {
            // A logged-out viewer cannot remain on a view tied to an
            // authenticated lookup.
            next.show_own_profile = false;
            next.viewing_username = None;
            next.viewing_identity = None;
            next.overlay = Overlay::None;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u8) -> UserId {
        UserId::new_from_entropy([n; 32])
    }

    #[test]
    fn starts_at_home_with_community_tab() {
        let state = NavigationState::new();
        assert_eq!(state.active_view(), ActiveView::Home);
        assert_eq!(state.feed_tab, FeedTab::Community);
        assert_eq!(state.overlay, Overlay::None);
    }

    #[test]
    fn view_by_identity_then_home_leaves_no_residue() {
        let state = NavigationState::new();
        let viewing = reduce(&state, NavIntent::ViewProfileById { user: user(1) });
        assert_eq!(
            viewing.active_view(),
            ActiveView::PublicProfileByIdentity { user: user(1) }
        );

        let home = reduce(&viewing, NavIntent::NavigateHome);
        assert_eq!(home.active_view(), ActiveView::Home);
        assert!(!home.is_viewing_profile());
        assert_eq!(home.viewing_identity(), None);
        assert_eq!(home.viewing_username(), None);
    }

    #[test]
    fn identity_and_username_viewing_are_mutually_exclusive() {
        let state = reduce(
            &NavigationState::new(),
            NavIntent::ViewProfileByUsername {
                username: "wren".to_string(),
            },
        );
        assert_eq!(state.viewing_username(), Some("wren"));

        let state = reduce(&state, NavIntent::ViewProfileById { user: user(2) });
        assert_eq!(state.viewing_username(), None);
        assert_eq!(state.viewing_identity(), Some(user(2)));

        let state = reduce(
            &state,
            NavIntent::ViewProfileByUsername {
                username: "lark".to_string(),
            },
        );
        assert_eq!(state.viewing_identity(), None);
        assert_eq!(state.viewing_username(), Some("lark"));
    }

    #[test]
    fn own_profile_toggles_back_to_prior_view() {
        let viewing = reduce(
            &NavigationState::new(),
            NavIntent::ViewProfileByUsername {
                username: "wren".to_string(),
            },
        );
        let own = reduce(&viewing, NavIntent::ToggleOwnProfile);
        assert_eq!(own.active_view(), ActiveView::OwnProfile);

        let back = reduce(&own, NavIntent::ToggleOwnProfile);
        assert_eq!(
            back.active_view(),
            ActiveView::PublicProfileByName {
                username: "wren".to_string()
            }
        );
    }

    #[test]
    fn at_most_one_overlay_is_active() {
        let state = reduce(&NavigationState::new(), NavIntent::ToggleCreatePost);
        assert_eq!(state.overlay, Overlay::CreatePost);

        let state = reduce(
            &state,
            NavIntent::OpenUserList {
                kind: UserListKind::Followers,
                subject: user(1),
            },
        );
        assert_eq!(
            state.overlay,
            Overlay::UserList {
                kind: UserListKind::Followers,
                subject: user(1)
            }
        );

        let state = reduce(&state, NavIntent::CloseOverlay);
        assert_eq!(state.overlay, Overlay::None);
    }

    #[test]
    fn toggle_create_post_closes_itself() {
        let open = reduce(&NavigationState::new(), NavIntent::ToggleCreatePost);
        let closed = reduce(&open, NavIntent::ToggleCreatePost);
        assert_eq!(closed.overlay, Overlay::None);
    }

    #[test]
    fn session_end_resets_profile_views_and_overlay() {
        let mut state = reduce(
            &NavigationState::new(),
            NavIntent::ViewProfileById { user: user(3) },
        );
        state = reduce(&state, NavIntent::OpenProfileSetup);
        state = reduce(
            &state,
            NavIntent::SetFeedTab {
                tab: FeedTab::Following,
            },
        );

        let reset = reduce(&state, NavIntent::SessionEnded);
        assert_eq!(reset.active_view(), ActiveView::Home);
        assert_eq!(reset.overlay, Overlay::None);
        // Tab and sort preferences survive a logout
        assert_eq!(reset.feed_tab, FeedTab::Following);
    }

    #[test]
    fn navigate_home_resets_tab_and_overlay() {
        let mut state = reduce(
            &NavigationState::new(),
            NavIntent::SetFeedTab {
                tab: FeedTab::Following,
            },
        );
        state = reduce(&state, NavIntent::ToggleCreatePost);

        let home = reduce(&state, NavIntent::NavigateHome);
        assert_eq!(home.feed_tab, FeedTab::Community);
        assert_eq!(home.overlay, Overlay::None);
    }

    #[test]
    fn state_roundtrips_through_serde() {
        let state = reduce(
            &NavigationState::new(),
            NavIntent::ViewProfileByUsername {
                username: "wren".to_string(),
            },
        );
        let json = serde_json::to_string(&state).expect("serializes");
        let back: NavigationState = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(state, back);
    }
}
