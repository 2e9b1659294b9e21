//! External collaborator contracts.
//!
//! The client core never talks to the network itself; it drives these two
//! traits and leaves transport, encoding and identity issuance to the
//! implementations. Every operation either returns a result or fails with
//! a distinguishable [`ApiError`] / [`SessionError`].

use crate::error::{ApiError, SessionError};
use crate::identifiers::{CommentId, PostId, UserId};
use crate::records::{Comment, Post, ProfileDraft, UserProfile};
use async_trait::async_trait;

/// Remote social-feed API.
///
/// Mutations are expected to be idempotent from the client's point of
/// view: liking an already-liked post or re-following a user must not
/// fail with anything the caller needs to special-case.
#[async_trait]
pub trait SocialApi: Send + Sync {
    // =========================================================================
    // Profiles
    // =========================================================================

    /// The viewer's own stored profile, if one exists.
    async fn own_profile(&self) -> Result<Option<UserProfile>, ApiError>;

    /// Create or replace the viewer's profile.
    async fn save_profile(&self, draft: ProfileDraft) -> Result<(), ApiError>;

    /// Whether the username is free to claim.
    async fn check_username_availability(&self, username: &str) -> Result<bool, ApiError>;

    /// Profile lookup by username alias.
    async fn profile_by_username(&self, username: &str) -> Result<Option<UserProfile>, ApiError>;

    /// Resolve a username alias to its stable identity reference.
    async fn identity_by_username(&self, username: &str) -> Result<Option<UserId>, ApiError>;

    /// Profile of an arbitrary user, with follow-graph stats.
    async fn profile_with_stats(&self, user: UserId) -> Result<Option<UserProfile>, ApiError>;

    /// Raw profile-picture payload; `None` when no picture is set.
    async fn profile_picture(&self, user: UserId) -> Result<Option<Vec<u8>>, ApiError>;

    // =========================================================================
    // Posts
    // =========================================================================

    /// Every post, for the community feed.
    async fn all_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// Posts authored by users the viewer follows.
    async fn following_feed(&self) -> Result<Vec<Post>, ApiError>;

    /// A single post by ID.
    async fn post(&self, id: PostId) -> Result<Option<Post>, ApiError>;

    async fn create_post(&self, content: &str) -> Result<(), ApiError>;

    async fn delete_post(&self, id: PostId) -> Result<(), ApiError>;

    async fn like_post(&self, id: PostId) -> Result<(), ApiError>;

    async fn unlike_post(&self, id: PostId) -> Result<(), ApiError>;

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comments on a post.
    async fn post_comments(&self, post: PostId) -> Result<Vec<Comment>, ApiError>;

    async fn create_comment(
        &self,
        post: PostId,
        parent: Option<CommentId>,
        content: &str,
    ) -> Result<(), ApiError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), ApiError>;

    async fn like_comment(&self, id: CommentId) -> Result<(), ApiError>;

    async fn unlike_comment(&self, id: CommentId) -> Result<(), ApiError>;

    // =========================================================================
    // Follow graph
    // =========================================================================

    async fn follow(&self, user: UserId) -> Result<(), ApiError>;

    async fn unfollow(&self, user: UserId) -> Result<(), ApiError>;

    /// Users the given user follows.
    async fn following_list(&self, user: UserId) -> Result<Vec<UserId>, ApiError>;

    /// Users following the given user.
    async fn followers_list(&self, user: UserId) -> Result<Vec<UserId>, ApiError>;
}

/// Session/identity collaborator.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// The current identity, if a session is established.
    async fn current_identity(&self) -> Option<UserId>;

    /// Establish a session. Fails with
    /// [`SessionError::AlreadyAuthenticated`] if one already exists.
    async fn login(&self) -> Result<UserId, SessionError>;

    /// Terminate the current session.
    async fn logout(&self) -> Result<(), SessionError>;
}
