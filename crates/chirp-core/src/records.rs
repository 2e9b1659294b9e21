//! Domain records returned by the remote API.
//!
//! These are plain data carriers: the remote store owns them, the cache
//! holds them, views read them. Like counts are embedded in each record's
//! `liked_by` set rather than tracked separately, which is why liking a
//! post invalidates the feeds that embed it.

use crate::identifiers::{CommentId, PostId, UserId};
use serde::{Deserialize, Serialize};

/// A feed post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    /// Author display name, denormalized by the remote for rendering.
    pub author_name: Option<String>,
    pub content: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Identities that liked this post.
    pub liked_by: Vec<UserId>,
    /// Whether the requesting viewer is in `liked_by`.
    pub liked_by_viewer: bool,
}

impl Post {
    /// Size of the liker set.
    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// Parent comment for threaded replies, if any.
    pub parent: Option<CommentId>,
    pub author: UserId,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at_ms: u64,
    pub liked_by: Vec<UserId>,
    pub liked_by_viewer: bool,
}

impl Comment {
    /// Size of the liker set.
    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }
}

/// A stored user profile, with the follow-graph stats the remote
/// denormalizes onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    /// Optional display name; falls back to the username when unset.
    pub name: Option<String>,
    pub bio: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub posts_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the requesting viewer follows this profile's owner.
    pub followed_by_viewer: bool,
}

impl UserProfile {
    /// Name to render: the display name if set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// Input for creating or replacing the viewer's own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    /// Raw picture payload; `None` leaves the picture unset.
    pub picture: Option<Vec<u8>>,
}
