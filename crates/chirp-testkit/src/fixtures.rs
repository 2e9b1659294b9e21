//! Record fixtures for tests.

use chirp_core::identifiers::{CommentId, PostId, UserId};
use chirp_core::records::{Comment, Post, UserProfile};

/// Deterministic user identity from a single byte.
pub fn user(n: u8) -> UserId {
    UserId::new_from_entropy([n; 32])
}

/// A post with explicit timestamp and liker set.
pub fn post(id: u64, author: UserId, created_at_ms: u64, liked_by: &[UserId]) -> Post {
    Post {
        id: PostId(id),
        author,
        author_name: None,
        content: format!("post {id}"),
        created_at_ms,
        liked_by: liked_by.to_vec(),
        liked_by_viewer: false,
    }
}

/// A comment with explicit timestamp and liker set.
pub fn comment(
    id: u64,
    post_id: PostId,
    author: UserId,
    created_at_ms: u64,
    liked_by: &[UserId],
) -> Comment {
    Comment {
        id: CommentId(id),
        post_id,
        parent: None,
        author,
        author_name: None,
        content: format!("comment {id}"),
        created_at_ms,
        liked_by: liked_by.to_vec(),
        liked_by_viewer: false,
    }
}

/// A minimal profile with the given username.
pub fn profile(username: &str) -> UserProfile {
    UserProfile {
        username: username.to_string(),
        name: None,
        bio: None,
        created_at_ms: 0,
        updated_at_ms: 0,
        posts_count: 0,
        followers_count: 0,
        following_count: 0,
        followed_by_viewer: false,
    }
}
