//! Mutation kinds and their static invalidation sets.
//!
//! Each mutation declares up front which cache tags it dirties. The sets
//! are conservative: invalidating more than strictly necessary is
//! acceptable, less is not. Like counts live inside post and comment
//! records, which is why a like dirties the feeds rather than some
//! separate counter key.

use crate::key::{KeyPattern, QueryTag};
use chirp_core::identifiers::PostId;
use serde::{Deserialize, Serialize};

/// Every mutation the client can issue against the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    /// Create or replace the viewer's profile.
    SaveProfile,
    CreatePost,
    DeletePost,
    LikePost,
    UnlikePost,
    CreateComment { post: PostId },
    DeleteComment { post: PostId },
    LikeComment { post: PostId },
    UnlikeComment { post: PostId },
    Follow,
    Unfollow,
}

impl MutationKind {
    /// Patterns marked stale when this mutation succeeds.
    pub fn invalidates(&self) -> Vec<KeyPattern> {
        match self {
            // A profile rewrite changes the author name and picture
            // denormalized onto every post.
            Self::SaveProfile => vec![
                KeyPattern::tag(QueryTag::OwnProfile),
                KeyPattern::tag(QueryTag::Posts),
                KeyPattern::tag(QueryTag::ProfilePicture),
            ],

            Self::CreatePost | Self::DeletePost | Self::LikePost | Self::UnlikePost => vec![
                KeyPattern::tag(QueryTag::Posts),
                KeyPattern::tag(QueryTag::FollowingFeed),
            ],

            Self::CreateComment { post }
            | Self::DeleteComment { post }
            | Self::LikeComment { post }
            | Self::UnlikeComment { post } => {
                vec![KeyPattern::scoped(QueryTag::Comments, post.0.to_string())]
            }

            Self::Follow | Self::Unfollow => vec![
                KeyPattern::tag(QueryTag::FollowingList),
                KeyPattern::tag(QueryTag::FollowersList),
                KeyPattern::tag(QueryTag::ProfileWithStats),
                KeyPattern::tag(QueryTag::FollowingFeed),
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveProfile => "save_profile",
            Self::CreatePost => "create_post",
            Self::DeletePost => "delete_post",
            Self::LikePost => "like_post",
            Self::UnlikePost => "unlike_post",
            Self::CreateComment { .. } => "create_comment",
            Self::DeleteComment { .. } => "delete_comment",
            Self::LikeComment { .. } => "like_comment",
            Self::UnlikeComment { .. } => "unlike_comment",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::QueryKey;

    #[test]
    fn post_mutations_dirty_both_feeds() {
        for kind in [
            MutationKind::CreatePost,
            MutationKind::DeletePost,
            MutationKind::LikePost,
            MutationKind::UnlikePost,
        ] {
            let patterns = kind.invalidates();
            assert!(patterns.iter().any(|p| p.matches(&QueryKey::posts())));
            assert!(patterns.iter().any(|p| p.matches(&QueryKey::following_feed())));
            assert_eq!(patterns.len(), 2);
        }
    }

    #[test]
    fn comment_mutations_scope_to_their_post() {
        let kind = MutationKind::LikeComment { post: PostId(7) };
        let patterns = kind.invalidates();
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].matches(&QueryKey::comments(PostId(7))));
        assert!(!patterns[0].matches(&QueryKey::comments(PostId(8))));
        assert!(!patterns[0].matches(&QueryKey::posts()));
    }

    #[test]
    fn follow_mutations_dirty_the_graph_views() {
        for kind in [MutationKind::Follow, MutationKind::Unfollow] {
            let patterns = kind.invalidates();
            let user = chirp_core::identifiers::UserId::new_from_entropy([1u8; 32]);
            assert!(patterns.iter().any(|p| p.matches(&QueryKey::following_list(user))));
            assert!(patterns.iter().any(|p| p.matches(&QueryKey::followers_list(user))));
            assert!(patterns
                .iter()
                .any(|p| p.matches(&QueryKey::profile_with_stats(user))));
            assert!(patterns.iter().any(|p| p.matches(&QueryKey::following_feed())));
            assert!(!patterns.iter().any(|p| p.matches(&QueryKey::posts())));
        }
    }

    #[test]
    fn save_profile_dirties_profile_posts_and_pictures() {
        let patterns = MutationKind::SaveProfile.invalidates();
        assert!(patterns.iter().any(|p| p.matches(&QueryKey::own_profile())));
        assert!(patterns.iter().any(|p| p.matches(&QueryKey::posts())));
        let user = chirp_core::identifiers::UserId::new_from_entropy([2u8; 32]);
        assert!(patterns
            .iter()
            .any(|p| p.matches(&QueryKey::profile_picture(user))));
    }
}
