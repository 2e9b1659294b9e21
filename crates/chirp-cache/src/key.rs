//! Cache keys and invalidation patterns.
//!
//! A key is a domain tag plus zero or more scalar discriminators and is
//! compared structurally: same tag, same discriminators, same entry.

use chirp_core::identifiers::{PostId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain tag of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryTag {
    /// Community feed (every post).
    Posts,
    /// Feed restricted to followed authors.
    FollowingFeed,
    /// A single post.
    Post,
    /// Comment list of a single post.
    Comments,
    /// The viewer's own profile.
    OwnProfile,
    /// Another user's profile with follow-graph stats.
    ProfileWithStats,
    /// Users a subject follows.
    FollowingList,
    /// Users following a subject.
    FollowersList,
    /// Profile lookup by username alias.
    UserByUsername,
    /// Username alias to identity resolution.
    IdentityByUsername,
    /// Remote username-availability verdicts.
    UsernameAvailability,
    /// Raw profile-picture payloads.
    ProfilePicture,
}

impl QueryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::FollowingFeed => "followingFeed",
            Self::Post => "post",
            Self::Comments => "comments",
            Self::OwnProfile => "ownProfile",
            Self::ProfileWithStats => "profileWithStats",
            Self::FollowingList => "followingList",
            Self::FollowersList => "followersList",
            Self::UserByUsername => "userByUsername",
            Self::IdentityByUsername => "identityByUsername",
            Self::UsernameAvailability => "usernameAvailability",
            Self::ProfilePicture => "profilePicture",
        }
    }
}

impl fmt::Display for QueryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural cache key: a tag plus scalar discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    tag: QueryTag,
    args: Vec<String>,
}

impl QueryKey {
    pub fn new(tag: QueryTag, args: Vec<String>) -> Self {
        Self { tag, args }
    }

    /// A key with no discriminators.
    pub fn bare(tag: QueryTag) -> Self {
        Self::new(tag, Vec::new())
    }

    pub fn tag(&self) -> QueryTag {
        self.tag
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    // =========================================================================
    // Domain constructors
    // =========================================================================

    pub fn posts() -> Self {
        Self::bare(QueryTag::Posts)
    }

    pub fn following_feed() -> Self {
        Self::bare(QueryTag::FollowingFeed)
    }

    pub fn post(id: PostId) -> Self {
        Self::new(QueryTag::Post, vec![id.0.to_string()])
    }

    pub fn comments(post: PostId) -> Self {
        Self::new(QueryTag::Comments, vec![post.0.to_string()])
    }

    pub fn own_profile() -> Self {
        Self::bare(QueryTag::OwnProfile)
    }

    pub fn profile_with_stats(user: UserId) -> Self {
        Self::new(QueryTag::ProfileWithStats, vec![user.to_string()])
    }

    pub fn following_list(user: UserId) -> Self {
        Self::new(QueryTag::FollowingList, vec![user.to_string()])
    }

    pub fn followers_list(user: UserId) -> Self {
        Self::new(QueryTag::FollowersList, vec![user.to_string()])
    }

    pub fn user_by_username(username: &str) -> Self {
        Self::new(QueryTag::UserByUsername, vec![username.to_string()])
    }

    pub fn identity_by_username(username: &str) -> Self {
        Self::new(QueryTag::IdentityByUsername, vec![username.to_string()])
    }

    pub fn username_availability(username: &str) -> Self {
        Self::new(QueryTag::UsernameAvailability, vec![username.to_string()])
    }

    pub fn profile_picture(user: UserId) -> Self {
        Self::new(QueryTag::ProfilePicture, vec![user.to_string()])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        for arg in &self.args {
            write!(f, ":{arg}")?;
        }
        Ok(())
    }
}

/// Invalidation pattern: matches every key with the same tag whose
/// discriminators start with the pattern's discriminators. An empty
/// discriminator list matches the whole tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPattern {
    tag: QueryTag,
    args: Vec<String>,
}

impl KeyPattern {
    /// Match every key under a tag.
    pub fn tag(tag: QueryTag) -> Self {
        Self {
            tag,
            args: Vec::new(),
        }
    }

    /// Match keys under a tag scoped to one discriminator.
    pub fn scoped(tag: QueryTag, arg: impl Into<String>) -> Self {
        Self {
            tag,
            args: vec![arg.into()],
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        self.tag == key.tag && key.args.starts_with(&self.args)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        for arg in &self.args {
            write!(f, ":{arg}")?;
        }
        write!(f, ":*")
    }
}
