//! In-memory remote social API.

use async_trait::async_trait;
use chirp_core::api::SocialApi;
use chirp_core::error::ApiError;
use chirp_core::identifiers::{CommentId, PostId, UserId};
use chirp_core::records::{Comment, Post, ProfileDraft, UserProfile};
use chirp_core::time::Clock;
use chirp_core::username::validate_username_format;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoredProfile {
    username: String,
    name: Option<String>,
    bio: Option<String>,
    created_at_ms: u64,
    updated_at_ms: u64,
}

#[derive(Default)]
struct MockState {
    viewer: Option<UserId>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    profiles: HashMap<UserId, StoredProfile>,
    /// Usernames reserved without a backing profile.
    claimed: HashSet<String>,
    following: HashMap<UserId, Vec<UserId>>,
    pictures: HashMap<UserId, Vec<u8>>,
    next_post_id: u64,
    next_comment_id: u64,
    next_ts_ms: u64,
}

impl MockState {
    fn username_taken(&self, username: &str, by_other_than: Option<UserId>) -> bool {
        if self.claimed.contains(username) {
            return true;
        }
        self.profiles
            .iter()
            .any(|(id, p)| p.username == username && by_other_than != Some(*id))
    }

    fn follows(&self, follower: UserId, followed: UserId) -> bool {
        self.following
            .get(&follower)
            .is_some_and(|list| list.contains(&followed))
    }

    fn build_profile(&self, user: UserId) -> Option<UserProfile> {
        let stored = self.profiles.get(&user)?;
        let followers_count = self
            .following
            .values()
            .filter(|list| list.contains(&user))
            .count() as u64;
        let following_count = self.following.get(&user).map_or(0, |l| l.len() as u64);
        let posts_count = self.posts.iter().filter(|p| p.author == user).count() as u64;
        let followed_by_viewer = self
            .viewer
            .is_some_and(|viewer| self.follows(viewer, user));
        Some(UserProfile {
            username: stored.username.clone(),
            name: stored.name.clone(),
            bio: stored.bio.clone(),
            created_at_ms: stored.created_at_ms,
            updated_at_ms: stored.updated_at_ms,
            posts_count,
            followers_count,
            following_count,
            followed_by_viewer,
        })
    }

    fn render_post(&self, post: &Post) -> Post {
        let mut out = post.clone();
        out.author_name = self
            .profiles
            .get(&post.author)
            .map(|p| p.name.clone().unwrap_or_else(|| p.username.clone()));
        out.liked_by_viewer = self
            .viewer
            .is_some_and(|viewer| post.liked_by.contains(&viewer));
        out
    }

    fn render_comment(&self, comment: &Comment) -> Comment {
        let mut out = comment.clone();
        out.author_name = self
            .profiles
            .get(&comment.author)
            .map(|p| p.name.clone().unwrap_or_else(|| p.username.clone()));
        out.liked_by_viewer = self
            .viewer
            .is_some_and(|viewer| comment.liked_by.contains(&viewer));
        out
    }

    fn next_timestamp(&mut self) -> u64 {
        self.next_ts_ms += 1_000;
        self.next_ts_ms
    }
}

/// In-memory [`SocialApi`] with call counting, one-shot failure
/// injection and optional per-endpoint latency.
#[derive(Default)]
pub struct MockSocialApi {
    state: Mutex<MockState>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, VecDeque<ApiError>>>,
    latency: Mutex<HashMap<String, (u64, Arc<dyn Clock>)>>,
}

impl MockSocialApi {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Test instrumentation
    // =========================================================================

    /// How many times the named endpoint was invoked.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls.lock().get(endpoint).copied().unwrap_or(0)
    }

    /// Queue a one-shot failure for the named endpoint.
    pub fn fail_once(&self, endpoint: &str, err: ApiError) {
        self.failures
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(err);
    }

    /// Make the named endpoint sleep on the given clock before replying.
    pub fn set_latency(&self, endpoint: &str, ms: u64, clock: impl Clock + 'static) {
        self.latency
            .lock()
            .insert(endpoint.to_string(), (ms, Arc::new(clock)));
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub fn set_viewer(&self, user: Option<UserId>) {
        self.state.lock().viewer = user;
    }

    /// Reserve a username without creating a profile for it.
    pub fn claim_username(&self, username: &str) {
        self.state.lock().claimed.insert(username.to_string());
    }

    pub fn seed_profile(&self, user: UserId, username: &str) {
        let mut state = self.state.lock();
        let ts = state.next_timestamp();
        state.profiles.insert(
            user,
            StoredProfile {
                username: username.to_string(),
                name: None,
                bio: None,
                created_at_ms: ts,
                updated_at_ms: ts,
            },
        );
    }

    pub fn seed_post(&self, author: UserId, content: &str) -> PostId {
        let mut state = self.state.lock();
        state.next_post_id += 1;
        let id = PostId(state.next_post_id);
        let created_at_ms = state.next_timestamp();
        state.posts.push(Post {
            id,
            author,
            author_name: None,
            content: content.to_string(),
            created_at_ms,
            liked_by: Vec::new(),
            liked_by_viewer: false,
        });
        id
    }

    pub fn seed_like(&self, post: PostId, user: UserId) {
        let mut state = self.state.lock();
        if let Some(p) = state.posts.iter_mut().find(|p| p.id == post) {
            if !p.liked_by.contains(&user) {
                p.liked_by.push(user);
            }
        }
    }

    /// Seed a follower → followed edge directly.
    pub fn seed_follow(&self, follower: UserId, followed: UserId) {
        let mut state = self.state.lock();
        let list = state.following.entry(follower).or_default();
        if !list.contains(&followed) {
            list.push(followed);
        }
    }

    pub fn set_picture(&self, user: UserId, payload: Vec<u8>) {
        self.state.lock().pictures.insert(user, payload);
    }

    pub fn clear_picture(&self, user: UserId) {
        self.state.lock().pictures.remove(&user);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Count the call, apply latency, pop any injected failure.
    async fn begin(&self, endpoint: &str) -> Result<(), ApiError> {
        *self.calls.lock().entry(endpoint.to_string()).or_insert(0) += 1;
        let delay = self.latency.lock().get(endpoint).cloned();
        if let Some((ms, clock)) = delay {
            clock.sleep_ms(ms).await;
        }
        if let Some(err) = self
            .failures
            .lock()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        Ok(())
    }

    fn viewer(&self) -> Result<UserId, ApiError> {
        self.state.lock().viewer.ok_or(ApiError::NotAuthenticated)
    }
}

#[async_trait]
impl SocialApi for MockSocialApi {
    async fn own_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        self.begin("own_profile").await?;
        let state = self.state.lock();
        let Some(viewer) = state.viewer else {
            return Err(ApiError::NotAuthenticated);
        };
        Ok(state.build_profile(viewer))
    }

    async fn save_profile(&self, draft: ProfileDraft) -> Result<(), ApiError> {
        self.begin("save_profile").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        validate_username_format(&draft.username)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        if state.username_taken(&draft.username, Some(viewer)) {
            return Err(ApiError::validation("username is taken or reserved"));
        }
        let ts = state.next_timestamp();
        let created_at_ms = state
            .profiles
            .get(&viewer)
            .map_or(ts, |p| p.created_at_ms);
        state.profiles.insert(
            viewer,
            StoredProfile {
                username: draft.username,
                name: draft.name,
                bio: draft.bio,
                created_at_ms,
                updated_at_ms: ts,
            },
        );
        if let Some(picture) = draft.picture {
            state.pictures.insert(viewer, picture);
        }
        Ok(())
    }

    async fn check_username_availability(&self, username: &str) -> Result<bool, ApiError> {
        self.begin("check_username_availability").await?;
        let state = self.state.lock();
        Ok(!state.username_taken(username, None))
    }

    async fn profile_by_username(&self, username: &str) -> Result<Option<UserProfile>, ApiError> {
        self.begin("profile_by_username").await?;
        let state = self.state.lock();
        let user = state
            .profiles
            .iter()
            .find(|(_, p)| p.username == username)
            .map(|(id, _)| *id);
        Ok(user.and_then(|u| state.build_profile(u)))
    }

    async fn identity_by_username(&self, username: &str) -> Result<Option<UserId>, ApiError> {
        self.begin("identity_by_username").await?;
        let state = self.state.lock();
        Ok(state
            .profiles
            .iter()
            .find(|(_, p)| p.username == username)
            .map(|(id, _)| *id))
    }

    async fn profile_with_stats(&self, user: UserId) -> Result<Option<UserProfile>, ApiError> {
        self.begin("profile_with_stats").await?;
        Ok(self.state.lock().build_profile(user))
    }

    async fn profile_picture(&self, user: UserId) -> Result<Option<Vec<u8>>, ApiError> {
        self.begin("profile_picture").await?;
        Ok(self.state.lock().pictures.get(&user).cloned())
    }

    async fn all_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.begin("all_posts").await?;
        let state = self.state.lock();
        Ok(state.posts.iter().map(|p| state.render_post(p)).collect())
    }

    async fn following_feed(&self) -> Result<Vec<Post>, ApiError> {
        self.begin("following_feed").await?;
        let viewer = self.viewer()?;
        let state = self.state.lock();
        Ok(state
            .posts
            .iter()
            .filter(|p| state.follows(viewer, p.author))
            .map(|p| state.render_post(p))
            .collect())
    }

    async fn post(&self, id: PostId) -> Result<Option<Post>, ApiError> {
        self.begin("post").await?;
        let state = self.state.lock();
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.render_post(p)))
    }

    async fn create_post(&self, content: &str) -> Result<(), ApiError> {
        self.begin("create_post").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        state.next_post_id += 1;
        let id = PostId(state.next_post_id);
        let created_at_ms = state.next_timestamp();
        state.posts.push(Post {
            id,
            author: viewer,
            author_name: None,
            content: content.to_string(),
            created_at_ms,
            liked_by: Vec::new(),
            liked_by_viewer: false,
        });
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        self.begin("delete_post").await?;
        self.viewer()?;
        let mut state = self.state.lock();
        state.posts.retain(|p| p.id != id);
        state.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn like_post(&self, id: PostId) -> Result<(), ApiError> {
        self.begin("like_post").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Err(ApiError::not_found("post"));
        };
        if !post.liked_by.contains(&viewer) {
            post.liked_by.push(viewer);
        }
        Ok(())
    }

    async fn unlike_post(&self, id: PostId) -> Result<(), ApiError> {
        self.begin("unlike_post").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        let Some(post) = state.posts.iter_mut().find(|p| p.id == id) else {
            return Err(ApiError::not_found("post"));
        };
        post.liked_by.retain(|u| *u != viewer);
        Ok(())
    }

    async fn post_comments(&self, post: PostId) -> Result<Vec<Comment>, ApiError> {
        self.begin("post_comments").await?;
        let state = self.state.lock();
        Ok(state
            .comments
            .iter()
            .filter(|c| c.post_id == post)
            .map(|c| state.render_comment(c))
            .collect())
    }

    async fn create_comment(
        &self,
        post: PostId,
        parent: Option<CommentId>,
        content: &str,
    ) -> Result<(), ApiError> {
        self.begin("create_comment").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        if !state.posts.iter().any(|p| p.id == post) {
            return Err(ApiError::not_found("post"));
        }
        state.next_comment_id += 1;
        let id = CommentId(state.next_comment_id);
        let created_at_ms = state.next_timestamp();
        state.comments.push(Comment {
            id,
            post_id: post,
            parent,
            author: viewer,
            author_name: None,
            content: content.to_string(),
            created_at_ms,
            liked_by: Vec::new(),
            liked_by_viewer: false,
        });
        Ok(())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), ApiError> {
        self.begin("delete_comment").await?;
        self.viewer()?;
        self.state.lock().comments.retain(|c| c.id != id);
        Ok(())
    }

    async fn like_comment(&self, id: CommentId) -> Result<(), ApiError> {
        self.begin("like_comment").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        let Some(comment) = state.comments.iter_mut().find(|c| c.id == id) else {
            return Err(ApiError::not_found("comment"));
        };
        if !comment.liked_by.contains(&viewer) {
            comment.liked_by.push(viewer);
        }
        Ok(())
    }

    async fn unlike_comment(&self, id: CommentId) -> Result<(), ApiError> {
        self.begin("unlike_comment").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        let Some(comment) = state.comments.iter_mut().find(|c| c.id == id) else {
            return Err(ApiError::not_found("comment"));
        };
        comment.liked_by.retain(|u| *u != viewer);
        Ok(())
    }

    async fn follow(&self, user: UserId) -> Result<(), ApiError> {
        self.begin("follow").await?;
        let viewer = self.viewer()?;
        if viewer == user {
            return Err(ApiError::validation("cannot follow yourself"));
        }
        let mut state = self.state.lock();
        let list = state.following.entry(viewer).or_default();
        if !list.contains(&user) {
            list.push(user);
        }
        Ok(())
    }

    async fn unfollow(&self, user: UserId) -> Result<(), ApiError> {
        self.begin("unfollow").await?;
        let viewer = self.viewer()?;
        let mut state = self.state.lock();
        if let Some(list) = state.following.get_mut(&viewer) {
            list.retain(|u| *u != user);
        }
        Ok(())
    }

    async fn following_list(&self, user: UserId) -> Result<Vec<UserId>, ApiError> {
        self.begin("following_list").await?;
        Ok(self
            .state
            .lock()
            .following
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn followers_list(&self, user: UserId) -> Result<Vec<UserId>, ApiError> {
        self.begin("followers_list").await?;
        let state = self.state.lock();
        Ok(state
            .following
            .iter()
            .filter(|(_, list)| list.contains(&user))
            .map(|(id, _)| *id)
            .collect())
    }
}
