//! Feed reads and post/comment mutations, routed through the query
//! store so every view sees the same cached state and every mutation
//! invalidates its declared dependency set.

use crate::navigator::FeedTab;
use chirp_cache::{MutationKind, QueryKey, QueryStore, ReadOptions, Snapshot};
use chirp_core::api::SocialApi;
use chirp_core::error::ApiError;
use chirp_core::identifiers::{CommentId, PostId};
use chirp_core::records::{Comment, Post};
use std::sync::Arc;

/// Longest post the composer accepts.
pub const POST_MAX_LEN: usize = 280;

/// Typed feed operations over the shared store.
pub struct FeedService {
    store: Arc<QueryStore>,
    api: Arc<dyn SocialApi>,
}

impl FeedService {
    pub fn new(store: Arc<QueryStore>, api: Arc<dyn SocialApi>) -> Self {
        Self { store, api }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Community feed: every post.
    pub async fn community_feed(&self, enabled: bool) -> Result<Snapshot<Vec<Post>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::posts(),
                ReadOptions::enabled_if(enabled),
                move || async move { api.all_posts().await },
            )
            .await
    }

    /// Feed restricted to followed authors.
    pub async fn following_feed(&self, enabled: bool) -> Result<Snapshot<Vec<Post>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::following_feed(),
                ReadOptions::enabled_if(enabled),
                move || async move { api.following_feed().await },
            )
            .await
    }

    /// The feed backing the given home tab.
    pub async fn feed_for_tab(
        &self,
        tab: FeedTab,
        enabled: bool,
    ) -> Result<Snapshot<Vec<Post>>, ApiError> {
        match tab {
            FeedTab::Community => self.community_feed(enabled).await,
            FeedTab::Following => self.following_feed(enabled).await,
        }
    }

    /// A single post.
    pub async fn post(
        &self,
        id: PostId,
        enabled: bool,
    ) -> Result<Snapshot<Option<Post>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::post(id),
                ReadOptions::enabled_if(enabled),
                move || async move { api.post(id).await },
            )
            .await
    }

    /// Comment list of a post.
    pub async fn comments(
        &self,
        post: PostId,
        enabled: bool,
    ) -> Result<Snapshot<Vec<Comment>>, ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .read(
                QueryKey::comments(post),
                ReadOptions::enabled_if(enabled),
                move || async move { api.post_comments(post).await },
            )
            .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create_post(&self, content: &str) -> Result<(), ApiError> {
        let content = validate_body(content)?;
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::CreatePost, move || async move {
                api.create_post(&content).await
            })
            .await
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::DeletePost, move || async move {
                api.delete_post(id).await
            })
            .await
    }

    pub async fn like_post(&self, id: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::LikePost, move || async move {
                api.like_post(id).await
            })
            .await
    }

    pub async fn unlike_post(&self, id: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::UnlikePost, move || async move {
                api.unlike_post(id).await
            })
            .await
    }

    pub async fn create_comment(
        &self,
        post: PostId,
        parent: Option<CommentId>,
        content: &str,
    ) -> Result<(), ApiError> {
        let content = validate_body(content)?;
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::CreateComment { post }, move || async move {
                api.create_comment(post, parent, &content).await
            })
            .await
    }

    pub async fn delete_comment(&self, id: CommentId, post: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::DeleteComment { post }, move || async move {
                api.delete_comment(id).await
            })
            .await
    }

    pub async fn like_comment(&self, id: CommentId, post: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::LikeComment { post }, move || async move {
                api.like_comment(id).await
            })
            .await
    }

    pub async fn unlike_comment(&self, id: CommentId, post: PostId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.store
            .mutate(MutationKind::UnlikeComment { post }, move || async move {
                api.unlike_comment(id).await
            })
            .await
    }
}

/// Trim and bound-check a post or comment body before it goes anywhere
/// near the remote.
fn validate_body(content: &str) -> Result<String, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("content must not be empty"));
    }
    if trimmed.chars().count() > POST_MAX_LEN {
        return Err(ApiError::validation(format!(
            "content must be at most {POST_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
