//! End-to-end invalidation behavior: mutations dirty exactly their
//! declared dependency set, and the next read refetches exactly once.

use chirp_app::AppCore;
use chirp_core::identifiers::UserId;
use chirp_core::records::ProfileDraft;
use chirp_core::time::SimulatedClock;
use chirp_testkit::{fixtures, MockSessionApi, MockSocialApi};
use std::sync::Arc;

struct Harness {
    app: AppCore,
    social: Arc<MockSocialApi>,
    session: Arc<MockSessionApi>,
}

async fn harness() -> Harness {
    let clock = SimulatedClock::new(100_000);
    let social = Arc::new(MockSocialApi::new());
    let session = Arc::new(MockSessionApi::new());
    let app = AppCore::new(
        social.clone(),
        session.clone(),
        Arc::new(clock.clone()),
    );

    app.login().await.expect("login succeeds");
    social.set_viewer(Some(session.default_user()));

    Harness {
        app,
        social,
        session,
    }
}

fn viewer(h: &Harness) -> UserId {
    h.session.default_user()
}

#[tokio::test]
async fn like_post_invalidates_feeds_and_refetches_once() {
    let h = harness().await;
    let author = fixtures::user(2);
    h.social.seed_profile(author, "wren");
    let post = h.social.seed_post(author, "hello");
    h.social.seed_follow(viewer(&h), author);

    // Warm every view; repeated reads stay cached
    for _ in 0..2 {
        h.app.feed().community_feed(true).await.expect("community");
        h.app.feed().following_feed(true).await.expect("following");
        h.app.feed().comments(post, true).await.expect("comments");
    }
    assert_eq!(h.social.call_count("all_posts"), 1);
    assert_eq!(h.social.call_count("following_feed"), 1);
    assert_eq!(h.social.call_count("post_comments"), 1);

    h.app.feed().like_post(post).await.expect("like succeeds");

    let community = h.app.feed().community_feed(true).await.expect("community");
    h.app.feed().following_feed(true).await.expect("following");
    h.app.feed().comments(post, true).await.expect("comments");

    assert_eq!(h.social.call_count("all_posts"), 2, "community feed refetched once");
    assert_eq!(h.social.call_count("following_feed"), 2, "following feed refetched once");
    assert_eq!(
        h.social.call_count("post_comments"),
        1,
        "comment list was outside the invalidation set"
    );

    let posts = community.value.expect("feed has value");
    assert!(posts[0].liked_by.contains(&viewer(&h)), "refetch observed the like");
}

#[tokio::test]
async fn create_post_invalidates_both_feeds() {
    let h = harness().await;

    h.app.feed().community_feed(true).await.expect("community");
    h.app.feed().following_feed(true).await.expect("following");

    h.app
        .feed()
        .create_post("first post")
        .await
        .expect("create succeeds");

    let community = h.app.feed().community_feed(true).await.expect("community");
    h.app.feed().following_feed(true).await.expect("following");

    assert_eq!(h.social.call_count("all_posts"), 2);
    assert_eq!(h.social.call_count("following_feed"), 2);
    assert_eq!(
        community.value.as_deref().map(Vec::len),
        Some(1),
        "new post visible after refetch"
    );
}

#[tokio::test]
async fn failed_mutation_leaves_everything_fresh() {
    let h = harness().await;
    let author = fixtures::user(2);
    let post = h.social.seed_post(author, "hello");

    h.app.feed().community_feed(true).await.expect("community");
    h.social
        .fail_once("like_post", chirp_core::ApiError::transient("write timeout"));

    let err = h.app.feed().like_post(post).await.expect_err("like fails");
    assert!(err.is_transient());

    h.app.feed().community_feed(true).await.expect("community");
    assert_eq!(
        h.social.call_count("all_posts"),
        1,
        "failed mutation triggered no invalidation"
    );
}

#[tokio::test]
async fn follow_invalidates_graph_views_but_not_community_feed() {
    let h = harness().await;
    let me = viewer(&h);
    let other = fixtures::user(2);
    h.social.seed_profile(other, "lark");

    h.app.profiles().following_list(me, true).await.expect("following list");
    h.app.profiles().followers_list(other, true).await.expect("followers list");
    h.app
        .profiles()
        .profile_with_stats(other, true)
        .await
        .expect("profile with stats");
    h.app.feed().following_feed(true).await.expect("following feed");
    h.app.feed().community_feed(true).await.expect("community feed");

    h.app.profiles().follow(other).await.expect("follow succeeds");

    let following = h
        .app
        .profiles()
        .following_list(me, true)
        .await
        .expect("following list");
    h.app.profiles().followers_list(other, true).await.expect("followers list");
    let profile = h
        .app
        .profiles()
        .profile_with_stats(other, true)
        .await
        .expect("profile with stats");
    h.app.feed().following_feed(true).await.expect("following feed");
    h.app.feed().community_feed(true).await.expect("community feed");

    assert_eq!(h.social.call_count("following_list"), 2);
    assert_eq!(h.social.call_count("followers_list"), 2);
    assert_eq!(h.social.call_count("profile_with_stats"), 2);
    assert_eq!(h.social.call_count("following_feed"), 2);
    assert_eq!(h.social.call_count("all_posts"), 1, "community feed untouched");

    let following = following.value.expect("list value");
    assert!(following.contains(&other));
    let profile = profile.value.expect("profile value");
    let profile = (*profile).as_ref().expect("profile exists");
    assert!(profile.followed_by_viewer);
    assert_eq!(profile.followers_count, 1);
}

#[tokio::test]
async fn comment_mutations_only_dirty_their_posts_list() {
    let h = harness().await;
    let author = fixtures::user(2);
    let first = h.social.seed_post(author, "first");
    let second = h.social.seed_post(author, "second");

    h.app
        .feed()
        .create_comment(first, None, "nice")
        .await
        .expect("comment created");

    h.app.feed().comments(first, true).await.expect("first comments");
    h.app.feed().comments(second, true).await.expect("second comments");
    assert_eq!(h.social.call_count("post_comments"), 2);

    let listed = h.app.feed().comments(first, true).await.expect("cached");
    let comment_id = listed.value.expect("comments value")[0].id;

    h.app
        .feed()
        .like_comment(comment_id, first)
        .await
        .expect("like succeeds");

    h.app.feed().comments(first, true).await.expect("first comments");
    h.app.feed().comments(second, true).await.expect("second comments");
    assert_eq!(
        h.social.call_count("post_comments"),
        3,
        "only the first post's comment list refetched"
    );
}

#[tokio::test]
async fn save_profile_refreshes_profile_posts_and_picture() {
    let h = harness().await;
    let me = viewer(&h);
    h.social.set_picture(me, vec![1]);

    h.app.profiles().own_profile(true).await.expect("own profile");
    h.app.feed().community_feed(true).await.expect("community");
    let old_handle = h
        .app
        .avatars()
        .handle_for(me, true)
        .await
        .expect("avatar read")
        .expect("handle exists");

    h.app
        .profiles()
        .save_profile(ProfileDraft {
            username: "wren".to_string(),
            name: Some("Wren".to_string()),
            bio: None,
            picture: Some(vec![2]),
        })
        .await
        .expect("profile saved");

    let own = h.app.profiles().own_profile(true).await.expect("own profile");
    h.app.feed().community_feed(true).await.expect("community");
    let new_handle = h
        .app
        .avatars()
        .handle_for(me, true)
        .await
        .expect("avatar read")
        .expect("handle exists");

    assert_eq!(h.social.call_count("own_profile"), 2);
    assert_eq!(h.social.call_count("all_posts"), 2);
    assert_eq!(h.social.call_count("profile_picture"), 2);

    let own = own.value.expect("profile value");
    let own = (*own).as_ref().expect("profile exists");
    assert_eq!(own.username, "wren");
    assert!(old_handle.is_released(), "superseded avatar handle released");
    assert_eq!(new_handle.bytes(), Some(&[2u8][..]));
}
