//! Channel add/connect/disconnect/remove against the SQLite store.

use telerelay::channels;
use telerelay::error::{RelayError, ValidationError};
use telerelay::store::RelayStore;

use crate::support::{memory_store, seed_channels};

fn validation(err: RelayError) -> ValidationError {
    match err {
        RelayError::Validation(v) => v,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn add_channel_rejects_non_telegram_urls() {
    let store = memory_store().await;
    let err = channels::add_channel(&store, "news", "https://example.com/news")
        .await
        .expect_err("foreign url");
    assert!(matches!(
        validation(err),
        ValidationError::InvalidChannelUrl { .. }
    ));

    let err = channels::add_channel(&store, "news", "t.me/news")
        .await
        .expect_err("url without scheme");
    assert!(matches!(
        validation(err),
        ValidationError::InvalidChannelUrl { .. }
    ));
}

#[tokio::test]
async fn add_channel_rejects_link_like_names() {
    let store = memory_store().await;
    let err = channels::add_channel(&store, "t.me/news", "https://t.me/news")
        .await
        .expect_err("name looks like a link");
    assert!(matches!(
        validation(err),
        ValidationError::InvalidChannelName { .. }
    ));
}

#[tokio::test]
async fn add_channel_rejects_duplicate_name_or_url() {
    let store = memory_store().await;
    seed_channels(&store, &["news"]).await;

    let err = channels::add_channel(&store, "news", "https://t.me/other")
        .await
        .expect_err("duplicate name");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelAlreadyExists { .. }
    ));

    let err = channels::add_channel(&store, "other", "https://t.me/news")
        .await
        .expect_err("duplicate url");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelAlreadyExists { .. }
    ));
}

#[tokio::test]
async fn add_channel_rejects_links_the_bot_cannot_address() {
    let store = memory_store().await;
    for url in [
        "https://t.me/+AbCdEf",
        "https://t.me/joinchat/AbCdEf",
        "https://t.me/c/not-a-number",
    ] {
        let err = channels::add_channel(&store, "private", url)
            .await
            .expect_err("unaddressable link");
        assert!(matches!(
            validation(err),
            ValidationError::InvalidChannelUrl { .. }
        ));
    }
    assert!(store.list_channels().await.expect("list").is_empty());
}

#[tokio::test]
async fn add_channel_stores_the_canonical_link() {
    let store = memory_store().await;
    let channel = channels::add_channel(&store, "News", "https://t.me/News_Feed/42")
        .await
        .expect("added");
    assert_eq!(channel.url, "https://t.me/news_feed");

    // Same chat, different spelling.
    let err = channels::add_channel(&store, "news", "https://t.me/NEWS_FEED")
        .await
        .expect_err("same chat");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelAlreadyExists { .. }
    ));

    let found = channels::resolve(&store, "t.me/News_Feed")
        .await
        .expect("found by any spelling");
    assert_eq!(found.id, channel.id);

    let err = channels::connect(&store, "News", "https://t.me/news_feed")
        .await
        .expect_err("self relay");
    assert!(matches!(
        validation(err),
        ValidationError::SameEndpoint { .. }
    ));
}

#[tokio::test]
async fn references_resolve_by_name_or_any_link_form() {
    let store = memory_store().await;
    let chans = seed_channels(&store, &["news"]).await;

    for reference in ["news", "https://t.me/news", "t.me/news", "http://t.me/news"] {
        let found = channels::resolve(&store, reference)
            .await
            .expect("reference should resolve");
        assert_eq!(found.id, chans[0].id);
    }
}

#[tokio::test]
async fn unknown_reference_is_channel_not_found() {
    let store = memory_store().await;
    seed_channels(&store, &["a"]).await;

    let err = channels::connect(&store, "a", "ghost")
        .await
        .expect_err("missing output");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelNotFound { .. }
    ));

    let err = channels::disconnect(&store, "https://t.me/ghost", "a")
        .await
        .expect_err("missing input");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelNotFound { .. }
    ));
}

#[tokio::test]
async fn self_connection_is_always_rejected() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b"]).await;

    let err = channels::connect(&store, "a", "https://t.me/a")
        .await
        .expect_err("same endpoint");
    assert!(matches!(validation(err), ValidationError::SameEndpoint { .. }));

    channels::connect(&store, "a", "b").await.expect("a -> b");
    let err = channels::connect(&store, "b", "b")
        .await
        .expect_err("same endpoint");
    assert!(matches!(validation(err), ValidationError::SameEndpoint { .. }));
}

#[tokio::test]
async fn double_connect_and_stray_disconnect() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b"]).await;

    let err = channels::disconnect(&store, "a", "b")
        .await
        .expect_err("not connected yet");
    assert!(matches!(validation(err), ValidationError::NotConnected { .. }));

    let ends = channels::connect(&store, "a", "b").await.expect("a -> b");
    assert_eq!(ends.input.name, "a");
    assert_eq!(ends.output.name, "b");

    let err = channels::connect(&store, "a", "b")
        .await
        .expect_err("already connected");
    assert!(matches!(
        validation(err),
        ValidationError::AlreadyConnected { .. }
    ));

    channels::disconnect(&store, "a", "b").await.expect("a -/-> b");
    let graph = store.load_graph().await.expect("graph");
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn remove_channel_leaves_no_dangling_edges() {
    let store = memory_store().await;
    let chans = seed_channels(&store, &["a", "b", "c"]).await;
    channels::connect(&store, "a", "b").await.expect("a -> b");
    channels::connect(&store, "b", "c").await.expect("b -> c");
    channels::connect(&store, "a", "c").await.expect("a -> c");

    let removed = channels::remove_channel(&store, "b").await.expect("remove b");
    assert_eq!(removed.id, chans[1].id);

    let graph = store.load_graph().await.expect("graph");
    assert!(graph.channel(&chans[1].id).is_none());
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.has_edge(&chans[0].id, &chans[2].id));

    let dangling: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM channel_edges WHERE input_id = ?1 OR output_id = ?1",
    )
    .bind(chans[1].id.as_str())
    .fetch_one(store.pool())
    .await
    .expect("count");
    assert_eq!(dangling, 0);
}

#[tokio::test]
async fn remove_missing_channel_is_not_found() {
    let store = memory_store().await;
    let err = channels::remove_channel(&store, "ghost")
        .await
        .expect_err("nothing to remove");
    assert!(matches!(
        validation(err),
        ValidationError::ChannelNotFound { .. }
    ));
}

#[tokio::test]
async fn channel_detail_lists_neighbours() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b", "c"]).await;
    channels::connect(&store, "a", "b").await.expect("a -> b");
    channels::connect(&store, "b", "c").await.expect("b -> c");

    let detail = channels::channel_detail(&store, "b").await.expect("detail");
    assert_eq!(detail.inputs.len(), 1);
    assert_eq!(detail.inputs[0].name, "a");
    assert_eq!(detail.outputs.len(), 1);
    assert_eq!(detail.outputs[0].name, "c");

    let all = channels::all_details(&store).await.expect("details");
    let names: Vec<_> = all.iter().map(|d| d.channel.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}
