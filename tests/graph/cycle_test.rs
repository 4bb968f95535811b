//! Loop detection through the channel operations.

use telerelay::channels;
use telerelay::error::{RelayError, ValidationError};
use telerelay::graph::would_create_cycle;

use crate::support::{memory_store, seed_channels};

fn loop_path(err: RelayError) -> Vec<String> {
    match err {
        RelayError::Validation(ValidationError::WouldCreateCycle { loop_path, .. }) => loop_path,
        other => panic!("expected WouldCreateCycle, got {other:?}"),
    }
}

#[tokio::test]
async fn reverse_edge_is_a_loop() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b"]).await;

    channels::connect(&store, "a", "b").await.expect("a -> b");
    let err = channels::connect(&store, "b", "a")
        .await
        .expect_err("b -> a closes a loop");
    assert_eq!(loop_path(err), ["b", "a", "b"]);
}

#[tokio::test]
async fn three_channel_loop_is_reported_in_full() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b", "c"]).await;

    channels::connect(&store, "a", "b").await.expect("a -> b");
    channels::connect(&store, "b", "c").await.expect("b -> c");
    let path = loop_path(
        channels::connect(&store, "c", "a")
            .await
            .expect_err("c -> a closes a loop"),
    );

    assert_eq!(path, ["c", "a", "b", "c"]);
    for name in ["a", "b", "c"] {
        assert!(path.iter().any(|p| p == name));
    }
}

#[tokio::test]
async fn loop_through_a_later_sibling_is_found() {
    let store = memory_store().await;
    seed_channels(&store, &["src", "leaf", "mid", "dst"]).await;

    // dst fans out to a dead end first, then to the branch that reaches src.
    channels::connect(&store, "dst", "leaf").await.expect("dst -> leaf");
    channels::connect(&store, "dst", "mid").await.expect("dst -> mid");
    channels::connect(&store, "mid", "src").await.expect("mid -> src");

    let path = loop_path(
        channels::connect(&store, "src", "dst")
            .await
            .expect_err("src -> dst closes a loop"),
    );
    assert_eq!(path, ["src", "dst", "mid", "src"]);
}

#[tokio::test]
async fn rejected_edge_is_not_persisted() {
    let store = memory_store().await;
    seed_channels(&store, &["a", "b"]).await;
    channels::connect(&store, "a", "b").await.expect("a -> b");
    let _ = channels::connect(&store, "b", "a").await;

    let graph = store_graph(&store).await;
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.find_any_cycle().is_none());
}

#[tokio::test]
async fn detection_is_repeatable_and_read_only() {
    let store = memory_store().await;
    let chans = seed_channels(&store, &["a", "b", "c"]).await;
    channels::connect(&store, "a", "b").await.expect("a -> b");
    channels::connect(&store, "b", "c").await.expect("b -> c");

    let graph = store_graph(&store).await;
    let first = would_create_cycle(&graph, &chans[2].id, &chans[0].id);
    let second = would_create_cycle(&graph, &chans[2].id, &chans[0].id);
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(graph.edge_count(), 2);
}

async fn store_graph(store: &telerelay::store::SqliteStore) -> telerelay::graph::ChannelGraph {
    use telerelay::store::RelayStore;
    store.load_graph().await.expect("graph should load")
}
