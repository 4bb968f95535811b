//! Pipeline ordering with rules loaded from the store.

use telerelay::filters::{add_filter, treat, FilterSet};
use telerelay::store::{FilterMode, RelayStore};

use crate::support::memory_store;

#[tokio::test]
async fn spam_is_suppressed_and_clean_text_passes() {
    let store = memory_store().await;
    add_filter(&store, FilterMode::Blacklist, "spam", None)
        .await
        .expect("blacklist");
    let filters = store.list_filters().await.expect("filters");

    assert_eq!(treat("this is spam", &filters), None);
    assert_eq!(
        treat("visit http://x.com/y now", &filters).as_deref(),
        Some("visit http://x.com/y now")
    );
}

#[tokio::test]
async fn replacements_apply_in_insertion_order() {
    let store = memory_store().await;
    add_filter(&store, FilterMode::Replacement, "hello", Some("hi"))
        .await
        .expect("first");
    add_filter(&store, FilterMode::Replacement, "world", Some("there"))
        .await
        .expect("second");
    let filters = store.list_filters().await.expect("filters");

    assert_eq!(treat("hello world", &filters).as_deref(), Some("hi there"));
}

#[tokio::test]
async fn full_pipeline_runs_all_three_stages() {
    let store = memory_store().await;
    add_filter(&store, FilterMode::LinkRemover, "x.com", None)
        .await
        .expect("link remover");
    add_filter(&store, FilterMode::Replacement, "Acme", Some("ACME"))
        .await
        .expect("replacement");
    add_filter(&store, FilterMode::Blacklist, "giveaway", None)
        .await
        .expect("blacklist");
    let set = FilterSet::partition(&store.list_filters().await.expect("filters"));

    assert_eq!(set.blacklist, ["giveaway"]);
    assert_eq!(set.link_domains, ["x.com"]);
    assert_eq!(
        set.apply("Acme ships today! Details: https://x.com/acme. Thanks.")
            .as_deref(),
        Some("ACME ships today! Thanks.")
    );
    assert_eq!(set.apply("Acme giveaway https://x.com/a"), None);
}
