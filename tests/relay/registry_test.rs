//! Subscription registry keyed by edge.

use std::sync::Arc;

use async_trait::async_trait;

use telerelay::error::RelayError;
use telerelay::relay::{EdgeKey, Outbound, RelayHandler, Subscription, SubscriptionRegistry};
use telerelay::store::ChannelId;

struct Echo;

#[async_trait]
impl RelayHandler for Echo {
    async fn handle(&self, text: &str) -> Result<Option<Outbound>, RelayError> {
        Ok(Some(Outbound {
            url: "https://t.me/out".to_owned(),
            text: text.to_owned(),
        }))
    }
}

fn subscription(input: &str, output: &str) -> Subscription {
    Subscription {
        key: EdgeKey::new(ChannelId::from(input), ChannelId::from(output)),
        source_url: format!("https://t.me/{input}"),
        output_url: format!("https://t.me/{output}"),
        handler: Arc::new(Echo),
    }
}

#[test]
fn keys_are_exact_pairs() {
    let mut registry = SubscriptionRegistry::new();
    registry.insert(subscription("ab", "c"));
    registry.insert(subscription("a", "bc"));

    // Pairs whose concatenations collide stay distinct.
    assert_eq!(registry.len(), 2);
    assert!(registry.contains(&EdgeKey::new("ab".into(), "c".into())));
    assert!(registry.contains(&EdgeKey::new("a".into(), "bc".into())));
    assert!(!registry.contains(&EdgeKey::new("c".into(), "ab".into())));
}

#[test]
fn insert_replaces_and_remove_returns() {
    let mut registry = SubscriptionRegistry::new();
    assert!(registry.insert(subscription("a", "b")).is_none());
    assert!(registry.insert(subscription("a", "b")).is_some());
    assert_eq!(registry.len(), 1);

    let key = EdgeKey::new("a".into(), "b".into());
    let removed = registry.remove(&key).expect("present");
    assert_eq!(removed.output_url, "https://t.me/b");
    assert!(registry.is_empty());
    assert!(registry.remove(&key).is_none());
}

#[test]
fn keys_come_out_ordered() {
    let mut registry = SubscriptionRegistry::new();
    registry.insert(subscription("b", "a"));
    registry.insert(subscription("a", "c"));
    registry.insert(subscription("a", "b"));

    let keys: Vec<String> = registry.keys().iter().map(ToString::to_string).collect();
    assert_eq!(keys, ["a -> b", "a -> c", "b -> a"]);
}
