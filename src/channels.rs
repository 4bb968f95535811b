//! Channel graph operations: add, resolve, connect, disconnect, remove.
//!
//! These work at the store level only. Edge changes are returned as staged
//! [`PendingChange`]s so the sync engine can order the commit against the
//! live subscription update; [`connect`] and [`disconnect`] commit directly
//! for callers that do not manage subscriptions.

use tracing::debug;

use crate::error::{RelayError, ValidationError};
use crate::graph::{would_create_cycle, ChannelGraph};
use crate::telegram::ChatTarget;
use crate::store::{
    Channel, ChannelRef, EdgeChange, PendingChange, RelayStore, CANONICAL_URL_PREFIX,
    CHANNEL_URL_PREFIXES,
};

/// The two resolved ends of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Source channel.
    pub input: Channel,
    /// Destination channel.
    pub output: Channel,
}

/// A channel together with its neighbours, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDetail {
    /// The channel itself.
    pub channel: Channel,
    /// Channels relaying into it.
    pub inputs: Vec<Channel>,
    /// Channels it relays to.
    pub outputs: Vec<Channel>,
}

/// Create a channel.
///
/// The url must be a `https://t.me/` link the bot can address: a public
/// username or a private `c/<id>` link. It is stored in canonical form
/// (lowercased username, no message suffix), and neither name nor canonical
/// url may be taken already.
pub async fn add_channel(
    store: &dyn RelayStore,
    name: &str,
    url: &str,
) -> Result<Channel, RelayError> {
    let name = name.trim();
    let url = url.trim();

    if name.is_empty() || CHANNEL_URL_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return Err(ValidationError::InvalidChannelName {
            name: name.to_owned(),
        }
        .into());
    }
    let target = url
        .strip_prefix(CANONICAL_URL_PREFIX)
        .filter(|rest| !rest.is_empty())
        .and_then(|_| ChatTarget::parse(url).ok())
        .ok_or_else(|| ValidationError::InvalidChannelUrl {
            url: url.to_owned(),
        })?;
    let url = target.canonical_url();

    if let Some(existing) = store.find_conflicting_channel(name, &url).await? {
        return Err(ValidationError::ChannelAlreadyExists {
            name: existing.name,
            url: existing.url,
        }
        .into());
    }

    let channel = store.insert_channel(name, &url).await?;
    debug!(name = %channel.name, url = %channel.url, "channel added");
    Ok(channel)
}

/// Resolve a raw name-or-url reference.
///
/// Links are compared in their canonical form, so `t.me/News` finds the
/// channel stored as `https://t.me/news`.
pub async fn resolve(store: &dyn RelayStore, raw: &str) -> Result<Channel, RelayError> {
    let reference = match ChannelRef::parse(raw) {
        ChannelRef::Url(url) => ChannelRef::Url(
            ChatTarget::parse(&url)
                .map(|target| target.canonical_url())
                .unwrap_or(url),
        ),
        name => name,
    };
    store.find_channel(&reference).await?.ok_or_else(|| {
        ValidationError::ChannelNotFound {
            reference: reference.to_string(),
        }
        .into()
    })
}

async fn resolve_pair(
    store: &dyn RelayStore,
    input: &str,
    output: &str,
) -> Result<Endpoints, RelayError> {
    Ok(Endpoints {
        input: resolve(store, input).await?,
        output: resolve(store, output).await?,
    })
}

/// Validate `input -> output` and stage the edge insert without committing.
///
/// Fails with `SameEndpoint`, `AlreadyConnected`, or `WouldCreateCycle`.
pub async fn stage_connect(
    store: &dyn RelayStore,
    input: &str,
    output: &str,
) -> Result<(Endpoints, Box<dyn PendingChange>), RelayError> {
    let ends = resolve_pair(store, input, output).await?;
    if ends.input.id == ends.output.id {
        return Err(ValidationError::SameEndpoint {
            channel: ends.input.name,
        }
        .into());
    }

    let graph = store.load_graph().await?;
    if graph.has_edge(&ends.input.id, &ends.output.id) {
        return Err(ValidationError::AlreadyConnected {
            input: ends.input.name,
            output: ends.output.name,
        }
        .into());
    }
    if let Some(cycle) = would_create_cycle(&graph, &ends.input.id, &ends.output.id) {
        return Err(ValidationError::WouldCreateCycle {
            loop_path: graph.names(&cycle),
            input: ends.input.name,
            output: ends.output.name,
        }
        .into());
    }

    let pending = store
        .stage_edge(EdgeChange::Insert {
            input: ends.input.id.clone(),
            output: ends.output.id.clone(),
        })
        .await?;
    Ok((ends, pending))
}

/// Validate that `input -> output` exists and stage its removal.
pub async fn stage_disconnect(
    store: &dyn RelayStore,
    input: &str,
    output: &str,
) -> Result<(Endpoints, Box<dyn PendingChange>), RelayError> {
    let ends = resolve_pair(store, input, output).await?;
    let graph = store.load_graph().await?;
    if !graph.has_edge(&ends.input.id, &ends.output.id) {
        return Err(ValidationError::NotConnected {
            input: ends.input.name,
            output: ends.output.name,
        }
        .into());
    }

    let pending = store
        .stage_edge(EdgeChange::Delete {
            input: ends.input.id.clone(),
            output: ends.output.id.clone(),
        })
        .await?;
    Ok((ends, pending))
}

/// Add `input -> output` and commit immediately.
pub async fn connect(
    store: &dyn RelayStore,
    input: &str,
    output: &str,
) -> Result<Endpoints, RelayError> {
    let (ends, pending) = stage_connect(store, input, output).await?;
    pending.commit().await?;
    Ok(ends)
}

/// Remove `input -> output` and commit immediately.
pub async fn disconnect(
    store: &dyn RelayStore,
    input: &str,
    output: &str,
) -> Result<Endpoints, RelayError> {
    let (ends, pending) = stage_disconnect(store, input, output).await?;
    pending.commit().await?;
    Ok(ends)
}

/// Delete a channel along with every edge touching it.
pub async fn remove_channel(store: &dyn RelayStore, raw: &str) -> Result<Channel, RelayError> {
    let channel = resolve(store, raw).await?;
    store.delete_channel(&channel.id).await?;
    debug!(name = %channel.name, "channel removed");
    Ok(channel)
}

/// Load a channel with its inputs and outputs.
pub async fn channel_detail(store: &dyn RelayStore, raw: &str) -> Result<ChannelDetail, RelayError> {
    let channel = resolve(store, raw).await?;
    let graph = store.load_graph().await?;
    Ok(detail_from_graph(&graph, channel))
}

/// Every channel with its neighbours, in creation order.
pub async fn all_details(store: &dyn RelayStore) -> Result<Vec<ChannelDetail>, RelayError> {
    let graph = store.load_graph().await?;
    Ok(graph
        .channels()
        .map(|channel| detail_from_graph(&graph, channel.clone()))
        .collect())
}

fn detail_from_graph(graph: &ChannelGraph, channel: Channel) -> ChannelDetail {
    let inputs = graph.inputs(&channel.id).into_iter().cloned().collect();
    let outputs = graph
        .outputs(&channel.id)
        .iter()
        .filter_map(|id| graph.channel(id))
        .cloned()
        .collect();
    ChannelDetail {
        channel,
        inputs,
        outputs,
    }
}
