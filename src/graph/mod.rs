//! In-memory snapshot of the relay graph.
//!
//! Channels are vertices and connections are directed edges `input -> output`.
//! A snapshot is loaded from the store per operation and never mutated; the
//! store remains the source of truth.

use std::collections::HashMap;

use crate::store::{Channel, ChannelId};

pub mod cycle;

pub use cycle::{find_path, would_create_cycle};

/// Directed relay graph. Edge order follows insertion order in the store.
#[derive(Debug, Clone, Default)]
pub struct ChannelGraph {
    order: Vec<ChannelId>,
    channels: HashMap<ChannelId, Channel>,
    outputs: HashMap<ChannelId, Vec<ChannelId>>,
}

impl ChannelGraph {
    /// Build a graph from channels and `(input, output)` edges.
    ///
    /// Edges referencing unknown channels are dropped.
    pub fn new(
        channels: impl IntoIterator<Item = Channel>,
        edges: impl IntoIterator<Item = (ChannelId, ChannelId)>,
    ) -> Self {
        let mut graph = Self::default();
        for channel in channels {
            graph.order.push(channel.id.clone());
            graph.channels.insert(channel.id.clone(), channel);
        }
        for (input, output) in edges {
            if graph.channels.contains_key(&input) && graph.channels.contains_key(&output) {
                graph.outputs.entry(input).or_default().push(output);
            }
        }
        graph
    }

    /// Look a channel up by id.
    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.get(id)
    }

    /// All channels in creation order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.order.iter().filter_map(|id| self.channels.get(id))
    }

    /// Channels `id` relays to, in edge insertion order.
    pub fn outputs(&self, id: &ChannelId) -> &[ChannelId] {
        self.outputs.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Channels relaying into `id`, in channel creation order.
    pub fn inputs(&self, id: &ChannelId) -> Vec<&Channel> {
        self.channels()
            .filter(|c| self.outputs(&c.id).contains(id))
            .collect()
    }

    /// Whether `input -> output` exists.
    pub fn has_edge(&self, input: &ChannelId, output: &ChannelId) -> bool {
        self.outputs(input).contains(output)
    }

    /// Every edge as `(input, output)` channel pairs.
    pub fn edges(&self) -> Vec<(&Channel, &Channel)> {
        let mut edges = Vec::new();
        for input in self.channels() {
            for output in self.outputs(&input.id) {
                if let Some(output) = self.channels.get(output) {
                    edges.push((input, output));
                }
            }
        }
        edges
    }

    /// Number of edge rows, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.outputs.values().map(Vec::len).sum()
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph has no channels.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Find any directed cycle, returned as channel ids starting and ending
    /// at the same vertex. `None` means the graph is acyclic.
    ///
    /// Channels are tried in creation order and edges in insertion order, so
    /// the same graph always reports the same loop.
    pub fn find_any_cycle(&self) -> Option<Vec<ChannelId>> {
        for input in &self.order {
            for output in self.outputs(input) {
                if let Some(mut path) = find_path(self, output, input) {
                    path.insert(0, input.clone());
                    return Some(path);
                }
            }
        }
        None
    }

    /// Resolve ids to channel names, skipping unknown ids.
    pub fn names(&self, ids: &[ChannelId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.channels.get(id))
            .map(|c| c.name.clone())
            .collect()
    }
}
