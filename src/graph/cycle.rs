//! Reachability and loop detection over a [`ChannelGraph`].

use std::collections::HashSet;

use super::ChannelGraph;
use crate::store::ChannelId;

/// Find a directed path `from -> ... -> to`.
///
/// Depth-first search with a global visited set, exploring outputs in edge
/// insertion order. The returned path includes both endpoints; `from == to`
/// yields `[from]`.
pub fn find_path(graph: &ChannelGraph, from: &ChannelId, to: &ChannelId) -> Option<Vec<ChannelId>> {
    if from == to {
        return Some(vec![from.clone()]);
    }

    let mut visited: HashSet<&ChannelId> = HashSet::new();
    visited.insert(from);
    // Each frame is a vertex plus the index of the next output to try.
    let mut stack: Vec<(&ChannelId, usize)> = vec![(from, 0)];

    while let Some(top) = stack.last_mut() {
        let (node, next) = (top.0, top.1);
        top.1 = next + 1;

        match graph.outputs(node).get(next) {
            Some(child) if child == to => {
                let mut path: Vec<ChannelId> = stack.iter().map(|(id, _)| (*id).clone()).collect();
                path.push(child.clone());
                return Some(path);
            }
            Some(child) => {
                if visited.insert(child) {
                    stack.push((child, 0));
                }
            }
            None => {
                stack.pop();
            }
        }
    }
    None
}

/// Check whether adding `source -> dest` would close a loop.
///
/// Returns the loop as ids `[source, dest, ..., source]` when it would.
pub fn would_create_cycle(
    graph: &ChannelGraph,
    source: &ChannelId,
    dest: &ChannelId,
) -> Option<Vec<ChannelId>> {
    let path = find_path(graph, dest, source)?;
    let mut cycle = Vec::with_capacity(path.len() + 1);
    cycle.push(source.clone());
    cycle.extend(path);
    Some(cycle)
}
