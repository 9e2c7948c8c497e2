//! Row/column layout.
//!
//! Each positioned node goes to the row given by its depth. Within a row,
//! nodes are stably sorted by parent action (nodes without a parent first)
//! and numbered left to right, so siblings produced by one action sit next
//! to each other.

use std::collections::BTreeMap;

use crate::types::GraphNode;

/// Assign `(row, col)` to every positioned node.
///
/// `row_of` gives the row of a node. Action nodes are left untouched. Node
/// order in `nodes` is preserved; ties within a row keep that order.
pub fn assign_layout<F>(nodes: &mut [GraphNode], mut row_of: F)
where
    F: FnMut(&GraphNode) -> usize,
{
    let mut rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        if node.is_action() {
            continue;
        }
        rows.entry(row_of(node)).or_default().push(index);
    }

    for (row, mut members) in rows {
        members.sort_by_key(|&index| nodes[index].parent_action().map(|p| p.to_string()));
        for (col, index) in members.into_iter().enumerate() {
            nodes[index].set_position(row, col);
        }
    }
}
