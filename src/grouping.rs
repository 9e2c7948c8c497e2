//! Collection grouping.
//!
//! Splits every recorded input edge into either a plain edge or an element
//! of a collection group. Elements are grouped by
//! `(producing action, consuming action, collection input name)`, so one
//! keyed collection input made of artifacts from one upstream action
//! collapses into one node.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::builder::ProvenanceMaps;
use crate::types::{
    ActionId, ArtifactId, CollectionElement, CollectionGroup, CollectionKey, EdgeLabel,
};

/// An input edge that is not part of any collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainEdge {
    /// Input label.
    pub label: EdgeLabel,
    /// Consumed artifact.
    pub source: ArtifactId,
    /// Consuming action.
    pub target: ActionId,
}

/// Result of grouping the input edges of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Non-collection edges, by consuming action then record order.
    pub plain_edges: Vec<PlainEdge>,
    /// Collection groups keyed by identity.
    pub groups: BTreeMap<CollectionKey, CollectionGroup>,
    /// Every artifact reached through a collection element edge.
    pub element_ids: BTreeSet<ArtifactId>,
}

impl Grouping {
    /// Groups with two or more elements, rendered as one node each.
    pub fn collapsed(&self) -> impl Iterator<Item = &CollectionGroup> {
        self.groups.values().filter(|g| g.is_collapsed())
    }

    /// Single-element groups, rendered as an ordinary artifact.
    pub fn degenerate(&self) -> impl Iterator<Item = &CollectionGroup> {
        self.groups.values().filter(|g| !g.is_collapsed())
    }

    /// Find a group by its node id.
    pub fn group_by_id(&self, id: &str) -> Option<&CollectionGroup> {
        self.groups.values().find(|g| g.id() == id)
    }

    /// Element artifacts with no node of their own.
    ///
    /// An element stays visible when a plain edge or a single-element group
    /// also references it.
    pub fn hidden_artifacts(&self) -> BTreeSet<ArtifactId> {
        let mut visible: BTreeSet<ArtifactId> = self.plain_edges.iter().map(|e| e.source).collect();
        for group in self.degenerate() {
            visible.extend(group.elements.iter().map(|e| e.artifact));
        }

        self.element_ids.difference(&visible).copied().collect()
    }
}

/// Partition the input edges of `maps` into plain edges and collection groups.
pub fn group(maps: &ProvenanceMaps) -> Grouping {
    let mut grouping = Grouping::default();

    for (action, edges) in &maps.action_to_inputs {
        for edge in edges {
            match &edge.label {
                EdgeLabel::Param(_) => grouping.plain_edges.push(PlainEdge {
                    label: edge.label.clone(),
                    source: edge.source,
                    target: *action,
                }),
                EdgeLabel::Element { key, param } => {
                    let group_key = CollectionKey::new(maps.action_of(&edge.source), *action, param.clone());
                    grouping
                        .groups
                        .entry(group_key.clone())
                        .or_insert_with(|| CollectionGroup::new(group_key))
                        .elements
                        .push(CollectionElement {
                            key: key.clone(),
                            artifact: edge.source,
                        });
                    grouping.element_ids.insert(edge.source);
                }
            }
        }
    }

    tracing::debug!(
        plain_edges = grouping.plain_edges.len(),
        groups = grouping.groups.len(),
        elements = grouping.element_ids.len(),
        "Grouped input edges"
    );

    grouping
}
