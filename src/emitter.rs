//! Graph emission.
//!
//! Turns the build maps and their grouping into the flat, ordered
//! [`GraphModel`]:
//!
//! 1. One action node per distinct producing action, ascending
//! 2. Artifact nodes (artifacts not absorbed into a multi-element group) and
//!    collection nodes, laid out and listed in row-major `(row, col)` order
//! 3. Edges: plain edges by consuming action then record order, then one
//!    edge per collection group
//!
//! A single-element group renders as its artifact plus a plain edge whose
//! param is the full `key:param` label.

use crate::builder::ProvenanceMaps;
use crate::depth::DepthCalculator;
use crate::grouping::Grouping;
use crate::layout::assign_layout;
use crate::types::{ArtifactId, GraphEdge, GraphElement, GraphModel, GraphNode, EdgeLabel};

/// Emit the graph model rooted at `root`.
pub fn emit(
    maps: &ProvenanceMaps,
    grouping: &Grouping,
    depths: &mut DepthCalculator<'_>,
    root: ArtifactId,
) -> GraphModel {
    let hidden = grouping.hidden_artifacts();

    let action_nodes: Vec<GraphNode> = maps
        .actions()
        .into_iter()
        .map(|id| GraphNode::Action { id })
        .collect();

    let mut positioned: Vec<GraphNode> = Vec::new();
    for (artifact, action) in &maps.artifact_to_action {
        if hidden.contains(artifact) {
            continue;
        }
        positioned.push(GraphNode::Artifact {
            id: *artifact,
            parent_action: *action,
            row: 0,
            col: 0,
        });
    }
    for group in grouping.collapsed() {
        let Some(representative) = group.representative() else {
            continue;
        };
        positioned.push(GraphNode::Collection {
            id: group.id(),
            parent_action: maps.action_of(&representative.artifact),
            row: 0,
            col: 0,
            elements: group.elements.clone(),
        });
    }

    assign_layout(&mut positioned, |node| match node {
        GraphNode::Artifact { id, .. } => depths.depth(id),
        GraphNode::Collection { elements, .. } => elements
            .first()
            .map(|e| depths.depth(&e.artifact))
            .unwrap_or(0),
        GraphNode::Action { .. } => 0,
    });
    positioned.sort_by_key(|node| node.position());

    let mut edges: Vec<GraphEdge> = grouping
        .plain_edges
        .iter()
        .map(|e| GraphEdge::new(e.label.to_string(), e.source.to_string(), e.target))
        .collect();
    for group in grouping.groups.values() {
        if group.is_collapsed() {
            edges.push(GraphEdge::new(group.key.param.clone(), group.id(), group.key.target_action));
        } else {
            for element in &group.elements {
                let label = EdgeLabel::element(element.key.clone(), group.key.param.clone());
                edges.push(GraphEdge::new(label.to_string(), element.artifact.to_string(), group.key.target_action));
            }
        }
    }

    let height = depths.depth(&root);

    tracing::debug!(
        height,
        actions = action_nodes.len(),
        positioned = positioned.len(),
        hidden = hidden.len(),
        edges = edges.len(),
        "Emitted graph model"
    );

    let mut elements: Vec<GraphElement> = Vec::with_capacity(action_nodes.len() + positioned.len() + edges.len());
    elements.extend(action_nodes.into_iter().map(GraphElement::Node));
    elements.extend(positioned.into_iter().map(GraphElement::Node));
    elements.extend(edges.into_iter().map(GraphElement::Edge));

    GraphModel { height, elements }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group;
    use crate::types::{ActionId, InputEdge};
    use uuid::Uuid;

    fn artifact(n: u128) -> ArtifactId {
        ArtifactId::new(Uuid::from_u128(n))
    }

    fn action(n: u128) -> ActionId {
        ActionId::new(Uuid::from_u128(0xA000 + n))
    }

    fn emit_maps(maps: &ProvenanceMaps, root: ArtifactId) -> GraphModel {
        let grouping = group(maps);
        let mut depths = DepthCalculator::new(maps);
        emit(maps, &grouping, &mut depths, root)
    }

    #[test]
    fn test_element_order() {
        // R <- A1 <- X <- A0 (import)
        let mut maps = ProvenanceMaps::default();
        maps.artifact_to_action.insert(artifact(1), Some(action(1)));
        maps.artifact_to_action.insert(artifact(2), Some(action(0)));
        maps.action_to_inputs
            .insert(action(1), vec![InputEdge::new(EdgeLabel::param("x"), artifact(2))]);

        let model = emit_maps(&maps, artifact(1));

        assert_eq!(model.height, 1);
        let ids: Vec<String> = model.nodes().map(|n| n.id()).collect();
        assert_eq!(
            ids,
            vec![
                action(0).to_string(),
                action(1).to_string(),
                artifact(2).to_string(),
                artifact(1).to_string(),
            ]
        );
        assert!(matches!(model.elements.last(), Some(GraphElement::Edge(_))));
        assert_eq!(model.max_row(), Some(1));
    }

    #[test]
    fn test_collapsed_group_replaces_elements() {
        let mut maps = ProvenanceMaps::default();
        maps.artifact_to_action.insert(artifact(1), Some(action(1)));
        for n in 2..=4 {
            maps.artifact_to_action.insert(artifact(n), Some(action(0)));
        }
        maps.action_to_inputs.insert(
            action(1),
            (2..=4)
                .map(|n| InputEdge::new(EdgeLabel::element(format!("k{n}"), "tables"), artifact(n)))
                .collect(),
        );

        let model = emit_maps(&maps, artifact(1));

        let collections: Vec<&GraphNode> = model.nodes().filter(|n| n.is_collection()).collect();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].parent_action(), Some(action(0)));
        assert!(model.node(&artifact(2).to_string()).is_none());

        let edges: Vec<&GraphEdge> = model.edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, collections[0].id());
        assert_eq!(edges[0].param, "tables");
        assert_eq!(edges[0].target, action(1));
    }

    #[test]
    fn test_single_element_group_degrades() {
        let mut maps = ProvenanceMaps::default();
        maps.artifact_to_action.insert(artifact(1), Some(action(1)));
        maps.artifact_to_action.insert(artifact(2), Some(action(0)));
        maps.action_to_inputs.insert(
            action(1),
            vec![InputEdge::new(EdgeLabel::element("only", "tables"), artifact(2))],
        );

        let model = emit_maps(&maps, artifact(1));

        assert!(model.nodes().all(|n| !n.is_collection()));
        assert!(model.node(&artifact(2).to_string()).is_some());
        let edges: Vec<&GraphEdge> = model.edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].param, "only:tables");
        assert_eq!(edges[0].source, artifact(2).to_string());
    }
}
