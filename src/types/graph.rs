//! Emitted graph model.
//!
//! The model is a flat, ordered list of node and edge records. Each element
//! serializes as `{"data": {...}}`: nodes carry `{id, parent?, row?, col?}`,
//! edges carry `{id, param, source, target}`.

use serde::{Serialize, Serializer};

use super::collection::CollectionElement;
use super::ids::{ActionId, ArtifactId};
use crate::canonical::canonical_hash_hex;

/// Node of the emitted graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    /// An execution. Acts as the compound parent of the artifacts it produced.
    Action {
        /// Action id.
        id: ActionId,
    },
    /// A single artifact.
    Artifact {
        /// Artifact id.
        id: ArtifactId,
        /// Producing action, `None` when provenance is unknown.
        parent_action: Option<ActionId>,
        /// Layout row (depth).
        row: usize,
        /// Layout column within the row.
        col: usize,
    },
    /// A collapsed collection of two or more artifacts.
    Collection {
        /// Group id (see [`CollectionKey`](super::CollectionKey)).
        id: String,
        /// Producing action of the representative element.
        parent_action: Option<ActionId>,
        /// Layout row (depth of the representative element).
        row: usize,
        /// Layout column within the row.
        col: usize,
        /// Members of the collection in recorded order.
        elements: Vec<CollectionElement>,
    },
}

impl GraphNode {
    /// Rendered node id.
    pub fn id(&self) -> String {
        match self {
            Self::Action { id } => id.to_string(),
            Self::Artifact { id, .. } => id.to_string(),
            Self::Collection { id, .. } => id.clone(),
        }
    }

    /// Compound parent of this node.
    pub fn parent_action(&self) -> Option<ActionId> {
        match self {
            Self::Action { .. } => None,
            Self::Artifact { parent_action, .. } | Self::Collection { parent_action, .. } => {
                *parent_action
            }
        }
    }

    /// `(row, col)` of positioned nodes; action nodes have no position.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Action { .. } => None,
            Self::Artifact { row, col, .. } | Self::Collection { row, col, .. } => Some((*row, *col)),
        }
    }

    /// Set the layout position. No-op for action nodes.
    pub fn set_position(&mut self, new_row: usize, new_col: usize) {
        match self {
            Self::Action { .. } => {}
            Self::Artifact { row, col, .. } | Self::Collection { row, col, .. } => {
                *row = new_row;
                *col = new_col;
            }
        }
    }

    /// Whether this is an action node.
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action { .. })
    }

    /// Whether this is a collection node.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }
}

/// Edge of the emitted graph, from an artifact or collection into the action
/// that consumed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    /// Edge id, `<param>_<source>to<target>`.
    pub id: String,
    /// Input label.
    pub param: String,
    /// Source node id (artifact or collection).
    pub source: String,
    /// Consuming action.
    pub target: ActionId,
}

impl GraphEdge {
    /// Create an edge, deriving its id.
    pub fn new(param: impl Into<String>, source: impl Into<String>, target: ActionId) -> Self {
        let param = param.into();
        let source = source.into();
        Self {
            id: format!("{}_{}to{}", param, source, target),
            param,
            source,
            target,
        }
    }
}

/// One record of the flat element list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphElement {
    /// A node record.
    Node(GraphNode),
    /// An edge record.
    Edge(GraphEdge),
}

#[derive(Serialize)]
struct NodeData {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    col: Option<usize>,
}

#[derive(Serialize)]
struct EdgeData<'a> {
    id: &'a str,
    param: &'a str,
    source: &'a str,
    target: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ElementData<'a> {
    Node(NodeData),
    Edge(EdgeData<'a>),
}

#[derive(Serialize)]
struct ElementRecord<'a> {
    data: ElementData<'a>,
}

impl Serialize for GraphElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match self {
            Self::Node(node) => {
                let position = node.position();
                ElementData::Node(NodeData {
                    id: node.id(),
                    parent: node.parent_action().map(|p| p.to_string()),
                    row: position.map(|(row, _)| row),
                    col: position.map(|(_, col)| col),
                })
            }
            Self::Edge(edge) => ElementData::Edge(EdgeData {
                id: &edge.id,
                param: &edge.param,
                source: &edge.source,
                target: edge.target.to_string(),
            }),
        };
        ElementRecord { data }.serialize(serializer)
    }
}

/// The emitted graph: overall height plus ordered elements.
///
/// Element order: action nodes, then artifact and collection nodes in
/// row-major `(row, col)` order, then edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphModel {
    /// Depth of the root artifact.
    pub height: usize,
    /// Node records followed by edge records.
    pub elements: Vec<GraphElement>,
}

impl GraphModel {
    /// All node records in order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.elements.iter().filter_map(|e| match e {
            GraphElement::Node(node) => Some(node),
            GraphElement::Edge(_) => None,
        })
    }

    /// All edge records in order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.elements.iter().filter_map(|e| match e {
            GraphElement::Edge(edge) => Some(edge),
            GraphElement::Node(_) => None,
        })
    }

    /// Find a node by its rendered id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes().find(|n| n.id() == id)
    }

    /// Largest row of any positioned node.
    pub fn max_row(&self) -> Option<usize> {
        self.nodes().filter_map(|n| n.position()).map(|(row, _)| row).max()
    }

    /// Deterministic fingerprint (xxh64 of canonical JSON).
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(self)
    }
}
