//! Input edge types for the provenance graph.

use serde::{Deserialize, Serialize};
use super::ids::ArtifactId;

/// Separator of the composite `element_key:param` label.
const COLLECTION_SEPARATOR: char = ':';

/// Label of an input edge.
///
/// Either a plain parameter name, or a collection element rendered as
/// `element_key:param`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// Plain parameter or input name.
    Param(String),
    /// Element of a keyed collection input.
    Element {
        /// Element key inside the collection.
        key: String,
        /// Name of the collection input.
        param: String,
    },
}

impl EdgeLabel {
    /// Create a plain parameter label.
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Create a collection element label.
    pub fn element(key: impl Into<String>, param: impl Into<String>) -> Self {
        Self::Element {
            key: key.into(),
            param: param.into(),
        }
    }
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Param(name) => write!(f, "{}", name),
            Self::Element { key, param } => write!(f, "{}{}{}", key, COLLECTION_SEPARATOR, param),
        }
    }
}

/// Edge from a consumed artifact into the action that consumed it.
///
/// The consuming action is the key under which the edge is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEdge {
    /// Label of the input slot.
    pub label: EdgeLabel,
    /// Artifact flowing into the action.
    pub source: ArtifactId,
}

impl InputEdge {
    /// Create a new edge.
    pub fn new(label: EdgeLabel, source: ArtifactId) -> Self {
        Self { label, source }
    }
}
