//! Collection groups: keyed multi-element inputs collapsed into one node.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ActionId, ArtifactId};

/// Identity of a collection group.
///
/// Elements are grouped by the action that produced them, the action that
/// consumed them, and the input slot they were consumed through.
/// Ordering is `(target_action, param, source_action)` so groups of one
/// consumer sort together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionKey {
    /// Consuming action.
    pub target_action: ActionId,
    /// Collection input name.
    pub param: String,
    /// Producing action of the elements (`None` for unknown provenance).
    pub source_action: Option<ActionId>,
}

impl CollectionKey {
    /// Create a new key.
    pub fn new(source_action: Option<ActionId>, target_action: ActionId, param: impl Into<String>) -> Self {
        Self {
            target_action,
            param: param.into(),
            source_action,
        }
    }
}

/// Renders the node id used for the group: `source:target:param`.
impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_action {
            Some(source) => write!(f, "{}:{}:{}", source, self.target_action, self.param),
            None => write!(f, "unknown:{}:{}", self.target_action, self.param),
        }
    }
}

/// One element of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionElement {
    /// Element key inside the collection.
    pub key: String,
    /// Artifact stored under the key.
    pub artifact: ArtifactId,
}

/// A collection group with its elements in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionGroup {
    /// Group identity.
    pub key: CollectionKey,
    /// Elements, in the order they were recorded.
    pub elements: Vec<CollectionElement>,
}

impl CollectionGroup {
    /// Create an empty group.
    pub fn new(key: CollectionKey) -> Self {
        Self {
            key,
            elements: Vec::new(),
        }
    }

    /// Node id of this group.
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the group has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether this group is rendered as a single collection node.
    ///
    /// Groups of one degrade to an ordinary artifact node.
    pub fn is_collapsed(&self) -> bool {
        self.elements.len() >= 2
    }

    /// First recorded element; stands in for the group's position.
    pub fn representative(&self) -> Option<&CollectionElement> {
        self.elements.first()
    }
}
