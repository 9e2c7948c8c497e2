//! Core types for the provenance kernel.

pub mod ids;
pub mod edge;
pub mod record;
pub mod metadata;
pub mod collection;
pub mod graph;

pub use ids::{ArtifactId, ActionId};
pub use edge::{EdgeLabel, InputEdge};
pub use record::{ActionRecord, ActionKind, ArtifactRef, ParamValue, SchemaError};
pub use metadata::{ArtifactKind, ArtifactMetadata};
pub use collection::{CollectionKey, CollectionElement, CollectionGroup};
pub use graph::{GraphNode, GraphEdge, GraphElement, GraphModel};
