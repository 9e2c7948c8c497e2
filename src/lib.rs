//! # provenance-kernel
//!
//! Deterministic provenance DAG reconstruction for archived data artifacts.
//!
//! The kernel answers one question:
//!
//! > Given an artifact, which actions and inputs **produced it**, all the way
//! > back to its imports?
//!
//! ## Core Contract
//!
//! 1. Starting from a root artifact, resolve each artifact's action record and
//!    walk its inputs until imports or unknown provenance
//! 2. Collapse keyed collection inputs from one upstream action into a single
//!    node
//! 3. Lay every artifact out on a `(row, col)` grid where `row` is its depth
//! 4. Emit a flat, ordered list of node and edge records with a stable
//!    fingerprint
//!
//! ## Architecture
//!
//! ```text
//! Root Artifact → ProvenanceBuilder → ProvenanceMaps → group → depth → layout → GraphModel
//!                        ↓
//!              ActionResolver (Directory or Memory)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same root + same records → identical model and fingerprint, whatever
//!   order concurrent resolves complete in
//! - Action nodes are ordered by ActionId
//! - Positioned nodes are ordered by `(row, col)`; columns within a row are
//!   ordered by parent action, ties kept in ArtifactId order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod resolver;
pub mod builder;
pub mod grouping;
pub mod depth;
pub mod layout;
pub mod emitter;
pub mod graph;
pub mod config;
pub mod canonical;

// Re-exports
pub use types::{
    ArtifactId, ActionId, ActionKind, ActionRecord, ArtifactRef, ParamValue, SchemaError,
    ArtifactKind, ArtifactMetadata,
    EdgeLabel, InputEdge, CollectionKey, CollectionElement, CollectionGroup,
    GraphNode, GraphEdge, GraphElement, GraphModel,
};
pub use resolver::{ActionResolver, ResolveError, InMemoryResolver};
#[cfg(feature = "directory")]
pub use resolver::{DirectoryResolver, DirectoryError};
pub use builder::{
    ProvenanceBuilder, ProvenanceMaps, BuildError, BuildStats, Traversal,
    ArtifactToAction, ActionToInputs,
};
pub use grouping::{group, Grouping, PlainEdge};
pub use depth::DepthCalculator;
pub use layout::assign_layout;
pub use emitter::emit;
pub use graph::{ProvenanceGraph, NodeDetails};
pub use config::BuilderConfig;
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};

/// Schema version of the emitted graph model.
/// Increment on breaking changes to the wire format.
pub const GRAPH_MODEL_SCHEMA_VERSION: &str = "1.0.0";
