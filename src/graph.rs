//! Built provenance graph.
//!
//! A [`ProvenanceGraph`] keeps everything a viewer needs after a build: the
//! emitted model, the maps it was computed from, the collection grouping,
//! per-artifact depths, the record of every visited action and each
//! artifact's metadata, so node details can be shown without touching the
//! resolver again.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::builder::{BuildStats, ProvenanceMaps, Traversal};
use crate::depth::DepthCalculator;
use crate::emitter::emit;
use crate::grouping::{group, Grouping};
use crate::types::{ActionId, ActionRecord, ArtifactId, ArtifactKind, ArtifactMetadata, CollectionGroup, GraphModel};

/// Details for one node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDetails<'a> {
    /// An action node: its full record.
    Action(&'a ActionRecord),
    /// An artifact node and the record of the action that produced it.
    Artifact {
        /// Artifact id.
        id: ArtifactId,
        /// Producing action's record, `None` when provenance is unknown.
        producer: Option<&'a ActionRecord>,
        /// Decoded `metadata.yaml`, `None` when the archive has none.
        metadata: Option<&'a ArtifactMetadata>,
    },
    /// A collection node.
    Collection(&'a CollectionGroup),
}

/// A fully built and laid-out provenance graph.
#[derive(Debug, Clone)]
pub struct ProvenanceGraph {
    root: ArtifactId,
    maps: ProvenanceMaps,
    grouping: Grouping,
    depths: BTreeMap<ArtifactId, usize>,
    records: BTreeMap<ActionId, Arc<ActionRecord>>,
    metadata: BTreeMap<ArtifactId, ArtifactMetadata>,
    model: GraphModel,
    stats: BuildStats,
}

impl ProvenanceGraph {
    /// Group, lay out and emit a finished traversal.
    pub fn assemble(traversal: Traversal) -> Self {
        let Traversal {
            root,
            maps,
            records,
            metadata,
            stats,
        } = traversal;

        let grouping = group(&maps);
        let mut calculator = DepthCalculator::new(&maps);
        let model = emit(&maps, &grouping, &mut calculator, root);
        let depths = calculator.all();

        tracing::info!(
            root = %root,
            height = model.height,
            artifacts = maps.artifact_to_action.len(),
            actions = records.len(),
            collections = grouping.collapsed().count(),
            edges = model.edges().count(),
            "Provenance graph built"
        );

        Self {
            root,
            maps,
            grouping,
            depths,
            records,
            metadata,
            model,
            stats,
        }
    }

    /// Root artifact.
    pub fn root(&self) -> ArtifactId {
        self.root
    }

    /// Whether the root is a data artifact or a visualization, `None` when
    /// the root has no metadata.
    pub fn root_kind(&self) -> Option<ArtifactKind> {
        self.artifact_metadata(&self.root).map(ArtifactMetadata::kind)
    }

    /// Depth of the root artifact.
    pub fn height(&self) -> usize {
        self.model.height
    }

    /// The emitted model.
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// The build maps.
    pub fn maps(&self) -> &ProvenanceMaps {
        &self.maps
    }

    /// The collection grouping.
    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Traversal counters.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Depth of an artifact, `None` if it is not part of the graph.
    pub fn depth(&self, artifact: &ArtifactId) -> Option<usize> {
        self.depths.get(artifact).copied()
    }

    /// Record of a visited action.
    pub fn action_record(&self, action: &ActionId) -> Option<&ActionRecord> {
        self.records.get(action).map(|record| &**record)
    }

    /// Metadata of an artifact.
    pub fn artifact_metadata(&self, artifact: &ArtifactId) -> Option<&ArtifactMetadata> {
        self.metadata.get(artifact)
    }

    /// Details for the node with the given rendered id.
    pub fn details(&self, node_id: &str) -> Option<NodeDetails<'_>> {
        if let Ok(action) = ActionId::parse(node_id) {
            if let Some(record) = self.action_record(&action) {
                return Some(NodeDetails::Action(record));
            }
        }

        if let Ok(artifact) = ArtifactId::parse(node_id) {
            if let Some(producer) = self.maps.artifact_to_action.get(&artifact) {
                return Some(NodeDetails::Artifact {
                    id: artifact,
                    producer: producer.as_ref().and_then(|a| self.action_record(a)),
                    metadata: self.artifact_metadata(&artifact),
                });
            }
        }

        self.grouping
            .group_by_id(node_id)
            .filter(|g| g.is_collapsed())
            .map(NodeDetails::Collection)
    }

    /// Deterministic fingerprint of the emitted model.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        self.model.fingerprint()
    }
}
