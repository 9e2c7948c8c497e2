//! Provenance graph builder.
//!
//! Walks depth-first from a root artifact, resolving each artifact's action
//! record and recording two maps: artifact → producing action, and
//! action → input edges.
//!
//! ## Algorithm
//!
//! 1. Claim the artifact (each artifact is resolved at most once per build)
//! 2. Resolve its record and, alongside, its metadata:
//!    - `NotFound` → `artifact_to_action[a] = None`, branch ends
//!    - metadata `NotFound` → the artifact simply has no metadata
//!    - schema or I/O failure of either → the whole build fails
//! 3. `artifact_to_action[a] = execution_id`
//! 4. Mark the action visited; if it already was, stop (shared ancestors in
//!    diamond-shaped provenance are expanded once)
//! 5. Imports stop here; otherwise record the action's input edges and visit
//!    every distinct source artifact, up to `max_fanout` concurrently
//!
//! ## Concurrency
//!
//! All build state lives behind one mutex that is never held across an
//! `.await`. Claiming an artifact and marking an action visited are atomic
//! check-and-mark operations, so concurrent branches never duplicate work.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::BuilderConfig;
use crate::graph::ProvenanceGraph;
use crate::resolver::{ActionResolver, ResolveError};
use crate::types::{ActionId, ActionRecord, ArtifactId, ArtifactMetadata, InputEdge, SchemaError};

/// Artifact → producing action; `None` means no known provenance.
pub type ArtifactToAction = BTreeMap<ArtifactId, Option<ActionId>>;

/// Action → input edges in record order.
pub type ActionToInputs = BTreeMap<ActionId, Vec<InputEdge>>;

/// Error type for builder operations.
///
/// `NotFound` from the resolver is never surfaced here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A resolved record did not match the schema.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// The resolver failed for a reason other than `NotFound`.
    #[error("Resolver error: {0}")]
    Resolver(String),
    /// The caller's deadline expired.
    #[error("Build timed out after {0}s")]
    Timeout(u64),
}

/// The two maps produced by a traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceMaps {
    /// Artifact → producing action.
    pub artifact_to_action: ArtifactToAction,
    /// Action → input edges. Only actions with at least one edge appear.
    pub action_to_inputs: ActionToInputs,
}

impl ProvenanceMaps {
    /// Producing action of an artifact, if known.
    pub fn action_of(&self, artifact: &ArtifactId) -> Option<ActionId> {
        self.artifact_to_action.get(artifact).copied().flatten()
    }

    /// Input edges recorded for an action.
    pub fn inputs_of(&self, action: &ActionId) -> &[InputEdge] {
        self.action_to_inputs
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct non-null actions, ascending.
    pub fn actions(&self) -> Vec<ActionId> {
        let mut actions: Vec<ActionId> = self.artifact_to_action.values().flatten().copied().collect();
        actions.sort();
        actions.dedup();
        actions
    }
}

/// Counters describing one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Resolver calls made.
    pub resolver_calls: usize,
    /// Artifacts whose record was not found.
    pub not_found: usize,
    /// Distinct actions reached.
    pub actions_visited: usize,
    /// Artifacts whose action had already been visited.
    pub memo_hits: usize,
    /// Artifacts with a `metadata.yaml`.
    pub metadata_found: usize,
}

/// Complete output of a traversal.
#[derive(Debug, Clone)]
pub struct Traversal {
    /// Root artifact.
    pub root: ArtifactId,
    /// Artifact and input maps.
    pub maps: ProvenanceMaps,
    /// One record per visited action.
    pub records: BTreeMap<ActionId, Arc<ActionRecord>>,
    /// Metadata of every artifact that has one.
    pub metadata: BTreeMap<ArtifactId, ArtifactMetadata>,
    /// Traversal counters.
    pub stats: BuildStats,
}

#[derive(Default)]
struct BuildState {
    maps: ProvenanceMaps,
    records: BTreeMap<ActionId, Arc<ActionRecord>>,
    metadata: BTreeMap<ArtifactId, ArtifactMetadata>,
    claimed: HashSet<ArtifactId>,
    visited: HashSet<ActionId>,
    stats: BuildStats,
}

impl BuildState {
    fn claim_artifact(&mut self, artifact: ArtifactId) -> bool {
        self.claimed.insert(artifact)
    }

    fn add_metadata(&mut self, artifact: ArtifactId, metadata: ArtifactMetadata) {
        self.stats.metadata_found += 1;
        self.metadata.insert(artifact, metadata);
    }

    fn mark_not_found(&mut self, artifact: ArtifactId) {
        self.stats.not_found += 1;
        self.maps.artifact_to_action.insert(artifact, None);
    }

    /// Record the producer of `artifact`; returns the record when its
    /// action is newly visited and has inputs to expand.
    fn accept(&mut self, artifact: ArtifactId, record: ActionRecord) -> Option<Arc<ActionRecord>> {
        let action = record.execution_id;
        self.maps.artifact_to_action.insert(artifact, Some(action));

        if !self.visited.insert(action) {
            self.stats.memo_hits += 1;
            tracing::trace!(artifact = %artifact, action = %action, "Action already visited");
            return None;
        }

        self.stats.actions_visited += 1;
        let record = Arc::new(record);
        self.records.insert(action, Arc::clone(&record));

        if record.is_import() {
            None
        } else {
            Some(record)
        }
    }
}

/// Provenance graph builder.
///
/// Each call to [`build`](Self::build) starts from fresh state, so one
/// builder can serve any number of archive loads without leaking state
/// between them.
pub struct ProvenanceBuilder<R: ActionResolver> {
    resolver: Arc<R>,
    config: BuilderConfig,
}

impl<R: ActionResolver> ProvenanceBuilder<R> {
    /// Create a new builder.
    pub fn new(resolver: Arc<R>, config: BuilderConfig) -> Self {
        Self { resolver, config }
    }

    /// Create a builder with the default configuration.
    pub fn with_defaults(resolver: Arc<R>) -> Self {
        Self::new(resolver, BuilderConfig::default())
    }

    /// Build the artifact and input maps rooted at `root`.
    pub async fn build(&self, root: ArtifactId) -> Result<ProvenanceMaps, BuildError> {
        Ok(self.traverse(root).await?.maps)
    }

    /// Build the complete laid-out graph rooted at `root`.
    pub async fn build_graph(&self, root: ArtifactId) -> Result<ProvenanceGraph, BuildError> {
        let traversal = self.traverse(root).await?;
        Ok(ProvenanceGraph::assemble(traversal))
    }

    /// Run the traversal, keeping the record cache and counters.
    pub async fn traverse(&self, root: ArtifactId) -> Result<Traversal, BuildError> {
        let state = Mutex::new(BuildState::default());

        if let Err(e) = self.visit(&state, root).await {
            tracing::warn!(root = %root, error = %e, "Provenance build abandoned");
            return Err(e);
        }

        let state = state.into_inner();
        tracing::info!(
            root = %root,
            artifacts = state.maps.artifact_to_action.len(),
            actions = state.records.len(),
            resolver_calls = state.stats.resolver_calls,
            not_found = state.stats.not_found,
            memo_hits = state.stats.memo_hits,
            "Provenance traversal complete"
        );

        Ok(Traversal {
            root,
            maps: state.maps,
            records: state.records,
            metadata: state.metadata,
            stats: state.stats,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Get a reference to the resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn visit<'a>(
        &'a self,
        state: &'a Mutex<BuildState>,
        artifact: ArtifactId,
    ) -> BoxFuture<'a, Result<(), BuildError>> {
        Box::pin(async move {
            if !state.lock().claim_artifact(artifact) {
                return Ok(());
            }

            let (resolved, metadata) = future::join(
                self.resolver.resolve(&artifact),
                self.resolver.resolve_metadata(&artifact),
            )
            .await;
            state.lock().stats.resolver_calls += 1;

            match metadata {
                Ok(metadata) => state.lock().add_metadata(artifact, metadata),
                Err(ResolveError::NotFound(_)) => {
                    tracing::trace!(artifact = %artifact, "No metadata recorded");
                }
                Err(ResolveError::Schema(e)) => return Err(BuildError::Schema(e)),
                Err(ResolveError::Io(message)) => return Err(BuildError::Resolver(message)),
            }

            let record = match resolved {
                Ok(record) => record,
                Err(ResolveError::NotFound(_)) => {
                    tracing::debug!(artifact = %artifact, "No provenance recorded, treating as terminal");
                    state.lock().mark_not_found(artifact);
                    return Ok(());
                }
                Err(ResolveError::Schema(e)) => return Err(BuildError::Schema(e)),
                Err(ResolveError::Io(message)) => return Err(BuildError::Resolver(message)),
            };

            tracing::debug!(
                artifact = %artifact,
                action = %record.execution_id,
                kind = %record.kind,
                "Resolved action record"
            );

            let expand = { state.lock().accept(artifact, record) };
            let Some(record) = expand else {
                return Ok(());
            };

            let edges = record.input_edges();
            if edges.is_empty() {
                return Ok(());
            }

            let mut seen = HashSet::with_capacity(edges.len());
            let sources: Vec<ArtifactId> = edges
                .iter()
                .map(|edge| edge.source)
                .filter(|source| seen.insert(*source))
                .collect();
            {
                state.lock().maps.action_to_inputs.insert(record.execution_id, edges);
            }

            stream::iter(sources)
                .map(|source| self.visit(state, source))
                .buffer_unordered(self.config.fanout())
                .try_collect::<Vec<()>>()
                .await?;

            Ok(())
        })
    }
}
