//! In-memory resolver for testing.

use std::collections::BTreeMap;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{ArtifactId, ArtifactMetadata, ActionId, ActionRecord};
use super::{ActionResolver, ResolveError};

#[derive(Debug, Clone)]
enum Entry {
    Record(ActionRecord),
    Document(String),
    Failure(String),
}

/// In-memory resolver for testing.
///
/// Holds decoded records, raw YAML documents (decoded on every resolve, so
/// schema errors surface at resolve time), or injected I/O faults. Counts
/// record resolves per artifact; metadata lookups are counted apart.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    entries: BTreeMap<ArtifactId, Entry>,
    metadata: BTreeMap<ArtifactId, ArtifactMetadata>,
    calls: Mutex<BTreeMap<ArtifactId, usize>>,
    metadata_calls: Mutex<BTreeMap<ArtifactId, usize>>,
}

impl InMemoryResolver {
    /// Create a new empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the record of an artifact.
    pub fn add_record(&mut self, artifact: ArtifactId, record: ActionRecord) {
        self.entries.insert(artifact, Entry::Record(record));
    }

    /// Register an artifact as produced by an import.
    pub fn add_import(&mut self, artifact: ArtifactId, action: ActionId) {
        self.add_record(artifact, ActionRecord::import(action));
    }

    /// Register a raw YAML document for an artifact.
    pub fn add_document(&mut self, artifact: ArtifactId, yaml: impl Into<String>) {
        self.entries.insert(artifact, Entry::Document(yaml.into()));
    }

    /// Make resolving `artifact` fail with an I/O error.
    pub fn add_failure(&mut self, artifact: ArtifactId, message: impl Into<String>) {
        self.entries.insert(artifact, Entry::Failure(message.into()));
    }

    /// Register the metadata of an artifact.
    pub fn add_metadata(&mut self, metadata: ArtifactMetadata) {
        self.metadata.insert(metadata.uuid, metadata);
    }

    /// Number of resolve calls made for `artifact`.
    pub fn calls_for(&self, artifact: &ArtifactId) -> usize {
        self.calls.lock().get(artifact).copied().unwrap_or(0)
    }

    /// Total number of resolve calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Number of metadata lookups made for `artifact`.
    pub fn metadata_calls_for(&self, artifact: &ArtifactId) -> usize {
        self.metadata_calls.lock().get(artifact).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ActionResolver for InMemoryResolver {
    async fn resolve(&self, id: &ArtifactId) -> Result<ActionRecord, ResolveError> {
        *self.calls.lock().entry(*id).or_default() += 1;

        match self.entries.get(id) {
            None => Err(ResolveError::NotFound(*id)),
            Some(Entry::Record(record)) => Ok(record.clone()),
            Some(Entry::Document(doc)) => Ok(ActionRecord::from_yaml_str(doc)?),
            Some(Entry::Failure(message)) => Err(ResolveError::Io(message.clone())),
        }
    }

    async fn resolve_metadata(&self, id: &ArtifactId) -> Result<ArtifactMetadata, ResolveError> {
        *self.metadata_calls.lock().entry(*id).or_default() += 1;

        self.metadata.get(id).cloned().ok_or(ResolveError::NotFound(*id))
    }
}
