//! Action record resolvers.
//!
//! A resolver answers "which action produced this artifact?" by returning the
//! artifact's decoded [`ActionRecord`]. `NotFound` is the normal answer for
//! imported or external data and is never treated as a failure by the
//! builder. The same holds for artifact metadata: an archive without a
//! `metadata.yaml` for some artifact still builds.

pub mod memory;

#[cfg(feature = "directory")]
pub mod directory;

use async_trait::async_trait;
use crate::types::{ArtifactId, ArtifactMetadata, ActionRecord, SchemaError};

/// Error type for resolver operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No record exists for the artifact. Terminal, not a failure.
    #[error("No action record for artifact {0}")]
    NotFound(ArtifactId),
    /// A record exists but does not match the schema.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Underlying storage fault.
    #[error("Resolver I/O error: {0}")]
    Io(String),
}

impl ResolveError {
    /// Whether this is the terminal `NotFound` signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Trait for action record lookups.
///
/// Implementations may retry internally; the builder never retries.
#[async_trait]
pub trait ActionResolver: Send + Sync {
    /// Resolve the action record that produced `id`.
    async fn resolve(&self, id: &ArtifactId) -> Result<ActionRecord, ResolveError>;

    /// Resolve the `metadata.yaml` of `id`.
    async fn resolve_metadata(&self, id: &ArtifactId) -> Result<ArtifactMetadata, ResolveError>;
}

pub use memory::InMemoryResolver;

#[cfg(feature = "directory")]
pub use directory::{DirectoryResolver, DirectoryError};
