//! Resolver over an extracted archive directory.
//!
//! ## Layout
//!
//! ```text
//! <root-uuid>/
//!   VERSION
//!   metadata.yaml
//!   provenance/
//!     metadata.yaml                       # metadata of the root artifact
//!     action/action.yaml                  # record of the root artifact
//!     artifacts/<uuid>/metadata.yaml      # metadata of every ancestor
//!     artifacts/<uuid>/action/action.yaml # record of every ancestor
//! ```
//!
//! A missing `action.yaml` means the ancestor's provenance was not captured
//! and resolves to `NotFound`. A missing `metadata.yaml` resolves the same way.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use async_trait::async_trait;

use crate::types::{ArtifactId, ArtifactMetadata, ActionRecord};
use super::{ActionResolver, ResolveError};

/// Error opening an archive directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory does not look like an extracted archive.
    #[error("Not a valid archive directory: {0}")]
    InvalidLayout(String),
    /// I/O failure while inspecting the directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolver reading `action.yaml` files from an extracted archive.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root_dir: PathBuf,
    root: ArtifactId,
}

impl DirectoryResolver {
    /// Create a resolver without validating the layout.
    pub fn new(root_dir: impl Into<PathBuf>, root: ArtifactId) -> Self {
        Self {
            root_dir: root_dir.into(),
            root,
        }
    }

    /// Open an extracted archive directory.
    ///
    /// The directory must be named with the root artifact's UUID and contain
    /// a `VERSION` file.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let dir = dir.as_ref();

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DirectoryError::InvalidLayout(format!("{} has no name", dir.display())))?;
        let root = ArtifactId::parse(name).map_err(|_| {
            DirectoryError::InvalidLayout(format!("directory name '{}' is not a UUID", name))
        })?;

        match tokio::fs::metadata(dir.join("VERSION")).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(DirectoryError::InvalidLayout("VERSION is not a file".to_string()));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DirectoryError::InvalidLayout(format!(
                    "{} has no VERSION file",
                    dir.display()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(root = %root, dir = %dir.display(), "Opened archive directory");
        Ok(Self::new(dir, root))
    }

    /// The root artifact of the archive.
    pub fn root(&self) -> ArtifactId {
        self.root
    }

    /// Provenance directory holding the files that describe `id`.
    fn provenance_dir(&self, id: &ArtifactId) -> PathBuf {
        let provenance = self.root_dir.join("provenance");
        if *id == self.root {
            provenance
        } else {
            provenance.join("artifacts").join(id.to_string())
        }
    }

    /// Path of the `action.yaml` describing `id`.
    pub fn action_path(&self, id: &ArtifactId) -> PathBuf {
        self.provenance_dir(id).join("action").join("action.yaml")
    }

    /// Path of the `metadata.yaml` describing `id`.
    pub fn metadata_path(&self, id: &ArtifactId) -> PathBuf {
        self.provenance_dir(id).join("metadata.yaml")
    }

    /// Metadata stored at the top of the archive, next to `VERSION`.
    pub async fn archive_metadata(&self) -> Result<ArtifactMetadata, ResolveError> {
        let text = read(&self.root_dir.join("metadata.yaml"), &self.root).await?;
        Ok(ArtifactMetadata::from_yaml_str(&text)?)
    }
}

async fn read(path: &Path, id: &ArtifactId) -> Result<String, ResolveError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ResolveError::NotFound(*id)),
        Err(e) => Err(ResolveError::Io(format!("{}: {}", path.display(), e))),
    }
}

#[async_trait]
impl ActionResolver for DirectoryResolver {
    async fn resolve(&self, id: &ArtifactId) -> Result<ActionRecord, ResolveError> {
        let text = read(&self.action_path(id), id).await?;
        Ok(ActionRecord::from_yaml_str(&text)?)
    }

    async fn resolve_metadata(&self, id: &ArtifactId) -> Result<ArtifactMetadata, ResolveError> {
        let text = read(&self.metadata_path(id), id).await?;
        Ok(ArtifactMetadata::from_yaml_str(&text)?)
    }
}
