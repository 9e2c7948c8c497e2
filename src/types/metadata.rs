//! Artifact metadata: what an artifact is, as opposed to how it was made.
//!
//! Each archive stores one `metadata.yaml` per artifact:
//!
//! ```yaml
//! uuid: 0b9d2b46-...
//! type: FeatureTable[Frequency]
//! format: BIOMV210DirFmt
//! ```
//!
//! Visualizations carry `type: Visualization` and a null format.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ArtifactId;
use super::record::SchemaError;

/// Semantic type string marking a visualization.
pub const VISUALIZATION_TYPE: &str = "Visualization";

/// Whether an archive holds data or a rendered visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A data artifact (`.qza`).
    Artifact,
    /// A visualization (`.qzv`).
    Visualization,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact => write!(f, "artifact"),
            Self::Visualization => write!(f, "visualization"),
        }
    }
}

/// Decoded `metadata.yaml` of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Artifact id.
    pub uuid: ArtifactId,
    /// Semantic type, e.g. `FeatureTable[Frequency]`.
    #[serde(rename = "type")]
    pub semantic_type: String,
    /// Directory format, absent for visualizations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Deserialize)]
struct RawMetadata {
    uuid: Option<String>,
    #[serde(rename = "type")]
    semantic_type: Option<String>,
    format: Option<String>,
}

impl ArtifactMetadata {
    /// Create metadata for a data artifact.
    pub fn new(uuid: ArtifactId, semantic_type: impl Into<String>, format: Option<String>) -> Self {
        Self {
            uuid,
            semantic_type: semantic_type.into(),
            format,
        }
    }

    /// Create metadata for a visualization.
    pub fn visualization(uuid: ArtifactId) -> Self {
        Self::new(uuid, VISUALIZATION_TYPE, None)
    }

    /// Kind derived from the semantic type.
    pub fn kind(&self) -> ArtifactKind {
        if self.semantic_type == VISUALIZATION_TYPE {
            ArtifactKind::Visualization
        } else {
            ArtifactKind::Artifact
        }
    }

    /// Decode metadata from YAML text.
    pub fn from_yaml_str(doc: &str) -> Result<Self, SchemaError> {
        let raw: RawMetadata = serde_yaml::from_str(doc).map_err(|e| SchemaError::Yaml(e.to_string()))?;

        let uuid = raw.uuid.ok_or(SchemaError::MissingField("uuid"))?;
        let uuid = ArtifactId::parse(&uuid).map_err(|e| SchemaError::invalid("uuid", e.to_string()))?;
        let semantic_type = raw.semantic_type.ok_or(SchemaError::MissingField("type"))?;

        Ok(Self {
            uuid,
            semantic_type,
            format: raw.format,
        })
    }
}
