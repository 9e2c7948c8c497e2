//! Action records: who produced an artifact, from what inputs and parameters.
//!
//! Records arrive as loosely-typed YAML documents (`action/action.yaml`
//! inside an archive's provenance tree). They are decoded here into tagged
//! variants and validated once, so the rest of the crate never handles
//! undefined-shaped data.
//!
//! ## Document Shape
//!
//! ```yaml
//! execution:
//!     uuid: 5a6ac5e2-...
//! action:
//!     type: method
//!     plugin: !ref 'environment:plugins:feature-table'
//!     action: rarefy
//!     inputs:
//!     -   table: 0b9d2b46-...
//!     -   optional_tree: null
//!     -   tables:
//!         -   left: 4f0d3e6a-...
//!         -   right: 2c4e6f8a-...
//!     parameters:
//!     -   sampling_depth: 1000
//!     -   metadata: !metadata '9a1b...:sample-metadata.tsv'
//!     output-name: rarefied_table
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;

use super::edge::{EdgeLabel, InputEdge};
use super::ids::{ActionId, ArtifactId};

/// Error raised when a decoded document does not match the record schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// A field is present but has the wrong shape.
    #[error("Invalid field {field}: {reason}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The document is not valid YAML.
    #[error("Malformed YAML: {0}")]
    Yaml(String),
}

impl SchemaError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Kind of action that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// External data brought into the archive. Terminates recursion.
    Import,
    /// A method producing artifacts.
    Method,
    /// A visualizer producing a visualization.
    Visualizer,
    /// A pipeline composed of other actions.
    Pipeline,
}

impl ActionKind {
    /// Parse an action kind from its `action.type` string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "import" => Some(Self::Import),
            "method" => Some(Self::Method),
            "visualizer" => Some(Self::Visualizer),
            "pipeline" => Some(Self::Pipeline),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Method => write!(f, "method"),
            Self::Visualizer => write!(f, "visualizer"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Reference from an input slot to the artifact(s) it consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArtifactRef {
    /// A single artifact.
    Single(ArtifactId),
    /// An unkeyed list of artifacts; each element is an ordinary input.
    List(Vec<ArtifactId>),
    /// A keyed collection; each element is labeled `key:param`.
    Collection(Vec<(String, ArtifactId)>),
    /// Optional input that was not supplied.
    Absent,
}

/// Value of an action parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    /// Plain value with no artifact references.
    Scalar(serde_json::Value),
    /// Parameter backed by artifacts (e.g. artifact-derived metadata).
    /// Traversed exactly like an input.
    Artifacts(Vec<ArtifactId>),
}

/// A decoded action record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The execution this record describes.
    pub execution_id: ActionId,
    /// Kind of action.
    pub kind: ActionKind,
    /// Inputs in document order.
    pub inputs: Vec<(String, ArtifactRef)>,
    /// Parameters in document order.
    pub parameters: Vec<(String, ParamValue)>,
    /// Plugin that provides the action, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Name of the action within its plugin, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Output slot the artifact was written to, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl ActionRecord {
    /// Create a record with no inputs or parameters.
    pub fn new(execution_id: ActionId, kind: ActionKind) -> Self {
        Self {
            execution_id,
            kind,
            inputs: Vec::new(),
            parameters: Vec::new(),
            plugin: None,
            action: None,
            output_name: None,
        }
    }

    /// Create an import record.
    pub fn import(execution_id: ActionId) -> Self {
        Self::new(execution_id, ActionKind::Import)
    }

    /// Append an input.
    pub fn with_input(mut self, name: impl Into<String>, input: ArtifactRef) -> Self {
        self.inputs.push((name.into(), input));
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.push((name.into(), value));
        self
    }

    /// Whether this record terminates traversal.
    pub fn is_import(&self) -> bool {
        self.kind == ActionKind::Import
    }

    /// Input edges of this action in document order, inputs before
    /// artifact parameters. Duplicate `(label, source)` pairs are dropped.
    ///
    /// Import records have no edges.
    pub fn input_edges(&self) -> Vec<InputEdge> {
        let mut edges: Vec<InputEdge> = Vec::new();
        if self.is_import() {
            return edges;
        }

        let mut seen: HashSet<InputEdge> = HashSet::new();
        let mut push = |edge: InputEdge| {
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        };

        for (name, input) in &self.inputs {
            match input {
                ArtifactRef::Single(id) => push(InputEdge::new(EdgeLabel::param(name), *id)),
                ArtifactRef::List(ids) => {
                    for id in ids {
                        push(InputEdge::new(EdgeLabel::param(name), *id));
                    }
                }
                ArtifactRef::Collection(elements) => {
                    for (key, id) in elements {
                        push(InputEdge::new(EdgeLabel::element(key, name), *id));
                    }
                }
                ArtifactRef::Absent => {}
            }
        }

        for (name, value) in &self.parameters {
            if let ParamValue::Artifacts(ids) = value {
                for id in ids {
                    push(InputEdge::new(EdgeLabel::param(name), *id));
                }
            }
        }

        edges
    }

    /// Decode a record from YAML text.
    pub fn from_yaml_str(doc: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_yaml::from_str(doc).map_err(|e| SchemaError::Yaml(e.to_string()))?;
        Self::from_yaml_value(&value)
    }

    /// Decode a record from an already-parsed YAML document.
    pub fn from_yaml_value(doc: &Value) -> Result<Self, SchemaError> {
        let execution_uuid = required_str(doc, "execution", "uuid", "execution.uuid")?;
        let execution_id = ActionId::parse(execution_uuid)
            .map_err(|e| SchemaError::invalid("execution.uuid", e.to_string()))?;

        let action = doc.get("action").map(untag);
        let kind_str = required_str(doc, "action", "type", "action.type")?;
        let kind = ActionKind::parse(kind_str).ok_or_else(|| {
            SchemaError::invalid("action.type", format!("unknown action type '{kind_str}'"))
        })?;

        let mut record = Self::new(execution_id, kind);
        record.plugin = action.and_then(|a| optional_str(a, "plugin"));
        record.action = action.and_then(|a| optional_str(a, "action"));
        record.output_name = action.and_then(|a| optional_str(a, "output-name"));

        // Imports carry no traversable inputs; anything else under them is ignored.
        if kind == ActionKind::Import {
            return Ok(record);
        }

        let Some(action) = action else {
            return Ok(record);
        };

        for (name, value) in single_key_entries(action.get("inputs"), "action.inputs")? {
            let field = format!("action.inputs.{name}");
            record.inputs.push((name, decode_input(value, &field)?));
        }

        for (name, value) in single_key_entries(action.get("parameters"), "action.parameters")? {
            let field = format!("action.parameters.{name}");
            record.parameters.push((name, decode_parameter(value, &field)?));
        }

        Ok(record)
    }
}

/// Strip any YAML tag (`!ref`, `!metadata`, ...) from a value.
fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn required_str<'a>(
    doc: &'a Value,
    section: &str,
    key: &str,
    path: &'static str,
) -> Result<&'a str, SchemaError> {
    let value = doc
        .get(section)
        .map(untag)
        .and_then(|s| s.get(key))
        .map(untag);

    match value {
        None | Some(Value::Null) => Err(SchemaError::MissingField(path)),
        Some(v) => v
            .as_str()
            .ok_or_else(|| SchemaError::invalid(path, "expected a string")),
    }
}

fn optional_str(section: &Value, key: &str) -> Option<String> {
    section
        .get(key)
        .map(untag)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Render a mapping key as a string. Collection keys are sometimes numeric.
fn key_string(key: &Value) -> Option<String> {
    match untag(key) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_artifact_id(value: &Value, field: &str) -> Result<ArtifactId, SchemaError> {
    let s = untag(value)
        .as_str()
        .ok_or_else(|| SchemaError::invalid(field, "expected an artifact UUID string"))?;
    ArtifactId::parse(s).map_err(|e| SchemaError::invalid(field, e.to_string()))
}

/// Flatten a sequence of single-key mappings (`- name: value`) into pairs.
///
/// A missing or null section is empty.
fn single_key_entries<'a>(
    section: Option<&'a Value>,
    path: &str,
) -> Result<Vec<(String, &'a Value)>, SchemaError> {
    let items = match section.map(untag) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => return Err(SchemaError::invalid(path, "expected a list")),
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let mapping = untag(item)
            .as_mapping()
            .ok_or_else(|| SchemaError::invalid(path, "expected `- name: value` entries"))?;
        for (key, value) in mapping {
            let name = key_string(key)
                .ok_or_else(|| SchemaError::invalid(path, "entry name is not a string"))?;
            entries.push((name, value));
        }
    }
    Ok(entries)
}

fn decode_input(value: &Value, field: &str) -> Result<ArtifactRef, SchemaError> {
    match untag(value) {
        Value::Null => Ok(ArtifactRef::Absent),
        Value::String(_) => Ok(ArtifactRef::Single(parse_artifact_id(value, field)?)),
        Value::Sequence(items) => {
            let mut plain = Vec::new();
            let mut keyed = Vec::new();
            for item in items {
                match untag(item) {
                    Value::Mapping(mapping) => {
                        for (key, id) in mapping {
                            let key = key_string(key).ok_or_else(|| {
                                SchemaError::invalid(field, "collection key is not a string")
                            })?;
                            keyed.push((key, parse_artifact_id(id, field)?));
                        }
                    }
                    _ => plain.push(parse_artifact_id(item, field)?),
                }
            }
            match (plain.is_empty(), keyed.is_empty()) {
                (_, true) => Ok(ArtifactRef::List(plain)),
                (true, false) => Ok(ArtifactRef::Collection(keyed)),
                (false, false) => Err(SchemaError::invalid(
                    field,
                    "mixes keyed and unkeyed collection elements",
                )),
            }
        }
        _ => Err(SchemaError::invalid(
            field,
            "expected an artifact UUID, a list, or null",
        )),
    }
}

fn decode_parameter(value: &Value, field: &str) -> Result<ParamValue, SchemaError> {
    if let Value::Tagged(tagged) = value {
        if tagged.tag == "metadata" {
            if let Some(ids) = tagged.value.as_str().and_then(metadata_artifacts) {
                return Ok(ParamValue::Artifacts(ids));
            }
        }
    }

    if let Some(artifacts) = untag(value).as_mapping().and_then(|m| m.get("artifacts")) {
        let ids = match untag(artifacts) {
            Value::Sequence(items) => items
                .iter()
                .map(|item| parse_artifact_id(item, field))
                .collect::<Result<Vec<_>, _>>()?,
            Value::Null => Vec::new(),
            _ => return Err(SchemaError::invalid(field, "`artifacts` must be a list")),
        };
        return Ok(ParamValue::Artifacts(ids));
    }

    serde_json::to_value(value)
        .map(ParamValue::Scalar)
        .map_err(|e| SchemaError::invalid(field, e.to_string()))
}

/// Artifact ids of a `!metadata 'uuid[,uuid]:file.tsv'` scalar.
///
/// Returns `None` when the scalar is a plain file reference.
fn metadata_artifacts(scalar: &str) -> Option<Vec<ArtifactId>> {
    let (ids, _file) = scalar.split_once(':')?;
    let parsed = ids
        .split(',')
        .map(|s| ArtifactId::parse(s.trim()))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}
