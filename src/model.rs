//! Data model for extracted module documentation.
//!
//! Records are deserialized from the `nimdocinfo` JSON payload, then enriched
//! in place with parsed docstrings before rendering.

use crate::docstring::RaisesDoc;
use serde::{Deserialize, Serialize};

/// A documented Nim module.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Module {
    /// Module name as reported by the extractor.
    pub module: String,
    /// Source file path.
    pub file: String,
    /// Module-level `##` doc comment.
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// A documented declaration (proc, type, const, ...).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Entry {
    pub name: String,
    /// Declaration kind as reported by the extractor (`proc`, `type`, ...).
    pub kind: String,
    pub line: u32,
    pub signature: String,
    /// Raw doc comment.
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub params: Vec<Param>,
    /// Declared return type.
    #[serde(default)]
    pub returns: String,
    #[serde(default)]
    pub pragmas: Vec<String>,
    /// Error types from the `raises` pragma.
    #[serde(default)]
    pub raises: Vec<String>,
    #[serde(default = "default_true")]
    pub exported: bool,
    /// Object fields.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Enum values.
    #[serde(default)]
    pub values: Vec<Field>,

    // Populated by enrichment
    /// Prose part of the doc comment.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub returns_doc: String,
    #[serde(default)]
    pub raises_doc: Vec<RaisesDoc>,
}

/// A declared parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Filled from the docstring during enrichment.
    #[serde(default)]
    pub description: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: String::new(),
        }
    }
}

/// An object field or enum value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Field {
    pub name: String,
    /// Field type, or the explicit ordinal/string of an enum value.
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default = "default_true")]
    pub exported: bool,
    /// Discriminator branch for object variants (`kind == vkInt`).
    #[serde(default)]
    pub branch: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            doc: String::new(),
            exported: true,
            branch: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
