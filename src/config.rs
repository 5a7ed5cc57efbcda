use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::projection::{BinaryEncoding, NAMESPACE_ISO_MDL};
use crate::utils::NonEmptyVec;

/// Settings of a [Decoder](crate::decoder::Decoder).
///
/// Every field is optional in the serialized form:
///
/// ```json
/// {
///   "default_namespaces": ["org.iso.18013.5.1", "org.iso.7367.1"],
///   "document_index": 0,
///   "binary_encoding": "url_safe_no_pad"
/// }
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Namespaces projected when the caller does not name any.
    pub default_namespaces: NonEmptyVec<String>,
    /// Which document of the presentation is projected.
    pub document_index: usize,
    pub binary_encoding: BinaryEncoding,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            default_namespaces: NonEmptyVec::new(NAMESPACE_ISO_MDL.to_owned()),
            document_index: 0,
            binary_encoding: BinaryEncoding::default(),
        }
    }
}

impl DecoderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse decoder configuration")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read decoder configuration {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in {}", path.display()))
    }

    pub fn with_default_namespaces(mut self, namespaces: NonEmptyVec<String>) -> Self {
        self.default_namespaces = namespaces;
        self
    }

    pub fn with_document_index(mut self, document_index: usize) -> Self {
        self.document_index = document_index;
        self
    }

    pub fn with_binary_encoding(mut self, binary_encoding: BinaryEncoding) -> Self {
        self.binary_encoding = binary_encoding;
        self
    }
}
