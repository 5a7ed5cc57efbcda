//! Shape checks over decoded [ciborium::Value] trees.
//!
//! Every helper takes the path of the value it inspects so that errors point at the offending
//! container, e.g. `documents[0].issuerSigned.nameSpaces`.

use ciborium::{value::Integer, Value as Cbor};

use crate::core::error::DecodeError;

/// Tag for embedded CBOR data item (RFC 8949 §3.4.5.1).
pub const TAG_ENCODED_CBOR: u64 = 24;

/// Decode exactly one CBOR data item from `bytes`.
pub fn from_slice(bytes: &[u8], path: &str) -> Result<Cbor, DecodeError> {
    let mut reader = bytes;
    let value: Cbor = ciborium::from_reader(&mut reader).map_err(|source| DecodeError::Cbor {
        path: path.to_owned(),
        source,
    })?;

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            path: path.to_owned(),
            count: reader.len(),
        });
    }

    Ok(value)
}

pub fn type_name(value: &Cbor) -> &'static str {
    match value {
        Cbor::Integer(_) => "integer",
        Cbor::Bytes(_) => "byte string",
        Cbor::Float(_) => "float",
        Cbor::Text(_) => "text string",
        Cbor::Bool(_) => "boolean",
        Cbor::Null => "null",
        Cbor::Tag(_, _) => "tagged value",
        Cbor::Array(_) => "array",
        Cbor::Map(_) => "map",
        _ => "unknown value",
    }
}

fn unexpected(value: &Cbor, expected: &'static str, path: &str) -> DecodeError {
    DecodeError::UnexpectedType {
        path: path.to_owned(),
        expected,
        found: type_name(value),
    }
}

pub fn into_map(value: Cbor, path: &str) -> Result<Vec<(Cbor, Cbor)>, DecodeError> {
    match value {
        Cbor::Map(entries) => Ok(entries),
        other => Err(unexpected(&other, "map", path)),
    }
}

pub fn into_array(value: Cbor, path: &str) -> Result<Vec<Cbor>, DecodeError> {
    match value {
        Cbor::Array(items) => Ok(items),
        other => Err(unexpected(&other, "array", path)),
    }
}

pub fn into_text(value: Cbor, path: &str) -> Result<String, DecodeError> {
    match value {
        Cbor::Text(text) => Ok(text),
        other => Err(unexpected(&other, "text string", path)),
    }
}

pub fn into_bytes(value: Cbor, path: &str) -> Result<Vec<u8>, DecodeError> {
    match value {
        Cbor::Bytes(bytes) => Ok(bytes),
        other => Err(unexpected(&other, "byte string", path)),
    }
}

pub fn into_uint(value: Cbor, path: &str) -> Result<u64, DecodeError> {
    match value {
        Cbor::Integer(i) => u64::try_from(i).map_err(|_| DecodeError::UnexpectedType {
            path: path.to_owned(),
            expected: "unsigned integer",
            found: "negative integer",
        }),
        other => Err(unexpected(&other, "unsigned integer", path)),
    }
}

pub fn into_int(value: Integer, path: &str) -> Result<i64, DecodeError> {
    i64::try_from(value).map_err(|_| DecodeError::UnsupportedValue {
        path: path.to_owned(),
        reason: format!("integer {} does not fit in 64 bits", i128::from(value)),
    })
}

/// Unwrap `#6.24(bstr .cbor T)` and decode the embedded item.
pub fn unwrap_encoded_cbor(value: Cbor, path: &str) -> Result<Cbor, DecodeError> {
    match value {
        Cbor::Tag(TAG_ENCODED_CBOR, inner) => {
            let bytes = into_bytes(*inner, path)?;
            from_slice(&bytes, path)
        }
        other => Err(unexpected(&other, "tag 24 embedded CBOR", path)),
    }
}

/// A text-keyed CBOR map whose fields are taken out one by one.
pub struct Fields {
    entries: Vec<(Cbor, Cbor)>,
    path: String,
}

impl Fields {
    pub fn new(value: Cbor, path: impl Into<String>) -> Result<Self, DecodeError> {
        let path = path.into();
        let entries = into_map(value, &path)?;
        Ok(Self { entries, path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of a member of this map.
    pub fn child(&self, field: &str) -> String {
        format!("{}.{field}", self.path)
    }

    pub fn take(&mut self, field: &str) -> Option<Cbor> {
        let index = self
            .entries
            .iter()
            .position(|(k, _)| matches!(k, Cbor::Text(key) if key == field))?;
        Some(self.entries.remove(index).1)
    }

    pub fn require(&mut self, field: &'static str) -> Result<Cbor, DecodeError> {
        self.take(field).ok_or_else(|| DecodeError::MissingField {
            path: self.path.clone(),
            field,
        })
    }
}
