use std::fmt;

/// Coarse classification of a [DecodeError], used by callers to choose between "the wallet
/// returned something unreadable" and "the wallet returned a readable but unexpected document".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The response or its token could not be read at all. Nothing was decoded.
    MalformedInput,
    /// The token decoded to bytes that do not form the expected device response.
    StructurallyInvalid,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::MalformedInput => f.write_str("malformed-input"),
            ErrorCategory::StructurallyInvalid => f.write_str("structurally-invalid"),
        }
    }
}

/// Presentation decoding error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The token is not valid base64.
    #[error("presentation token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The token is empty.
    #[error("presentation token is empty")]
    EmptyToken,

    /// The wallet response is not valid JSON or lacks a usable `vp_token`.
    #[error("invalid presentation response: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    /// The wallet response holds no presentation.
    #[error("presentation response contains no vp_token entries")]
    NoPresentation,

    /// The bytes do not follow the CBOR grammar.
    #[error("invalid CBOR at {path}: {source}")]
    Cbor {
        path: String,
        #[source]
        source: ciborium::de::Error<std::io::Error>,
    },

    /// A complete CBOR item was followed by further bytes.
    #[error("{count} trailing bytes after CBOR item at {path}")]
    TrailingBytes { path: String, count: usize },

    /// A required field is absent.
    #[error("missing `{field}` at {path}")]
    MissingField { path: String, field: &'static str },

    /// A value is not of the expected CBOR major type.
    #[error("expected {expected} at {path}, found {found}")]
    UnexpectedType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A namespace or element identifier occurs twice in the same container.
    #[error("duplicate key `{key}` at {path}")]
    DuplicateKey { path: String, key: String },

    /// An element value uses a CBOR construct with no [ElementValue](crate::core::mdoc::ElementValue)
    /// counterpart.
    #[error("unsupported element value at {path}: {reason}")]
    UnsupportedValue { path: String, reason: String },

    /// A date element does not hold a valid date.
    #[error("invalid date at {path}: {reason}")]
    InvalidDate { path: String, reason: String },

    /// The requested document does not exist in the presentation.
    #[error("document index {index} out of range, presentation holds {count} documents")]
    DocumentOutOfRange { index: usize, count: usize },
}

impl DecodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DecodeError::Base64(_)
            | DecodeError::EmptyToken
            | DecodeError::InvalidResponse(_)
            | DecodeError::NoPresentation => ErrorCategory::MalformedInput,
            DecodeError::Cbor { .. }
            | DecodeError::TrailingBytes { .. }
            | DecodeError::MissingField { .. }
            | DecodeError::UnexpectedType { .. }
            | DecodeError::DuplicateKey { .. }
            | DecodeError::UnsupportedValue { .. }
            | DecodeError::InvalidDate { .. }
            | DecodeError::DocumentOutOfRange { .. } => ErrorCategory::StructurallyInvalid,
        }
    }

    pub fn is_malformed_input(&self) -> bool {
        self.category() == ErrorCategory::MalformedInput
    }

    pub fn is_structurally_invalid(&self) -> bool {
        self.category() == ErrorCategory::StructurallyInvalid
    }
}
