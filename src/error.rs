use thiserror::Error;

use crate::util::span::Span;

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Why a document failed to load.
///
/// Every variant is fatal to the load call. Paths use dotted/indexed
/// notation, e.g. `plans[0].steps[2].port_mapping` or `TcpOutput.encoder`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The text cannot be parsed into the expected structural shape.
    #[error("{span}: malformed document: {message}")]
    MalformedDocument { span: Span, message: String },

    /// A mandatory field is absent.
    #[error("{path}: missing required field")]
    MissingRequiredField { path: String },

    /// A field is present but violates its constraint.
    #[error("{path}: invalid value {value}: {reason}")]
    InvalidFieldValue {
        path: String,
        value: String,
        reason: String,
    },

    /// A named cross-reference does not resolve.
    #[error("{path}: unresolved reference '{name}': {reason}")]
    UnresolvedReference {
        path: String,
        name: String,
        reason: String,
    },

    /// A name that must be unique is repeated.
    #[error("{path}: duplicate name '{name}'")]
    DuplicateName { path: String, name: String },
}

impl SchemaError {
    pub fn malformed(span: Span, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            span,
            message: message.into(),
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingRequiredField { path: path.into() }
    }

    pub fn invalid(
        path: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            path: path.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn unresolved(
        path: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            path: path.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            path: path.into(),
            name: name.into(),
        }
    }

    /// The field path of the offending value, if the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MalformedDocument { .. } => None,
            Self::MissingRequiredField { path }
            | Self::InvalidFieldValue { path, .. }
            | Self::UnresolvedReference { path, .. }
            | Self::DuplicateName { path, .. } => Some(path),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDocument { .. } => "malformed_document",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::InvalidFieldValue { .. } => "invalid_field_value",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::DuplicateName { .. } => "duplicate_name",
        }
    }
}
