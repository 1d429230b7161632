//! Error types for the treepick crate.

use thiserror::Error;

use crate::index::Index;
use crate::kind::{NodeKind, ValueKind};

/// Errors that can occur when navigating, filtering or flattening a tree.
#[derive(Debug, Error)]
pub enum PickerError {
    /// A traversal operation was attempted on a leaf node.
    #[error("cannot {op} a leaf node")]
    Leaf { op: &'static str },

    /// A requested key or field is absent and the missing policy is strict.
    #[error("`{field}` field does not exist")]
    MissingField { field: String },

    /// An option value is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed regular expression in a predicate. Never suppressed.
    #[error("invalid regex pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A user-supplied predicate function failed while `on_error` is strict.
    #[error("predicate for `{field}` failed: {source}")]
    Predicate {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    /// Index outside the bounds of the wrapped sequence.
    #[error("{index} out of range for length {len}")]
    IndexOutOfRange { index: String, len: usize },

    /// Key lookup on the wrapped value itself failed.
    #[error("key `{key}` not found")]
    KeyNotFound { key: String },

    /// The wrapped value cannot be indexed this way.
    #[error("{value_type} value cannot be indexed by {index}")]
    NotIndexable {
        value_type: &'static str,
        index: String,
    },

    /// Operation is not defined for this kind of node.
    #[error("`{op}` is not supported on {kind} nodes")]
    Unsupported { op: &'static str, kind: NodeKind },

    /// Parent lookup on a root node.
    #[error("root node has no parent")]
    NoParent,

    /// The producing node has already been dropped.
    #[error("parent node has been released")]
    ParentReleased,
}

impl PickerError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PickerError::Config(msg.into())
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        PickerError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn out_of_range(index: &Index, len: usize) -> Self {
        PickerError::IndexOutOfRange {
            index: index.to_string(),
            len,
        }
    }

    pub(crate) fn not_indexable(value_kind: ValueKind, index: &Index) -> Self {
        PickerError::NotIndexable {
            value_type: value_kind.as_str(),
            index: index.to_string(),
        }
    }
}

/// Result type for picker operations.
pub type Result<T> = std::result::Result<T, PickerError>;
