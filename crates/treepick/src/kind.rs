//! Node classification.
//!
//! Every node is exactly one of [`NodeKind::Leaf`], [`NodeKind::Mapping`] or
//! [`NodeKind::Iterable`], decided once by [`classify`] when the node is built.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::PickerError;
use crate::options::LeafTypes;

/// The kind of a node in the traversed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Non-traversable value (or one forced to be a leaf).
    Leaf,
    /// Key-value container.
    Mapping,
    /// Ordered sequence of children.
    Iterable,
}

impl NodeKind {
    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Mapping => "mapping",
            NodeKind::Iterable => "iterable",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The exact type of a JSON-like value, used for leaf overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Returns the kind of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = PickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(ValueKind::Null),
            "bool" => Ok(ValueKind::Bool),
            "number" => Ok(ValueKind::Number),
            "string" => Ok(ValueKind::String),
            "array" => Ok(ValueKind::Array),
            "object" => Ok(ValueKind::Object),
            other => Err(PickerError::config(format!(
                "`{other}` is not a value type (expected one of null, bool, number, string, array, object)"
            ))),
        }
    }
}

/// Decides which kind of node should wrap `value`.
///
/// Exact-type overrides win, then leaf functions (a function that errors
/// counts as "not a leaf"), then the structural check: objects are mappings,
/// arrays are iterables and everything else, strings included, is a leaf.
pub fn classify(value: &Value, leaf_types: &LeafTypes) -> NodeKind {
    let value_kind = ValueKind::of(value);
    if leaf_types.kinds().any(|kind| kind == value_kind) {
        return NodeKind::Leaf;
    }

    for func in leaf_types.funcs() {
        match func(value) {
            Ok(true) => return NodeKind::Leaf,
            Ok(false) => {}
            Err(err) => {
                tracing::trace!(error = %err, "leaf type function failed, treating as non-leaf");
            }
        }
    }

    match value {
        Value::Object(_) => NodeKind::Mapping,
        Value::Array(_) => NodeKind::Iterable,
        _ => NodeKind::Leaf,
    }
}
