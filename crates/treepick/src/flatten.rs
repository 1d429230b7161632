//! Collapsing nested trees into single-level path maps.

use serde_json::{Map, Value};

use crate::kind::{classify, NodeKind};
use crate::options::LeafTypes;

/// Depth used by [`FlattenOptions::default`].
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Options for [`Picker::flatten_with`](crate::Picker::flatten_with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Joins path segments (default `_`).
    pub delimiter: String,
    /// Nested levels expanded below the top-level keys. `None` is unbounded.
    pub max_depth: Option<usize>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions {
            delimiter: "_".to_string(),
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl FlattenOptions {
    pub fn new() -> Self {
        FlattenOptions::default()
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Flattens `value` into a map from joined paths to leaf values.
///
/// Keys are visited depth-first, mapping keys in their stored order and
/// sequence elements by position. A value reached beyond `max_depth` is
/// stored whole under the path accumulated so far.
pub(crate) fn flatten_value(
    value: &Value,
    options: &FlattenOptions,
    leaf_types: &LeafTypes,
) -> Map<String, Value> {
    let mut flat = Map::new();
    let mut path = Vec::new();
    walk(value, &mut path, 0, options, leaf_types, &mut flat);
    flat
}

fn walk(
    value: &Value,
    path: &mut Vec<String>,
    depth: usize,
    options: &FlattenOptions,
    leaf_types: &LeafTypes,
    flat: &mut Map<String, Value>,
) {
    if options.max_depth.is_some_and(|max| depth > max) {
        flat.insert(join(path, &options.delimiter), value.clone());
        return;
    }

    match (classify(value, leaf_types), value) {
        (NodeKind::Mapping, Value::Object(map)) => {
            for (key, child) in map {
                path.push(key.clone());
                walk(child, path, depth + 1, options, leaf_types, flat);
                path.pop();
            }
        }
        (NodeKind::Iterable, Value::Array(items)) => {
            for (idx, child) in items.iter().enumerate() {
                path.push(idx.to_string());
                walk(child, path, depth + 1, options, leaf_types, flat);
                path.pop();
            }
        }
        _ => {
            flat.insert(join(path, &options.delimiter), value.clone());
        }
    }
}

fn join(path: &[String], delimiter: &str) -> String {
    path.iter()
        .filter(|segment| !segment.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(delimiter)
}
