//! The node wrapper.
//!
//! A [`Picker`] wraps one value of the tree together with the configuration
//! of the tree it belongs to. Every navigation step classifies its result and
//! returns a new `Picker`; nothing is ever mutated in place. Children keep a
//! weak reference to the node that produced them, which is only used by
//! [`Picker::parent`].

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use serde_json::{Map, Value};

use crate::error::{PickerError, Result};
use crate::executor::Executor;
use crate::filter::Filter;
use crate::flatten::FlattenOptions;
use crate::index::Index;
use crate::kind::{classify, NodeKind, ValueKind};
use crate::number::loose_eq;
use crate::options::PickerOptions;
use crate::{iterable, leaf, mapping};

/// Number of children inspected by [`Picker::keys`] on iterable nodes.
pub const DEFAULT_PEEK: usize = 5;

/// Configuration snapshot copied into every node.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) options: PickerOptions,
    pub(crate) executor: Executor,
}

struct Node {
    value: Arc<Value>,
    kind: NodeKind,
    config: Config,
    parent: Option<Weak<Node>>,
    // Producing node of each child, when it differs from this node.
    child_parents: Option<Arc<[Picker]>>,
    display: OnceLock<String>,
}

/// A node in the traversed tree.
///
/// Cloning a `Picker` is cheap and yields a handle to the same node.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use treepick::{Filter, Picker};
///
/// let picker = Picker::new(json!([
///     {"city": "Amsterdam", "id": 1},
///     {"city": "Berlin", "id": 2},
///     {"city": "Athens", "id": 3},
/// ]));
///
/// let rows = picker
///     .filter(&Filter::new().field("city", "A*"))
///     .unwrap()
///     .extract(["city", "id"])
///     .unwrap();
/// assert_eq!(rows.get(), &json!([["Amsterdam", 1], ["Athens", 3]]));
/// ```
#[derive(Clone)]
pub struct Picker {
    node: Arc<Node>,
}

impl Picker {
    /// Wraps `value` with the default options.
    pub fn new(value: impl Into<Value>) -> Self {
        let config = Config {
            options: PickerOptions::default(),
            executor: Executor::sequential(),
        };
        Picker::build(Arc::new(value.into()), config, None, None)
    }

    /// Wraps `value` with `options`.
    ///
    /// Fails with [`PickerError::Config`] when `n_jobs` is `0`.
    pub fn with_options(value: impl Into<Value>, options: PickerOptions) -> Result<Self> {
        let executor = Executor::new(options.get_n_jobs())?;
        let config = Config { options, executor };
        Ok(Picker::build(Arc::new(value.into()), config, None, None))
    }

    fn build(
        value: Arc<Value>,
        config: Config,
        parent: Option<&Picker>,
        child_parents: Option<Arc<[Picker]>>,
    ) -> Self {
        let kind = classify(&value, config.options.get_leaf_types());
        Picker {
            node: Arc::new(Node {
                value,
                kind,
                config,
                parent: parent.map(|p| Arc::downgrade(&p.node)),
                child_parents,
                display: OnceLock::new(),
            }),
        }
    }

    /// Wraps a derived value in a new node sharing this node's configuration.
    pub(crate) fn make_child(
        &self,
        value: impl Into<Arc<Value>>,
        parent: &Picker,
        child_parents: Option<Arc<[Picker]>>,
    ) -> Picker {
        Picker::build(value.into(), self.node.config.clone(), Some(parent), child_parents)
    }

    pub(crate) fn config(&self) -> &Config {
        &self.node.config
    }

    pub(crate) fn shared_value(&self) -> Arc<Value> {
        Arc::clone(&self.node.value)
    }

    pub(crate) fn tracked_parents(&self) -> Option<&Arc<[Picker]>> {
        self.node.child_parents.as_ref()
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// The wrapped value.
    pub fn get(&self) -> &Value {
        &self.node.value
    }

    /// An owned copy of the wrapped value.
    pub fn to_value(&self) -> Value {
        self.get().clone()
    }

    /// Consumes the handle, moving the value out when nothing else shares it.
    pub fn into_value(self) -> Value {
        match Arc::try_unwrap(self.node) {
            Ok(node) => Arc::unwrap_or_clone(node.value),
            Err(node) => Value::clone(&node.value),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    pub fn options(&self) -> &PickerOptions {
        &self.node.config.options
    }

    /// Number of workers used by filter, flatten and broadcast operations.
    pub fn workers(&self) -> usize {
        self.node.config.executor.workers()
    }

    /// Returns `true` if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Picker) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// The node that produced this one.
    pub fn parent(&self) -> Result<Picker> {
        let weak = self.node.parent.as_ref().ok_or(PickerError::NoParent)?;
        weak.upgrade()
            .map(|node| Picker { node })
            .ok_or(PickerError::ParentReleased)
    }

    /// Per-child producing nodes recorded by a propagated extraction.
    pub fn child_parents(&self) -> Option<&[Picker]> {
        self.node.child_parents.as_deref()
    }

    /// Number of entries (mappings) or elements (iterables).
    pub fn len(&self) -> Result<usize> {
        match self.get() {
            Value::Object(map) if !self.is_leaf() => Ok(map.len()),
            Value::Array(items) if !self.is_leaf() => Ok(items.len()),
            _ => Err(PickerError::Leaf { op: "measure" }),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    /// Key membership for mappings, element membership for iterables.
    /// Leaves contain nothing.
    pub fn contains(&self, item: impl Into<Value>) -> bool {
        let item = item.into();
        match (self.kind(), self.get()) {
            (NodeKind::Mapping, Value::Object(map)) => {
                item.as_str().is_some_and(|key| map.contains_key(key))
            }
            (NodeKind::Iterable, Value::Array(items)) => {
                items.iter().any(|candidate| loose_eq(candidate, &item))
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Indexes this node.
    ///
    /// - Mapping: a key (or a position, looked up as its decimal string)
    ///   yields that value; a list of keys yields a row.
    /// - Iterable: a position or slice indexes the sequence; a key or list of
    ///   keys is broadcast to every child.
    /// - Leaf: fails unless `on_leaf` is `ignore`, in which case the wrapped
    ///   value is indexed directly.
    pub fn extract(&self, index: impl Into<Index>) -> Result<Picker> {
        self.dispatch_extract(&index.into(), None)
    }

    /// Indexes this node with an explicit propagation flag.
    ///
    /// On iterable nodes `true` applies `index` inside every child (one level
    /// deeper than a broadcast, tracking each child as the parent of its
    /// result) and `false` forces direct indexing of the sequence. Other
    /// kinds ignore the flag.
    pub fn extract_with(&self, index: impl Into<Index>, propagate: bool) -> Result<Picker> {
        self.dispatch_extract(&index.into(), Some(propagate))
    }

    fn dispatch_extract(&self, index: &Index, propagate: Option<bool>) -> Result<Picker> {
        match self.kind() {
            NodeKind::Leaf => leaf::extract(self, index),
            NodeKind::Mapping => mapping::extract(self, index),
            NodeKind::Iterable => iterable::extract(self, index, propagate),
        }
    }

    /// Applies `filter`.
    ///
    /// A mapping either passes whole or is replaced by the configured
    /// default; an iterable keeps the children that pass, in order. An empty
    /// filter returns this node unchanged.
    pub fn filter(&self, filter: &Filter) -> Result<Picker> {
        if self.is_leaf() {
            return Err(PickerError::Leaf { op: "filter" });
        }
        if filter.is_empty() {
            return Ok(self.clone());
        }

        let compiled = filter.compile()?;
        match self.kind() {
            NodeKind::Mapping => mapping::filter(self, &compiled),
            _ => iterable::filter(self, &compiled),
        }
    }

    /// Flattens with the default delimiter and depth.
    pub fn flatten(&self) -> Result<Picker> {
        self.flatten_with(&FlattenOptions::default())
    }

    /// Flattens a mapping into a single-level path map, or every mapping
    /// child of an iterable.
    pub fn flatten_with(&self, options: &FlattenOptions) -> Result<Picker> {
        match self.kind() {
            NodeKind::Leaf => Err(PickerError::Leaf { op: "flatten" }),
            NodeKind::Mapping => mapping::flatten(self, options),
            NodeKind::Iterable => iterable::flatten(self, options),
        }
    }

    /// Keys of a mapping, or the sorted keys shared by the first
    /// [`DEFAULT_PEEK`] mapping children of an iterable.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.keys_peek(Some(DEFAULT_PEEK))
    }

    /// Like [`keys`](Picker::keys) with an explicit peek. `None` inspects
    /// every child. Mappings ignore the peek.
    pub fn keys_peek(&self, peek: Option<usize>) -> Result<Vec<String>> {
        match self.kind() {
            NodeKind::Leaf => Err(PickerError::Leaf { op: "list keys of" }),
            NodeKind::Mapping => Ok(self.map()?.keys().cloned().collect()),
            NodeKind::Iterable => iterable::keys(self, peek),
        }
    }

    /// Values of a mapping.
    pub fn values(&self) -> Result<Vec<Value>> {
        Ok(self.map_only("values")?.values().cloned().collect())
    }

    /// Key-value pairs of a mapping.
    pub fn items(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .map_only("items")?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Immediate children as nodes: mapping values or sequence elements.
    pub fn children(&self) -> Result<Vec<Picker>> {
        match self.kind() {
            NodeKind::Leaf => Err(PickerError::Leaf { op: "iterate" }),
            NodeKind::Mapping => Ok(self
                .map()?
                .values()
                .map(|v| self.make_child(v.clone(), self, None))
                .collect()),
            NodeKind::Iterable => iterable::children(self),
        }
    }

    pub(crate) fn map(&self) -> Result<&Map<String, Value>> {
        self.get()
            .as_object()
            .ok_or_else(|| PickerError::Unsupported {
                op: "mapping access",
                kind: self.kind(),
            })
    }

    fn map_only(&self, op: &'static str) -> Result<&Map<String, Value>> {
        match self.kind() {
            NodeKind::Leaf => Err(PickerError::Leaf { op: "list values of" }),
            NodeKind::Mapping => self.map(),
            kind => Err(PickerError::Unsupported { op, kind }),
        }
    }

    pub(crate) fn seq(&self) -> Result<&[Value]> {
        self.get()
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| PickerError::Unsupported {
                op: "sequence access",
                kind: self.kind(),
            })
    }

    fn render(&self) -> String {
        let value = self.get();
        match (self.kind(), value) {
            (NodeKind::Leaf, _) => format!("<PickerLeaf({value})>"),
            (NodeKind::Mapping, _) => format!("<PickerMapping({})>", ValueKind::of(value)),
            (NodeKind::Iterable, Value::Array(items)) => {
                format!("<PickerIterable({}, len={})>", ValueKind::of(value), items.len())
            }
            (NodeKind::Iterable, _) => format!("<PickerIterable({})>", ValueKind::of(value)),
        }
    }
}

impl fmt::Display for Picker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node.display.get_or_init(|| self.render()))
    }
}

impl fmt::Debug for Picker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{LeafTypes, OnMissing};
    use serde_json::json;

    #[test]
    fn root_classification() {
        assert_eq!(Picker::new(json!({"a": 1})).kind(), NodeKind::Mapping);
        assert_eq!(Picker::new(json!([1])).kind(), NodeKind::Iterable);
        assert_eq!(Picker::new("text").kind(), NodeKind::Leaf);
        assert!(Picker::new(7).is_leaf());
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let result = Picker::with_options(json!([]), PickerOptions::new().n_jobs(0));
        assert!(matches!(result, Err(PickerError::Config(_))));
    }

    #[test]
    fn root_has_no_parent() {
        let root = Picker::new(json!({"a": 1}));
        assert!(matches!(root.parent(), Err(PickerError::NoParent)));
    }

    #[test]
    fn released_parent() {
        let child = {
            let root = Picker::new(json!({"a": {"b": 1}}));
            root.extract("a").unwrap()
        };
        assert!(matches!(child.parent(), Err(PickerError::ParentReleased)));
    }

    #[test]
    fn children_inherit_options() {
        let options = PickerOptions::new()
            .on_missing(OnMissing::Raise)
            .leaf_types(LeafTypes::parse(["object"]).unwrap());
        let root = Picker::with_options(json!([{"a": 1}]), options).unwrap();
        let child = root.extract(0).unwrap();
        assert!(child.is_leaf());
        assert_eq!(child.options().get_on_missing(), OnMissing::Raise);
    }

    #[test]
    fn display_is_cached_and_kind_specific() {
        let root = Picker::new(json!([{"a": 1}, {"a": 2}]));
        assert_eq!(root.to_string(), "<PickerIterable(array, len=2)>");
        assert_eq!(root.to_string(), "<PickerIterable(array, len=2)>");
        assert_eq!(root.extract(0).unwrap().to_string(), "<PickerMapping(object)>");
        assert_eq!(
            root.extract(0).unwrap().extract("a").unwrap().to_string(),
            "<PickerLeaf(1)>"
        );
        assert_eq!(format!("{:?}", Picker::new("x")), "<PickerLeaf(\"x\")>");
    }

    #[test]
    fn len_and_contains() {
        let map = Picker::new(json!({"a": 1, "b": 2}));
        assert_eq!(map.len().unwrap(), 2);
        assert!(map.contains("a"));
        assert!(!map.contains("z"));

        let seq = Picker::new(json!([1, 2.0, "x"]));
        assert_eq!(seq.len().unwrap(), 3);
        assert!(seq.contains(2));
        assert!(seq.contains("x"));
        assert!(!seq.is_empty().unwrap());

        let leaf = Picker::new(1);
        assert!(leaf.len().is_err());
        assert!(!leaf.contains(1));
    }

    #[test]
    fn empty_filter_returns_same_node() {
        let root = Picker::new(json!([{"a": 1}]));
        let same = root.filter(&Filter::new()).unwrap();
        assert!(same.ptr_eq(&root));
    }

    #[test]
    fn leaf_cannot_be_filtered_or_flattened() {
        let leaf = Picker::new("x");
        assert!(matches!(
            leaf.filter(&Filter::new().field("a", 1i64)),
            Err(PickerError::Leaf { .. })
        ));
        assert!(matches!(leaf.flatten(), Err(PickerError::Leaf { .. })));
        assert!(matches!(leaf.children(), Err(PickerError::Leaf { .. })));
    }

    #[test]
    fn mapping_views() {
        let map = Picker::new(json!({"a": 1, "b": [2]}));
        assert_eq!(map.keys().unwrap(), vec!["a", "b"]);
        assert_eq!(map.values().unwrap(), vec![json!(1), json!([2])]);
        assert_eq!(
            map.items().unwrap(),
            vec![("a".to_string(), json!(1)), ("b".to_string(), json!([2]))]
        );
        let children = map.children().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[1].parent().unwrap().ptr_eq(&map));

        let seq = Picker::new(json!([1]));
        assert!(matches!(
            seq.values(),
            Err(PickerError::Unsupported { op: "values", .. })
        ));
    }
}
