//! Configuration carried by every node.
//!
//! [`PickerOptions`] is built once for a root node and copied into each child
//! produced from it. [`PickerSettings`] is the plain-data form that can be
//! deserialized from a configuration document.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PickerError, Result};
use crate::executor::resolve_workers;
use crate::kind::ValueKind;

/// Behaviour when a requested key or field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMissing {
    /// Substitute the configured default (or evaluate the field as false).
    #[default]
    Ignore,
    /// Fail with [`PickerError::MissingField`].
    Raise,
}

/// Behaviour when a predicate function itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Treat the field as not matching.
    #[default]
    Ignore,
    /// Surface the error as [`PickerError::Predicate`].
    Raise,
}

/// Behaviour when a leaf is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnLeaf {
    /// Fail with [`PickerError::Leaf`].
    #[default]
    Raise,
    /// Delegate to the wrapped value's own indexing.
    Ignore,
}

macro_rules! policy_names {
    ($ty:ident, $what:literal, $($variant:ident => $name:literal),+) => {
        impl $ty {
            /// Returns the display name of this policy.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = PickerError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(PickerError::config(format!(
                        concat!("`{}` is not a valid ", $what, " policy"),
                        other
                    ))),
                }
            }
        }
    };
}

policy_names!(OnMissing, "on_missing", Ignore => "ignore", Raise => "raise");
policy_names!(OnError, "on_error", Ignore => "ignore", Raise => "raise");
policy_names!(OnLeaf, "on_leaf", Raise => "raise", Ignore => "ignore");

/// Function deciding whether a value should be forced to be a leaf.
pub type LeafFn = Arc<dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync>;

/// A single leaf override: an exact value type or a predicate function.
#[derive(Clone)]
pub enum LeafType {
    Kind(ValueKind),
    Func(LeafFn),
}

impl LeafType {
    /// Wraps a predicate function.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        LeafType::Func(Arc::new(f))
    }
}

impl fmt::Debug for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafType::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            LeafType::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<ValueKind> for LeafType {
    fn from(kind: ValueKind) -> Self {
        LeafType::Kind(kind)
    }
}

impl FromStr for LeafType {
    type Err = PickerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<ValueKind>().map(LeafType::Kind)
    }
}

/// Ordered collection of leaf overrides.
///
/// Accepts a single kind, a single function or a mixed collection:
///
/// ```
/// use treepick::{LeafType, LeafTypes, ValueKind};
///
/// let single = LeafTypes::from(ValueKind::Object);
/// let mixed: LeafTypes = vec![
///     LeafType::Kind(ValueKind::Array),
///     LeafType::func(|v| Ok(v.get("city").is_some())),
/// ]
/// .into_iter()
/// .collect();
/// assert_eq!(single.len(), 1);
/// assert_eq!(mixed.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LeafTypes(Vec<LeafType>);

impl LeafTypes {
    /// Parses a list of value type names. Unknown names are a configuration error.
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<LeafType>())
            .collect::<Result<Vec<_>>>()
            .map(LeafTypes)
    }

    /// Exact-type overrides, in order.
    pub fn kinds(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.0.iter().filter_map(|t| match t {
            LeafType::Kind(kind) => Some(*kind),
            LeafType::Func(_) => None,
        })
    }

    /// Function overrides, in order.
    pub fn funcs(&self) -> impl Iterator<Item = &LeafFn> + '_ {
        self.0.iter().filter_map(|t| match t {
            LeafType::Func(f) => Some(f),
            LeafType::Kind(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValueKind> for LeafTypes {
    fn from(kind: ValueKind) -> Self {
        LeafTypes(vec![LeafType::Kind(kind)])
    }
}

impl From<LeafType> for LeafTypes {
    fn from(leaf_type: LeafType) -> Self {
        LeafTypes(vec![leaf_type])
    }
}

impl From<Vec<LeafType>> for LeafTypes {
    fn from(types: Vec<LeafType>) -> Self {
        LeafTypes(types)
    }
}

impl FromIterator<LeafType> for LeafTypes {
    fn from_iter<I: IntoIterator<Item = LeafType>>(iter: I) -> Self {
        LeafTypes(iter.into_iter().collect())
    }
}

impl FromIterator<ValueKind> for LeafTypes {
    fn from_iter<I: IntoIterator<Item = ValueKind>>(iter: I) -> Self {
        LeafTypes(iter.into_iter().map(LeafType::Kind).collect())
    }
}

/// Options for a node tree.
///
/// # Example
///
/// ```
/// use treepick::{OnMissing, PickerOptions, ValueKind};
///
/// let options = PickerOptions::new()
///     .on_missing(OnMissing::Raise)
///     .leaf_types(ValueKind::Object)
///     .n_jobs(2);
/// assert_eq!(options.get_on_missing(), OnMissing::Raise);
/// ```
#[derive(Debug, Clone)]
pub struct PickerOptions {
    on_missing: OnMissing,
    on_error: OnError,
    on_leaf: OnLeaf,
    leaf_types: LeafTypes,
    default: Value,
    n_jobs: Option<i64>,
}

impl Default for PickerOptions {
    fn default() -> Self {
        PickerOptions {
            on_missing: OnMissing::Ignore,
            on_error: OnError::Ignore,
            on_leaf: OnLeaf::Raise,
            leaf_types: LeafTypes::default(),
            default: Value::Null,
            n_jobs: None,
        }
    }
}

impl PickerOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        PickerOptions::default()
    }

    pub fn on_missing(mut self, policy: OnMissing) -> Self {
        self.on_missing = policy;
        self
    }

    pub fn on_error(mut self, policy: OnError) -> Self {
        self.on_error = policy;
        self
    }

    pub fn on_leaf(mut self, policy: OnLeaf) -> Self {
        self.on_leaf = policy;
        self
    }

    /// Sets the leaf overrides, replacing any previous ones.
    pub fn leaf_types(mut self, types: impl Into<LeafTypes>) -> Self {
        self.leaf_types = types.into();
        self
    }

    /// Sets the filler used for absent keys and failed mapping filters.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Sets the desired parallelism.
    ///
    /// `0` is rejected when the root node is built; a negative `n` means
    /// `cpu_count + 1 + n` workers.
    pub fn n_jobs(mut self, n: i64) -> Self {
        self.n_jobs = Some(n);
        self
    }

    /// Reverts to sequential execution.
    pub fn sequential(mut self) -> Self {
        self.n_jobs = None;
        self
    }

    pub fn get_on_missing(&self) -> OnMissing {
        self.on_missing
    }

    pub fn get_on_error(&self) -> OnError {
        self.on_error
    }

    pub fn get_on_leaf(&self) -> OnLeaf {
        self.on_leaf
    }

    pub fn get_leaf_types(&self) -> &LeafTypes {
        &self.leaf_types
    }

    pub fn get_default(&self) -> &Value {
        &self.default
    }

    pub fn get_n_jobs(&self) -> Option<i64> {
        self.n_jobs
    }
}

/// Plain-data options, deserializable from a configuration document.
///
/// ```
/// use treepick::{OnMissing, PickerOptions, PickerSettings};
///
/// let settings = PickerSettings::from_json(
///     r#"{"on_missing": "raise", "leaf_types": ["object"], "n_jobs": 2}"#,
/// )
/// .unwrap();
/// let options = PickerOptions::try_from(settings).unwrap();
/// assert_eq!(options.get_on_missing(), OnMissing::Raise);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickerSettings {
    pub on_missing: OnMissing,
    pub on_error: OnError,
    pub on_leaf: OnLeaf,
    pub leaf_types: Vec<String>,
    pub default: Value,
    pub n_jobs: Option<i64>,
}

impl PickerSettings {
    /// Reads settings from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| PickerError::config(err.to_string()))
    }
}

impl TryFrom<PickerSettings> for PickerOptions {
    type Error = PickerError;

    fn try_from(settings: PickerSettings) -> Result<Self> {
        resolve_workers(settings.n_jobs)?;
        Ok(PickerOptions {
            on_missing: settings.on_missing,
            on_error: settings.on_error,
            on_leaf: settings.on_leaf,
            leaf_types: LeafTypes::parse(&settings.leaf_types)?,
            default: settings.default,
            n_jobs: settings.n_jobs,
        })
    }
}
