//! Treepick - fluent traversal of nested JSON-like trees.
//!
//! Treepick wraps a [`serde_json::Value`] in a [`Picker`] and lets you walk
//! it without unpacking every level by hand. It supports:
//!
//! - Key, position and slice lookups, with keys broadcast across sequences
//! - Multi-key extraction into rows for tabular consumers
//! - Field filters with glob, regex, function and equality predicates
//! - Flattening nested trees into single-level path maps
//! - Order-preserving parallel execution over large sequences
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use treepick::{Filter, Picker, PickerOptions};
//!
//! let data = json!([
//!     {"id": 1, "city": "Amsterdam", "monthlyAvg": [{"high": 7}, {"high": 6}]},
//!     {"id": 2, "city": "Berlin", "monthlyAvg": [{"high": 3}, {"high": 4}]},
//!     {"id": 3, "city": "Athens", "monthlyAvg": [{"high": 13}, {"high": 14}]},
//! ]);
//!
//! let picker = Picker::with_options(data, PickerOptions::new().n_jobs(2)).unwrap();
//!
//! // Rows of selected fields
//! let rows = picker
//!     .filter(&Filter::new().field("city", "A*"))
//!     .unwrap()
//!     .extract(["id", "city"])
//!     .unwrap();
//! assert_eq!(rows.get(), &json!([[1, "Amsterdam"], [3, "Athens"]]));
//!
//! // One level deeper than a broadcast
//! let highs = picker
//!     .extract("monthlyAvg")
//!     .unwrap()
//!     .extract_with("high", true)
//!     .unwrap();
//! assert_eq!(highs.get(), &json!([[7, 6], [3, 4], [13, 14]]));
//!
//! // Single-level path maps
//! let flat = picker.extract(0).unwrap().flatten().unwrap();
//! assert_eq!(flat.get()["monthlyAvg_1_high"], json!(6));
//! ```
//!
//! # Node Kinds
//!
//! Every node is classified once, when it is created:
//!
//! | Kind | Value | Indexing |
//! |------|-------|----------|
//! | Mapping | object | key, decimal position, key list (row) |
//! | Iterable | array | position, slice; keys are broadcast to every child |
//! | Leaf | anything else | only under `on_leaf = ignore` |
//!
//! [`LeafTypes`] forces values to be leaves, by kind or by function.
//!
//! # Policies
//!
//! - `on_missing`: absent keys yield the configured default (`ignore`) or
//!   fail with [`PickerError::MissingField`] (`raise`).
//! - `on_error`: a failing predicate counts as no match (`ignore`) or fails
//!   the filter (`raise`). Malformed regexes always fail.
//! - `on_leaf`: indexing a leaf fails (`raise`) or indexes the wrapped value
//!   directly (`ignore`).

mod error;
mod executor;
mod filter;
mod flatten;
mod index;
mod iterable;
mod kind;
mod leaf;
mod mapping;
mod number;
mod options;
mod picker;
mod predicate;

// Re-export public API
pub use error::{PickerError, Result};
pub use executor::{chunk_bounds, resolve_workers, Executor};
pub use filter::{Filter, How};
pub use flatten::{FlattenOptions, DEFAULT_MAX_DEPTH};
pub use index::{Index, Slice};
pub use kind::{classify, NodeKind, ValueKind};
pub use options::{
    LeafFn, LeafType, LeafTypes, OnError, OnLeaf, OnMissing, PickerOptions, PickerSettings,
};
pub use picker::{Picker, DEFAULT_PEEK};
pub use predicate::{Pattern, Predicate, PredicateFn};
