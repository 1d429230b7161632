//! Iterable nodes.
//!
//! Positions and slices index the sequence itself. Keys are broadcast: the
//! same lookup runs against every child and the results form a new sequence.
//! Broadcasts, filters and flattens go through the tree's [`Executor`], so
//! their output order never depends on the worker count.
//!
//! [`Executor`]: crate::executor::Executor

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{PickerError, Result};
use crate::filter::CompiledFilter;
use crate::flatten::{flatten_value, FlattenOptions};
use crate::index::{Index, Slice};
use crate::kind::{classify, NodeKind, ValueKind};
use crate::mapping::{lookup, row};
use crate::options::OnMissing;
use crate::picker::Picker;

pub(crate) fn extract(picker: &Picker, index: &Index, propagate: Option<bool>) -> Result<Picker> {
    let items = picker.seq()?;
    if items.is_empty() {
        return match picker.options().get_on_missing() {
            OnMissing::Ignore => Ok(picker.make_child(Value::Array(Vec::new()), picker, None)),
            OnMissing::Raise => Err(PickerError::out_of_range(index, 0)),
        };
    }

    match (propagate, index) {
        (Some(true), _) => grandchildren(picker, index),
        (_, Index::Position(pos)) => position(picker, items, index, *pos),
        (_, Index::Slice(slice)) => sliced(picker, items, slice),
        (None, Index::Key(_) | Index::Keys(_)) => broadcast(picker, index),
        (Some(false), _) => Err(PickerError::not_indexable(ValueKind::Array, index)),
    }
}

fn position(picker: &Picker, items: &[Value], index: &Index, pos: isize) -> Result<Picker> {
    let idx = Index::resolve_position(pos, items.len())
        .ok_or_else(|| PickerError::out_of_range(index, items.len()))?;
    let parent = picker
        .tracked_parents()
        .and_then(|parents| parents.get(idx))
        .unwrap_or(picker);
    Ok(picker.make_child(items[idx].clone(), parent, None))
}

fn sliced(picker: &Picker, items: &[Value], slice: &Slice) -> Result<Picker> {
    let picked = slice.indices(items.len())?;
    let parents = picker.tracked_parents().and_then(|parents| {
        picked
            .iter()
            .map(|&idx| parents.get(idx).cloned())
            .collect::<Option<Arc<[Picker]>>>()
    });
    let values = picked.iter().map(|&idx| items[idx].clone()).collect();
    Ok(picker.make_child(Value::Array(values), picker, parents))
}

fn broadcast(picker: &Picker, index: &Index) -> Result<Picker> {
    let options = picker.options();
    let rows: Vec<Value> = picker.config().executor.map_chunks(picker.seq()?, |chunk| {
        chunk
            .iter()
            .map(|item| match index {
                Index::Keys(keys) => row(item.as_object(), keys, options),
                Index::Key(key) => lookup(item.as_object(), key, options),
                _ => Err(PickerError::not_indexable(ValueKind::Array, index)),
            })
            .collect()
    })?;
    Ok(picker.make_child(Value::Array(rows), picker, picker.tracked_parents().cloned()))
}

// Each child becomes a node of its own, gets indexed as such, and is recorded
// as the parent of its result.
fn grandchildren(picker: &Picker, index: &Index) -> Result<Picker> {
    let parents: Vec<Picker> = picker
        .seq()?
        .iter()
        .map(|item| picker.make_child(item.clone(), picker, None))
        .collect();

    let values: Vec<Value> = picker.config().executor.map_chunks(&parents, |chunk| {
        chunk
            .iter()
            .map(|parent| parent.extract(index.clone()).map(|child| child.to_value()))
            .collect()
    })?;

    Ok(picker.make_child(Value::Array(values), picker, Some(parents.into())))
}

/// Keeps the children that pass, in order.
pub(crate) fn filter(picker: &Picker, filter: &CompiledFilter) -> Result<Picker> {
    let options = picker.options();
    let kept = picker.config().executor.map_chunks(picker.seq()?, |chunk| {
        let mut kept = Vec::with_capacity(chunk.len());
        for item in chunk {
            if filter.matches(item, options)? {
                kept.push(item.clone());
            }
        }
        Ok(kept)
    })?;
    Ok(picker.make_child(Value::Array(kept), picker, None))
}

/// Flattens every mapping child; other children pass through unchanged.
pub(crate) fn flatten(picker: &Picker, options: &FlattenOptions) -> Result<Picker> {
    let leaf_types = picker.options().get_leaf_types();
    let flats: Vec<Value> = picker.config().executor.map_chunks(picker.seq()?, |chunk| {
        Ok(chunk
            .iter()
            .map(|item| match classify(item, leaf_types) {
                NodeKind::Mapping => Value::Object(flatten_value(item, options, leaf_types)),
                _ => item.clone(),
            })
            .collect())
    })?;
    Ok(picker.make_child(Value::Array(flats), picker, picker.tracked_parents().cloned()))
}

/// Sorted keys shared by every mapping child among the first `peek`
/// children. Children that are not mappings are skipped.
pub(crate) fn keys(picker: &Picker, peek: Option<usize>) -> Result<Vec<String>> {
    let items = picker.seq()?;
    let preview = &items[..peek.map_or(items.len(), |n| n.min(items.len()))];
    let leaf_types = picker.options().get_leaf_types();

    let mut shared: Option<BTreeSet<String>> = None;
    for map in preview
        .iter()
        .filter(|item| classify(item, leaf_types) == NodeKind::Mapping)
        .filter_map(Value::as_object)
    {
        shared = Some(match shared {
            None => map.keys().cloned().collect(),
            Some(keys) => keys.into_iter().filter(|k| map.contains_key(k)).collect(),
        });
    }
    Ok(shared.map(|keys| keys.into_iter().collect()).unwrap_or_default())
}

pub(crate) fn children(picker: &Picker) -> Result<Vec<Picker>> {
    let parents = picker.tracked_parents();
    Ok(picker
        .seq()?
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let parent = parents.and_then(|p| p.get(idx)).unwrap_or(picker);
            picker.make_child(item.clone(), parent, None)
        })
        .collect())
}
