//! Mapping nodes.

use serde_json::{Map, Value};

use crate::error::{PickerError, Result};
use crate::filter::CompiledFilter;
use crate::flatten::{flatten_value, FlattenOptions};
use crate::index::Index;
use crate::kind::ValueKind;
use crate::options::{OnMissing, PickerOptions};
use crate::picker::Picker;

/// Looks `key` up in `map`, applying the missing-key policy.
///
/// A value that is not an object has no keys at all.
pub(crate) fn lookup(
    map: Option<&Map<String, Value>>,
    key: &str,
    options: &PickerOptions,
) -> Result<Value> {
    match map.and_then(|map| map.get(key)) {
        Some(value) => Ok(value.clone()),
        None if options.get_on_missing() == OnMissing::Raise => Err(PickerError::missing(key)),
        None => Ok(options.get_default().clone()),
    }
}

/// Builds one row from `keys`, in key order.
pub(crate) fn row(
    map: Option<&Map<String, Value>>,
    keys: &[String],
    options: &PickerOptions,
) -> Result<Value> {
    keys.iter()
        .map(|key| lookup(map, key, options))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

pub(crate) fn extract(picker: &Picker, index: &Index) -> Result<Picker> {
    let map = picker.map()?;
    let options = picker.options();
    let value = match index {
        Index::Key(key) => lookup(Some(map), key, options)?,
        Index::Position(pos) => lookup(Some(map), &pos.to_string(), options)?,
        Index::Keys(keys) => row(Some(map), keys, options)?,
        Index::Slice(_) => return Err(PickerError::not_indexable(ValueKind::Object, index)),
    };
    Ok(picker.make_child(value, picker, None))
}

/// The mapping itself when it passes, the configured default otherwise.
pub(crate) fn filter(picker: &Picker, filter: &CompiledFilter) -> Result<Picker> {
    let options = picker.options();
    if filter.matches(picker.get(), options)? {
        Ok(picker.make_child(picker.shared_value(), picker, None))
    } else {
        Ok(picker.make_child(options.get_default().clone(), picker, None))
    }
}

pub(crate) fn flatten(picker: &Picker, options: &FlattenOptions) -> Result<Picker> {
    let flat = flatten_value(picker.get(), options, picker.options().get_leaf_types());
    Ok(picker.make_child(Value::Object(flat), picker, None))
}
