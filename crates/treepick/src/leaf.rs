//! Leaf nodes.
//!
//! A leaf only unwraps. Indexing one fails under `on_leaf = raise`; under
//! `on_leaf = ignore` it is delegated to the wrapped value's own indexing
//! (string characters, array elements, object keys), whose errors are
//! returned as-is.

use serde_json::Value;

use crate::error::{PickerError, Result};
use crate::index::Index;
use crate::kind::ValueKind;
use crate::options::OnLeaf;
use crate::picker::Picker;

pub(crate) fn extract(picker: &Picker, index: &Index) -> Result<Picker> {
    if picker.options().get_on_leaf() == OnLeaf::Raise {
        return Err(PickerError::Leaf { op: "index" });
    }
    let value = index_value(picker.get(), index)?;
    Ok(picker.make_child(value, picker, None))
}

/// Indexes a plain value the way the value itself supports.
pub(crate) fn index_value(value: &Value, index: &Index) -> Result<Value> {
    match (value, index) {
        (Value::String(s), Index::Position(pos)) => {
            let len = s.chars().count();
            let idx = Index::resolve_position(*pos, len)
                .ok_or_else(|| PickerError::out_of_range(index, len))?;
            Ok(s.chars().nth(idx).map(String::from).unwrap_or_default().into())
        }
        (Value::String(s), Index::Slice(slice)) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice.indices(chars.len())?;
            Ok(picked.into_iter().map(|idx| chars[idx]).collect::<String>().into())
        }
        (Value::Array(items), Index::Position(pos)) => Index::resolve_position(*pos, items.len())
            .map(|idx| items[idx].clone())
            .ok_or_else(|| PickerError::out_of_range(index, items.len())),
        (Value::Array(items), Index::Slice(slice)) => Ok(Value::Array(
            slice
                .indices(items.len())?
                .into_iter()
                .map(|idx| items[idx].clone())
                .collect(),
        )),
        (Value::Object(map), Index::Key(key)) => {
            map.get(key).cloned().ok_or_else(|| PickerError::KeyNotFound {
                key: key.clone(),
            })
        }
        (Value::Object(map), Index::Position(pos)) => {
            let key = pos.to_string();
            map.get(&key)
                .cloned()
                .ok_or(PickerError::KeyNotFound { key })
        }
        _ => Err(PickerError::not_indexable(ValueKind::of(value), index)),
    }
}
