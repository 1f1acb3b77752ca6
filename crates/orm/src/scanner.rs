//! Row to record mapping
//!
//! Columns are matched to model fields through the model's field index.
//! Columns that match nothing (join helpers, aggregates the model does not
//! declare) are dropped. A NULL arriving for a non-nullable field leaves the
//! field at its current value instead of failing deserialization.

use serde_json::Value as JsonValue;
use tracing::trace;

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;

/// Scan one row into a fresh model
pub fn scan_row<M: Model>(row: &dyn DatabaseRow) -> ModelResult<M> {
    let mut model = M::default();
    scan_into(row, &mut model)?;
    Ok(model)
}

/// Scan every row into a fresh model
pub fn scan_rows<M: Model>(rows: &[Box<dyn DatabaseRow>]) -> ModelResult<Vec<M>> {
    rows.iter().map(|row| scan_row::<M>(row.as_ref())).collect()
}

/// Scan a row onto an existing model.
///
/// Loaded relations on `dest` are kept and its persisted snapshot is synced
/// to the scanned values.
pub fn scan_into<M: Model>(row: &dyn DatabaseRow, dest: &mut M) -> ModelResult<()> {
    assign(dest, row.columns())?;
    dest.sync_original()
}

/// Write column values onto a model without touching its snapshot
pub(crate) fn assign<M, I>(dest: &mut M, columns: I) -> ModelResult<()>
where
    M: Model,
    I: IntoIterator<Item = (String, DatabaseValue)>,
{
    let meta = M::meta();
    let mut doc = serde_json::to_value(&*dest)?;
    if !doc.is_object() {
        return Err(ModelError::ScanTarget(meta.model_name.to_string()));
    }

    let mut discarded = Vec::new();
    for (column, value) in columns {
        let Some(slot) = meta.resolve_field(&column) else {
            discarded.push(column);
            continue;
        };
        if value.is_null() && !slot.nullable {
            continue;
        }
        write_path(&mut doc, &slot.path, value.to_json());
    }

    if !discarded.is_empty() {
        trace!(
            "{}: {} unmapped column(s) discarded: {:?}",
            meta.model_name,
            discarded.len(),
            discarded
        );
    }

    let mut scanned: M = serde_json::from_value(doc).map_err(|e| {
        ModelError::Serialization(format!("Failed to scan row into {}: {}", meta.model_name, e))
    })?;

    *scanned.state_mut() = std::mem::take(dest.state_mut());
    *dest = scanned;
    Ok(())
}

fn write_path(doc: &mut JsonValue, path: &[&str], value: JsonValue) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut cursor = doc;
    for key in parents {
        let Some(object) = cursor.as_object_mut() else {
            return;
        };
        let next = object
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(Default::default()));
        if next.is_null() {
            *next = JsonValue::Object(Default::default());
        }
        cursor = next;
    }

    if let Some(object) = cursor.as_object_mut() {
        object.insert(last.to_string(), value);
    }
}
