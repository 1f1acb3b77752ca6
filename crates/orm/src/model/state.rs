//! Per-instance bookkeeping carried by every model
//!
//! Models embed a `ModelState` behind `#[serde(skip)]`. It remembers the
//! column values last seen in storage (for dirty tracking) and holds the
//! relations attached by eager or lazy loading. Records reached through a
//! many-to-many relation also keep the pivot row they were joined on.

use crate::backends::DatabaseValue;
use crate::relationships::Relations;

#[derive(Debug, Clone, Default)]
pub struct ModelState {
    pub(crate) relations: Relations,
    original: Option<Vec<(String, DatabaseValue)>>,
    pivot: Option<Vec<(String, DatabaseValue)>>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut Relations {
        &mut self.relations
    }

    /// True once the record has been read from or written to storage
    pub fn is_persisted(&self) -> bool {
        self.original.is_some()
    }

    pub fn original(&self) -> Option<&[(String, DatabaseValue)]> {
        self.original.as_deref()
    }

    pub fn original_value(&self, column: &str) -> Option<&DatabaseValue> {
        self.original
            .as_ref()?
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub(crate) fn sync_original(&mut self, fields: Vec<(String, DatabaseValue)>) {
        self.original = Some(fields);
    }

    pub(crate) fn forget_original(&mut self) {
        self.original = None;
    }

    /// Pivot columns, without their `pivot_` prefix, when loaded through a
    /// many-to-many relation
    pub fn pivot(&self) -> Option<&[(String, DatabaseValue)]> {
        self.pivot.as_deref()
    }

    pub fn pivot_value(&self, column: &str) -> Option<&DatabaseValue> {
        self.pivot
            .as_ref()?
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub(crate) fn set_pivot(&mut self, columns: Vec<(String, DatabaseValue)>) {
        self.pivot = Some(columns);
    }

    /// Columns whose current value differs from the snapshot, in field order.
    /// Without a snapshot every column is dirty.
    pub fn diff(&self, current: Vec<(String, DatabaseValue)>) -> Vec<(String, DatabaseValue)> {
        match &self.original {
            None => current,
            Some(original) => current
                .into_iter()
                .filter(|(column, value)| {
                    original
                        .iter()
                        .find(|(name, _)| name == column)
                        .map_or(true, |(_, before)| before != value)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<(String, DatabaseValue)> {
        vec![
            ("id".to_string(), DatabaseValue::Int32(1)),
            ("title".to_string(), DatabaseValue::String("Draft".into())),
        ]
    }

    #[test]
    fn test_everything_dirty_before_persist() {
        let state = ModelState::new();
        assert!(!state.is_persisted());
        assert_eq!(state.diff(snapshot()).len(), 2);
    }

    #[test]
    fn test_diff_against_snapshot() {
        let mut state = ModelState::new();
        state.sync_original(snapshot());

        let mut current = snapshot();
        current[1].1 = DatabaseValue::String("Published".into());

        let dirty = state.diff(current);
        assert_eq!(dirty, vec![("title".to_string(), DatabaseValue::String("Published".into()))]);
        assert_eq!(state.original_value("id"), Some(&DatabaseValue::Int32(1)));
    }

    #[test]
    fn test_pivot_lookup() {
        let mut state = ModelState::new();
        assert!(state.pivot().is_none());

        state.set_pivot(vec![("role".to_string(), DatabaseValue::String("owner".into()))]);
        assert_eq!(state.pivot_value("role"), Some(&DatabaseValue::String("owner".into())));
        assert_eq!(state.pivot_value("post_id"), None);
    }
}
