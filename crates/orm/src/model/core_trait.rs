//! Core Model Trait - Base definition for database entities
//!
//! `Model` is the static capability set an application type implements.
//! `Record` is its object-safe face, used wherever records of different types
//! travel together (eager loading, loaded relations).

use std::any::Any;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::fields::FieldDef;
use super::meta::ModelMeta;
use super::naming;
use super::state::ModelState;
use crate::backends::DatabaseValue;
use crate::error::ModelResult;
use crate::query::QueryBuilder;
use crate::relationships::Relations;

/// Core trait for database models
///
/// Implementors keep a `ModelState` field marked `#[serde(skip)]` and expose
/// it through [`state`](Model::state) / [`state_mut`](Model::state_mut).
pub trait Model: Send + Sync + Debug + Default + Serialize + DeserializeOwned + 'static {
    /// Logical model name, e.g. `"Post"`. Drives naming conventions and
    /// relationship registration.
    fn model_name() -> &'static str;

    /// Static registry of persisted fields
    fn fields() -> &'static [FieldDef];

    fn state(&self) -> &ModelState;

    fn state_mut(&mut self) -> &mut ModelState;

    /// Table name for this model
    fn table_name() -> String {
        naming::table_name_for(Self::model_name())
    }

    /// Primary key column
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Foreign key other tables use to point at this model
    fn foreign_key_name() -> String {
        naming::foreign_key_for(Self::model_name())
    }

    /// Check if this model uses timestamps (created_at, updated_at)
    fn uses_timestamps() -> bool {
        false
    }

    /// Check if this model supports soft deletes
    fn uses_soft_deletes() -> bool {
        false
    }

    fn deleted_at_column() -> &'static str {
        "deleted_at"
    }

    /// Value stored in polymorphic type columns pointing at this model
    fn morph_class() -> String {
        Self::model_name().to_string()
    }

    fn meta() -> &'static ModelMeta {
        ModelMeta::of::<Self>()
    }

    /// Start a query against this model's table
    fn query() -> QueryBuilder<Self> {
        QueryBuilder::for_model()
    }

    /// Value of a field by logical name.
    ///
    /// `None` when the model has no such field; `Some(DatabaseValue::Null)`
    /// when the field exists but holds nothing.
    fn get_key_value(&self, field: &str) -> Option<DatabaseValue> {
        let slot = Self::meta().resolve_field(field)?;
        let doc = serde_json::to_value(self).ok()?;
        Some(value_at(&doc, &slot.path))
    }

    /// Primary key value, absent until persisted
    fn primary_key(&self) -> Option<DatabaseValue> {
        self.get_key_value(Self::primary_key_name())
            .filter(|value| !value.is_null())
    }

    /// Column/value pairs in field declaration order
    fn to_fields(&self) -> ModelResult<Vec<(String, DatabaseValue)>> {
        let doc = serde_json::to_value(self)?;
        Ok(Self::meta()
            .fields
            .slots()
            .iter()
            .map(|slot| (slot.column.to_string(), value_at(&doc, &slot.path)))
            .collect())
    }

    /// Columns changed since the last sync with storage
    fn get_dirty(&self) -> ModelResult<Vec<(String, DatabaseValue)>> {
        Ok(self.state().diff(self.to_fields()?))
    }

    fn is_dirty(&self) -> ModelResult<bool> {
        Ok(!self.get_dirty()?.is_empty())
    }

    /// Record the current field values as the persisted snapshot
    fn sync_original(&mut self) -> ModelResult<()> {
        let fields = self.to_fields()?;
        self.state_mut().sync_original(fields);
        Ok(())
    }

    /// Get deleted_at timestamp if available (for soft deletes)
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        if !Self::uses_soft_deletes() {
            return None;
        }
        self.get_key_value(Self::deleted_at_column())?.as_datetime()
    }

    /// Check if this model instance is soft deleted
    fn is_soft_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

pub(crate) fn value_at(doc: &JsonValue, path: &[&str]) -> DatabaseValue {
    let mut cursor = doc;
    for key in path {
        match cursor.get(key) {
            Some(next) => cursor = next,
            None => return DatabaseValue::Null,
        }
    }
    DatabaseValue::from_json(cursor.clone())
}

/// Object-safe view of a model instance
pub trait Record: Any + Send + Sync + Debug {
    fn model_meta(&self) -> &'static ModelMeta;

    /// See [`Model::get_key_value`]
    fn key_value(&self, field: &str) -> Option<DatabaseValue>;

    fn relations(&self) -> &Relations;

    fn relations_mut(&mut self) -> &mut Relations;

    /// See [`ModelState::pivot`]
    fn pivot(&self) -> Option<&[(String, DatabaseValue)]>;

    fn set_pivot(&mut self, columns: Vec<(String, DatabaseValue)>);

    fn to_json(&self) -> ModelResult<JsonValue>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: Model> Record for M {
    fn model_meta(&self) -> &'static ModelMeta {
        M::meta()
    }

    fn key_value(&self, field: &str) -> Option<DatabaseValue> {
        self.get_key_value(field)
    }

    fn relations(&self) -> &Relations {
        self.state().relations()
    }

    fn relations_mut(&mut self) -> &mut Relations {
        self.state_mut().relations_mut()
    }

    fn pivot(&self) -> Option<&[(String, DatabaseValue)]> {
        self.state().pivot()
    }

    fn set_pivot(&mut self, columns: Vec<(String, DatabaseValue)>) {
        self.state_mut().set_pivot(columns);
    }

    fn to_json(&self) -> ModelResult<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Record {
    pub fn is<M: Model>(&self) -> bool {
        self.as_any().is::<M>()
    }

    pub fn downcast_ref<M: Model>(&self) -> Option<&M> {
        self.as_any().downcast_ref::<M>()
    }

    pub fn downcast_mut<M: Model>(&mut self) -> Option<&mut M> {
        self.as_any_mut().downcast_mut::<M>()
    }
}
