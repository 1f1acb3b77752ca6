//! Per-type model metadata
//!
//! A [`ModelMeta`] is built the first time a model type is used and lives for
//! the rest of the process. Relationship descriptors and the eager loader
//! carry `&'static ModelMeta` instead of type parameters, which lets them
//! work over heterogeneous record sets.

use std::any::TypeId;
use std::fmt;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::core_trait::{Model, Record};
use super::fields::{FieldIndex, FieldSlot};
use crate::backends::DatabaseRow;
use crate::error::OrmResult;
use crate::scanner;

pub type HydrateFn = fn(&dyn DatabaseRow) -> OrmResult<Box<dyn Record>>;

static METADATA: Lazy<DashMap<TypeId, &'static ModelMeta>> = Lazy::new(DashMap::new);

pub struct ModelMeta {
    pub model_name: &'static str,
    pub type_id: TypeId,
    pub table: String,
    pub primary_key: String,
    pub soft_delete_column: Option<String>,
    pub timestamps: bool,
    pub morph_class: String,
    pub fields: FieldIndex,
    hydrate: HydrateFn,
}

fn hydrate_model<M: Model>(row: &dyn DatabaseRow) -> OrmResult<Box<dyn Record>> {
    let model: M = scanner::scan_row(row)?;
    Ok(Box::new(model))
}

impl ModelMeta {
    /// Metadata for `M`, built on first use.
    pub fn of<M: Model>() -> &'static ModelMeta {
        let type_id = TypeId::of::<M>();
        if let Some(meta) = METADATA.get(&type_id).map(|entry| *entry.value()) {
            return meta;
        }

        let built: &'static ModelMeta = Box::leak(Box::new(ModelMeta {
            model_name: M::model_name(),
            type_id,
            table: M::table_name(),
            primary_key: M::primary_key_name().to_string(),
            soft_delete_column: M::uses_soft_deletes().then(|| M::deleted_at_column().to_string()),
            timestamps: M::uses_timestamps(),
            morph_class: M::morph_class(),
            fields: FieldIndex::build(M::fields()),
            hydrate: hydrate_model::<M>,
        }));

        // A racing thread may have inserted first; keep whichever landed.
        let meta = *METADATA.entry(type_id).or_insert(built);
        meta
    }

    pub fn resolve_field(&self, logical: &str) -> Option<&FieldSlot> {
        self.fields.resolve(logical)
    }

    /// `table.column`
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }

    pub fn uses_soft_deletes(&self) -> bool {
        self.soft_delete_column.is_some()
    }

    /// Build a boxed record of this type from a row
    pub fn hydrate(&self, row: &dyn DatabaseRow) -> OrmResult<Box<dyn Record>> {
        (self.hydrate)(row)
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("model_name", &self.model_name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("soft_delete_column", &self.soft_delete_column)
            .field("morph_class", &self.morph_class)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl PartialEq for ModelMeta {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}
