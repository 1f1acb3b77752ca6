//! Model System - traits and metadata for database entities
//!
//! - `core_trait`: the `Model` trait and its object-safe `Record` view
//! - `fields`: static field registries and their lookup index
//! - `meta`: per-type metadata shared by relationships and the eager loader
//! - `naming`: table, foreign key and pivot naming conventions
//! - `state`: per-instance snapshot and loaded relations
//! - `crud_operations`: persistence with lifecycle hooks

pub mod core_trait;
pub mod crud_operations;
pub mod fields;
pub(crate) mod lifecycle;
pub mod meta;
pub mod naming;
pub mod state;

pub use core_trait::{Model, Record};
pub use crud_operations::Persistence;
pub use fields::{FieldDef, FieldIndex, FieldSlot};
pub use meta::ModelMeta;
pub use naming::{foreign_key_for, pivot_table_name, pluralize, table_name_for};
pub use state::ModelState;
