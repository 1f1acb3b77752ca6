//! # elif-relations: relationship-aware ORM core
//!
//! Models describe their tables through the [`Model`] trait and their
//! associations through [`Relationship`] descriptors registered on an
//! [`OrmContext`]. The [`QueryBuilder`] renders soft-delete-aware SQL, the
//! scanner maps rows onto models, and the [`EagerLoader`] resolves nested
//! relation paths in batched queries instead of one query per record.
//!
//! Statements run against any [`DataStore`] through a [`Session`], which
//! carries cancellation and deadlines for the whole operation.

pub mod backends;
pub mod config;
pub mod context;
pub mod error;
pub mod event_error;
pub mod events;
pub mod loading;
pub mod model;
pub mod observers;
pub mod query;
pub mod relationships;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core traits and types
pub use backends::{
    DataStore, DatabaseRow, DatabaseValue, ExecutedQuery, MockResponse, MockStore, ValueRow,
};
pub use config::OrmConfig;
pub use context::OrmContext;
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use event_error::EventError;
pub use events::{ModelEvent, ModelObserver};
pub use loading::{EagerLoadNode, EagerLoader, RelationKey};
pub use model::{FieldDef, FieldIndex, FieldSlot, Model, ModelMeta, ModelState, Persistence, Record};
pub use observers::{ObserverManager, ObserverRegistry};
pub use query::{OrderDirection, QueryBuilder, QueryOperator, TrashedMode};
pub use relationships::{
    Constraint, Loaded, MorphConfig, MorphToConfig, PivotConfig, RelationKind, Relations,
    Relationship, RelationshipRegistry, RelationshipType, ThroughConfig,
};
pub use scanner::{scan_into, scan_row, scan_rows};
pub use session::Session;

// Cancellation tokens accepted by `Session::with_cancellation`
pub use tokio_util::sync::CancellationToken;
