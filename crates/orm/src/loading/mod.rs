//! Eager loading
//!
//! - `eager_loader`: the relation-path forest and its entry points
//! - `dispatch`: batched, per-kind loading
//! - `keys`: normalized join keys

pub(crate) mod dispatch;
pub mod eager_loader;
pub mod keys;

pub use eager_loader::{ConstraintFn, EagerLoadNode, EagerLoader};
pub use keys::RelationKey;
