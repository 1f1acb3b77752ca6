//! Relationships Module - descriptors, registry and loaded relation storage
//!
//! - `types`: the [`Relationship`] descriptor shared by every kind
//! - `belongs_to`, `has_one`, `has_many`, `belongs_to_many`, `morph`,
//!   `through`: per-kind constructors and query shaping
//! - `registry`: factories keyed by model and relation name
//! - `loaded`: results attached to records
//! - `lazy`: on-demand loading for a single record

pub mod belongs_to;
pub mod belongs_to_many;
pub mod constraints;
pub mod has_many;
pub mod has_one;
pub mod lazy;
pub mod loaded;
pub mod morph;
pub mod registry;
pub mod through;
pub mod types;

pub use belongs_to_many::PivotConfig;
pub use constraints::Constraint;
pub use loaded::{Loaded, Relations};
pub use morph::{MorphConfig, MorphToConfig};
pub use registry::{RelationshipFactory, RelationshipRegistry};
pub use through::ThroughConfig;
pub use types::{RelationBase, RelationKind, Relationship, RelationshipType};
