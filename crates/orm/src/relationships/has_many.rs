//! HasMany relationship - one parent, many related rows

use super::types::{or_convention, RelationKind, Relationship};
use crate::model::Model;

impl Relationship {
    /// `P` has many `R` through `R.foreign_key = P.local_key`.
    pub fn has_many<P: Model, R: Model>(foreign_key: &str, local_key: &str) -> Self {
        Relationship::from_parts(
            RelationKind::HasMany,
            P::meta(),
            Some(R::meta()),
            or_convention(foreign_key, P::foreign_key_name),
            or_convention(local_key, || P::primary_key_name().to_string()),
        )
    }
}
