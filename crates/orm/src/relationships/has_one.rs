//! HasOne relationship - the related row holds the foreign key

use super::types::{or_convention, RelationKind, Relationship};
use crate::model::Model;

impl Relationship {
    /// `P` has one `R` through `R.foreign_key = P.local_key`.
    pub fn has_one<P: Model, R: Model>(foreign_key: &str, local_key: &str) -> Self {
        Relationship::from_parts(
            RelationKind::HasOne,
            P::meta(),
            Some(R::meta()),
            or_convention(foreign_key, P::foreign_key_name),
            or_convention(local_key, || P::primary_key_name().to_string()),
        )
    }
}
