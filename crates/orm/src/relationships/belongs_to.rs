//! BelongsTo relationship - the parent row holds the foreign key

use super::types::{or_convention, RelationKind, Relationship};
use crate::model::Model;

impl Relationship {
    /// `P` belongs to `R` through `P.foreign_key = R.owner_key`.
    ///
    /// Empty strings fall back to `R`'s conventional foreign key and primary
    /// key.
    pub fn belongs_to<P: Model, R: Model>(foreign_key: &str, owner_key: &str) -> Self {
        Relationship::from_parts(
            RelationKind::BelongsTo,
            P::meta(),
            Some(R::meta()),
            or_convention(foreign_key, R::foreign_key_name),
            or_convention(owner_key, || R::primary_key_name().to_string()),
        )
    }
}
