//! Polymorphic relationships
//!
//! A morph pair is a `<name>_type` discriminator plus a `<name>_id` key on
//! the same row. `MorphOne`/`MorphMany` read it from the related side,
//! `MorphTo` from the parent side and resolves the type per record.

use super::types::{or_convention, RelationKind, Relationship};
use crate::model::{naming, Model};
use crate::query::QueryBuilder;

/// Related-side discriminator for `MorphOne`/`MorphMany`
#[derive(Debug, Clone, PartialEq)]
pub struct MorphConfig {
    pub type_column: String,
    /// Discriminator value identifying the parent type
    pub morph_class: String,
}

impl MorphConfig {
    pub(crate) fn scope(&self, query: QueryBuilder, related: &str) -> QueryBuilder {
        let column = format!("{}.{}", related, self.type_column);
        query.where_eq(&column, self.morph_class.as_str())
    }
}

/// Parent-side discriminator for `MorphTo`
#[derive(Debug, Clone, PartialEq)]
pub struct MorphToConfig {
    /// Field on the parent holding the target's morph class
    pub type_column: String,
}

fn morph_children<P: Model, R: Model>(
    name: &str,
    type_column: &str,
    id_column: &str,
    local_key: &str,
    many: bool,
) -> Relationship {
    let (default_type, default_id) = naming::morph_columns(name);
    let morph = MorphConfig {
        type_column: or_convention(type_column, || default_type),
        morph_class: P::morph_class(),
    };
    let kind = if many {
        RelationKind::MorphMany(morph)
    } else {
        RelationKind::MorphOne(morph)
    };

    Relationship::from_parts(
        kind,
        P::meta(),
        Some(R::meta()),
        or_convention(id_column, || default_id),
        or_convention(local_key, || P::primary_key_name().to_string()),
    )
}

impl Relationship {
    /// `P` has one `R` whose `<name>_type`/`<name>_id` point back at it
    pub fn morph_one<P: Model, R: Model>(
        name: &str,
        type_column: &str,
        id_column: &str,
        local_key: &str,
    ) -> Self {
        morph_children::<P, R>(name, type_column, id_column, local_key, false)
    }

    /// `P` has many `R` whose `<name>_type`/`<name>_id` point back at it
    pub fn morph_many<P: Model, R: Model>(
        name: &str,
        type_column: &str,
        id_column: &str,
        local_key: &str,
    ) -> Self {
        morph_children::<P, R>(name, type_column, id_column, local_key, true)
    }

    /// `P` points at a record of any registered morph type.
    ///
    /// The target's owner key defaults to `id`.
    pub fn morph_to<P: Model>(
        name: &str,
        type_column: &str,
        id_column: &str,
        owner_key: &str,
    ) -> Self {
        let (default_type, default_id) = naming::morph_columns(name);
        Relationship::from_parts(
            RelationKind::MorphTo(MorphToConfig {
                type_column: or_convention(type_column, || default_type),
            }),
            P::meta(),
            None,
            or_convention(id_column, || default_id),
            or_convention(owner_key, || "id".to_string()),
        )
    }

    /// Discriminator column of a polymorphic relationship
    pub fn morph_type_column(&self) -> Option<&str> {
        match &self.kind {
            RelationKind::MorphOne(morph) | RelationKind::MorphMany(morph) => {
                Some(&morph.type_column)
            }
            RelationKind::MorphTo(config) => Some(&config.type_column),
            _ => None,
        }
    }
}
