//! Relationship descriptors
//!
//! A [`Relationship`] is a single-use description of how a parent model
//! reaches its related records: the kind, the key pair, and any extra
//! constraints. Descriptors are built fresh by registry factories for every
//! load and never shared between calls.

use std::fmt;

use super::belongs_to_many::PivotConfig;
use super::constraints::Constraint;
use super::morph::{MorphConfig, MorphToConfig};
use super::through::ThroughConfig;
use crate::backends::DatabaseValue;
use crate::error::{ModelError, OrmResult};
use crate::model::ModelMeta;
use crate::query::{OrderDirection, QueryBuilder, QueryOperator};

/// Discriminant of a relationship descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    BelongsTo,
    HasOne,
    HasMany,
    /// Many-to-many through a pivot table
    BelongsToMany,
    MorphOne,
    MorphMany,
    /// Inverse polymorphic relationship
    MorphTo,
    HasOneThrough,
    HasManyThrough,
}

impl RelationshipType {
    /// Returns true if this relationship type is polymorphic
    pub fn is_polymorphic(self) -> bool {
        matches!(self, Self::MorphOne | Self::MorphMany | Self::MorphTo)
    }

    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Self::HasMany | Self::BelongsToMany | Self::MorphMany | Self::HasManyThrough
        )
    }

    /// Returns true if this relationship requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::BelongsToMany)
    }

    pub fn is_through(self) -> bool {
        matches!(self, Self::HasOneThrough | Self::HasManyThrough)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationshipType::BelongsTo => "BelongsTo",
            RelationshipType::HasOne => "HasOne",
            RelationshipType::HasMany => "HasMany",
            RelationshipType::BelongsToMany => "BelongsToMany",
            RelationshipType::MorphOne => "MorphOne",
            RelationshipType::MorphMany => "MorphMany",
            RelationshipType::MorphTo => "MorphTo",
            RelationshipType::HasOneThrough => "HasOneThrough",
            RelationshipType::HasManyThrough => "HasManyThrough",
        };
        f.write_str(name)
    }
}

/// Kind-specific data
#[derive(Debug, Clone)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany(PivotConfig),
    MorphTo(MorphToConfig),
    MorphOne(MorphConfig),
    MorphMany(MorphConfig),
    HasOneThrough(ThroughConfig),
    HasManyThrough(ThroughConfig),
}

/// Data every kind carries
#[derive(Debug, Clone)]
pub struct RelationBase {
    pub(crate) name: String,
    pub(crate) parent: &'static ModelMeta,
    /// Absent only for `MorphTo`, whose target is known per record
    pub(crate) related: Option<&'static ModelMeta>,
    pub(crate) foreign_key: String,
    pub(crate) local_key: String,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) orders: Vec<(String, OrderDirection)>,
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub(crate) base: RelationBase,
    pub(crate) kind: RelationKind,
}

/// Empty means "use the convention"
pub(crate) fn or_convention(explicit: &str, convention: impl FnOnce() -> String) -> String {
    if explicit.is_empty() {
        convention()
    } else {
        explicit.to_string()
    }
}

fn qualify(table: &str, column: &str) -> String {
    if column.contains('.') || column.contains('(') {
        column.to_string()
    } else {
        format!("{}.{}", table, column)
    }
}

impl Relationship {
    pub(crate) fn from_parts(
        kind: RelationKind,
        parent: &'static ModelMeta,
        related: Option<&'static ModelMeta>,
        foreign_key: String,
        local_key: String,
    ) -> Self {
        Self {
            base: RelationBase {
                name: String::new(),
                parent,
                related,
                foreign_key,
                local_key,
                constraints: Vec::new(),
                orders: Vec::new(),
                limit: None,
            },
            kind,
        }
    }

    pub fn relationship_type(&self) -> RelationshipType {
        match &self.kind {
            RelationKind::BelongsTo => RelationshipType::BelongsTo,
            RelationKind::HasOne => RelationshipType::HasOne,
            RelationKind::HasMany => RelationshipType::HasMany,
            RelationKind::BelongsToMany(_) => RelationshipType::BelongsToMany,
            RelationKind::MorphTo(_) => RelationshipType::MorphTo,
            RelationKind::MorphOne(_) => RelationshipType::MorphOne,
            RelationKind::MorphMany(_) => RelationshipType::MorphMany,
            RelationKind::HasOneThrough(_) => RelationshipType::HasOneThrough,
            RelationKind::HasManyThrough(_) => RelationshipType::HasManyThrough,
        }
    }

    pub fn kind(&self) -> &RelationKind {
        &self.kind
    }

    /// Relation name as registered; empty for descriptors built by hand
    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.base.name = name.to_string();
        self
    }

    /// Label for logs and errors
    pub fn describe(&self) -> String {
        let name = if self.base.name.is_empty() {
            self.base.related.map(|m| m.table.as_str()).unwrap_or("morph")
        } else {
            self.base.name.as_str()
        };
        format!("{}.{}", self.base.parent.model_name, name)
    }

    pub fn parent(&self) -> &'static ModelMeta {
        self.base.parent
    }

    pub fn related(&self) -> Option<&'static ModelMeta> {
        self.base.related
    }

    /// Foreign key column. On the parent for `BelongsTo`/`MorphTo`, on the
    /// related table for has-relations, on the pivot for `BelongsToMany`,
    /// and on the through table for through-relations.
    pub fn foreign_key(&self) -> &str {
        &self.base.foreign_key
    }

    /// Local key column. The owner key on the related table for
    /// `BelongsTo`/`MorphTo`, a parent column for every other kind.
    pub fn local_key(&self) -> &str {
        &self.base.local_key
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.base.constraints
    }

    pub fn is_many(&self) -> bool {
        self.relationship_type().is_collection()
    }

    pub fn add_constraint<T: Into<DatabaseValue>>(
        mut self,
        column: &str,
        operator: QueryOperator,
        value: T,
    ) -> Self {
        self.base.constraints.push(Constraint::new(column, operator, value));
        self
    }

    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.add_constraint(column, QueryOperator::Equal, value)
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.base.orders.push((column.to_string(), OrderDirection::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.base.orders.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Cap the rows of the relationship query. Eager loading fetches every
    /// parent's records in one batched query per key chunk, so the cap
    /// applies to each chunk as a whole rather than to each parent. Use
    /// lazy loading for a per-owner limit.
    pub fn limit(mut self, count: i64) -> Self {
        self.base.limit = Some(count);
        self
    }

    pub(crate) fn unsupported(&self) -> ModelError {
        ModelError::UnsupportedRelationshipKind {
            kind: self.relationship_type().to_string(),
            relation: self.describe(),
        }
    }

    pub(crate) fn related_meta(&self) -> OrmResult<&'static ModelMeta> {
        self.base.related.ok_or_else(|| self.unsupported())
    }

    /// Field on the parent whose values drive the batch
    pub fn parent_key_field(&self) -> &str {
        match &self.kind {
            RelationKind::BelongsTo | RelationKind::MorphTo(_) => &self.base.foreign_key,
            RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::BelongsToMany(_)
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_)
            | RelationKind::HasOneThrough(_)
            | RelationKind::HasManyThrough(_) => &self.base.local_key,
        }
    }

    /// Qualified column the batched `IN (...)` filter applies to
    pub fn match_column(&self) -> OrmResult<String> {
        let column = match &self.kind {
            RelationKind::BelongsTo => self.related_meta()?.qualified(&self.base.local_key),
            RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_) => {
                self.related_meta()?.qualified(&self.base.foreign_key)
            }
            RelationKind::BelongsToMany(pivot) => {
                format!("{}.{}", pivot.table, self.base.foreign_key)
            }
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                through.through.qualified(&self.base.foreign_key)
            }
            RelationKind::MorphTo(_) => self.base.local_key.clone(),
        };
        Ok(column)
    }

    /// Result column holding the value that maps a row back to its parent
    pub fn match_alias(&self) -> String {
        match &self.kind {
            RelationKind::BelongsTo | RelationKind::MorphTo(_) => self.base.local_key.clone(),
            RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_) => {
                self.base.foreign_key.clone()
            }
            RelationKind::BelongsToMany(_) => PivotConfig::alias(&self.base.foreign_key),
            RelationKind::HasOneThrough(_) | RelationKind::HasManyThrough(_) => {
                ThroughConfig::KEY_ALIAS.to_string()
            }
        }
    }

    /// Related table with joins, kind filters and constraints; no projection
    fn base_query(&self, names: &TableNames) -> OrmResult<QueryBuilder> {
        let related = self.related_meta()?;
        let mut query = QueryBuilder::for_meta(related);
        if names.related != related.table {
            query = query.alias(&names.related);
        }

        query = match &self.kind {
            RelationKind::BelongsTo | RelationKind::HasOne | RelationKind::HasMany => query,
            RelationKind::MorphOne(morph) | RelationKind::MorphMany(morph) => {
                morph.scope(query, &names.related)
            }
            RelationKind::BelongsToMany(pivot) => {
                let pivot_name = names.intermediate.as_deref().unwrap_or(&pivot.table);
                pivot.join(query, &names.related, pivot_name)
            }
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                let through_name = names.intermediate.as_deref().unwrap_or(&through.through.table);
                through.join(query, &names.related, through_name)
            }
            RelationKind::MorphTo(_) => return Err(self.unsupported()),
        };

        for constraint in &self.base.constraints {
            query = constraint.apply(query, &names.related);
        }
        Ok(query)
    }

    /// Names for the related and pivot/through tables that do not collide
    /// with `outer`, the table a correlated sub-query refers back to
    fn table_names(&self, outer: Option<&str>) -> OrmResult<TableNames> {
        let related = self.related_meta()?;
        let mut taken: Vec<String> = outer.map(str::to_string).into_iter().collect();

        let related_name = unique_name(&related.table, &taken);
        taken.push(related_name.clone());
        let intermediate = match &self.kind {
            RelationKind::BelongsToMany(pivot) => Some(unique_name(&pivot.table, &taken)),
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                Some(unique_name(&through.through.table, &taken))
            }
            _ => None,
        };

        Ok(TableNames {
            related: related_name,
            intermediate,
        })
    }

    /// Scoped query for the related records: joins, constraints, order,
    /// limit and soft-delete scope. No parent keys are bound.
    pub fn get_query(&self) -> OrmResult<QueryBuilder> {
        let related = self.related_meta()?;
        let mut query = self.base_query(&self.table_names(None)?)?;

        query = match &self.kind {
            RelationKind::BelongsToMany(pivot) => {
                query.reselect(pivot.projection(related, &self.base.foreign_key))
            }
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                query.reselect(through.projection(related, &self.base.foreign_key))
            }
            RelationKind::BelongsTo
            | RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_) => query,
            RelationKind::MorphTo(_) => return Err(self.unsupported()),
        };

        for (column, direction) in &self.base.orders {
            query = query.order_by_direction(&qualify(&related.table, column), *direction);
        }
        if let Some(limit) = self.base.limit {
            query = query.limit(limit);
        }
        Ok(query)
    }

    /// Query correlated to rows of `parent_table`, for EXISTS and count
    /// sub-queries. The caller chooses the projection.
    ///
    /// A related table equal to `parent_table` (a model related to itself)
    /// is aliased, e.g. `users AS users_1`, so the correlation still points
    /// at the outer row.
    pub fn existence_query(&self, parent_table: &str) -> OrmResult<QueryBuilder> {
        let names = self.table_names(Some(parent_table))?;
        let query = self.base_query(&names)?;
        let intermediate = names.intermediate.as_deref().unwrap_or_default();

        let (inner, outer) = match &self.kind {
            RelationKind::BelongsTo => (
                qualify(&names.related, &self.base.local_key),
                qualify(parent_table, &self.base.foreign_key),
            ),
            RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_) => (
                qualify(&names.related, &self.base.foreign_key),
                qualify(parent_table, &self.base.local_key),
            ),
            RelationKind::BelongsToMany(_)
            | RelationKind::HasOneThrough(_)
            | RelationKind::HasManyThrough(_) => (
                qualify(intermediate, &self.base.foreign_key),
                qualify(parent_table, &self.base.local_key),
            ),
            RelationKind::MorphTo(_) => return Err(self.unsupported()),
        };

        Ok(query.where_column(&inner, QueryOperator::Equal, &outer))
    }
}

/// Names a relationship query refers to its tables by
struct TableNames {
    related: String,
    intermediate: Option<String>,
}

fn unique_name(table: &str, taken: &[String]) -> String {
    if !taken.iter().any(|name| name == table) {
        return table.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", table, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| table.to_string())
}

/// `table`, or `table AS name` when referenced under another name
pub(crate) fn table_expression(table: &str, name: &str) -> String {
    if table == name {
        table.to_string()
    } else {
        format!("{} AS {}", table, name)
    }
}

pub(crate) fn qualify_column(table: &str, column: &str) -> String {
    qualify(table, column)
}
