//! BelongsToMany relationship - many-to-many through a pivot table

use super::types::{or_convention, table_expression, RelationKind, Relationship};
use crate::model::{naming, Model, ModelMeta};
use crate::query::QueryBuilder;

/// Pivot table layout.
///
/// The parent side of the pivot (`foreign_pivot_key`) lives on the
/// relationship's `foreign_key`; the parent column it points at is the
/// relationship's `local_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotConfig {
    pub table: String,
    /// Pivot column pointing at the related table
    pub related_pivot_key: String,
    /// Related column the pivot points at
    pub related_key: String,
    /// Extra pivot columns surfaced as `pivot_<column>`
    pub pivot_columns: Vec<String>,
    pub timestamps: bool,
}

impl PivotConfig {
    pub(crate) const PREFIX: &'static str = "pivot_";

    pub(crate) fn alias(column: &str) -> String {
        format!("{}{}", Self::PREFIX, column)
    }

    /// Join the pivot, referenced as `pivot`, onto the related table
    /// referenced as `related`
    pub(crate) fn join(&self, query: QueryBuilder, related: &str, pivot: &str) -> QueryBuilder {
        query.join(
            &table_expression(&self.table, pivot),
            &format!("{}.{}", pivot, self.related_pivot_key),
            &format!("{}.{}", related, self.related_key),
        )
    }

    pub(crate) fn projection(&self, related: &ModelMeta, foreign_pivot_key: &str) -> Vec<String> {
        let mut columns = vec![format!("{}.*", related.table)];
        let mut extra: Vec<&str> = vec![foreign_pivot_key, &self.related_pivot_key];
        extra.extend(self.pivot_columns.iter().map(String::as_str));
        if self.timestamps {
            extra.extend(["created_at", "updated_at"]);
        }

        let mut seen = Vec::new();
        for column in extra {
            if seen.contains(&column) {
                continue;
            }
            seen.push(column);
            columns.push(format!("{}.{} AS {}", self.table, column, Self::alias(column)));
        }
        columns
    }
}

impl Relationship {
    /// `P` belongs to many `R` through `table`.
    ///
    /// Defaults: pivot table named from both models, `P`'s foreign key for
    /// the parent side and `R`'s for the related side.
    pub fn belongs_to_many<P: Model, R: Model>(
        table: &str,
        foreign_pivot_key: &str,
        related_pivot_key: &str,
    ) -> Self {
        let pivot = PivotConfig {
            table: or_convention(table, || {
                naming::pivot_table_name(P::model_name(), R::model_name())
            }),
            related_pivot_key: or_convention(related_pivot_key, R::foreign_key_name),
            related_key: R::primary_key_name().to_string(),
            pivot_columns: Vec::new(),
            timestamps: false,
        };

        Relationship::from_parts(
            RelationKind::BelongsToMany(pivot),
            P::meta(),
            Some(R::meta()),
            or_convention(foreign_pivot_key, P::foreign_key_name),
            P::primary_key_name().to_string(),
        )
    }

    pub fn pivot(&self) -> Option<&PivotConfig> {
        match &self.kind {
            RelationKind::BelongsToMany(pivot) => Some(pivot),
            _ => None,
        }
    }

    fn pivot_mut(&mut self) -> Option<&mut PivotConfig> {
        match &mut self.kind {
            RelationKind::BelongsToMany(pivot) => Some(pivot),
            _ => None,
        }
    }

    /// Surface extra pivot columns on the related records. No effect on
    /// other kinds.
    pub fn with_pivot(mut self, columns: &[&str]) -> Self {
        if let Some(pivot) = self.pivot_mut() {
            pivot.pivot_columns.extend(columns.iter().map(|c| c.to_string()));
        }
        self
    }

    /// Surface the pivot's `created_at`/`updated_at`
    pub fn with_timestamps(mut self) -> Self {
        if let Some(pivot) = self.pivot_mut() {
            pivot.timestamps = true;
        }
        self
    }

    /// Parent column the pivot's parent side points at
    pub fn parent_key(mut self, column: &str) -> Self {
        if self.pivot().is_some() {
            self.base.local_key = column.to_string();
        }
        self
    }

    /// Related column the pivot's related side points at
    pub fn related_key(mut self, column: &str) -> Self {
        if let Some(pivot) = self.pivot_mut() {
            pivot.related_key = column.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::relationships::{Relationship, RelationshipType};
    use crate::testing::{Post, Tag};

    #[test]
    fn test_conventions() {
        let rel = Relationship::belongs_to_many::<Post, Tag>("", "", "");
        let pivot = rel.pivot().unwrap();
        assert_eq!(rel.relationship_type(), RelationshipType::BelongsToMany);
        assert_eq!(pivot.table, "post_tag");
        assert_eq!(rel.foreign_key(), "post_id");
        assert_eq!(pivot.related_pivot_key, "tag_id");
        assert_eq!(rel.match_column().unwrap(), "post_tag.post_id");
        assert_eq!(rel.match_alias(), "pivot_post_id");
        assert!(rel.is_many());
    }

    #[test]
    fn test_get_query_joins_pivot_and_aliases_columns() {
        let sql = Relationship::belongs_to_many::<Post, Tag>("", "", "")
            .with_pivot(&["role"])
            .get_query()
            .unwrap()
            .to_sql();

        assert_eq!(
            sql,
            "SELECT tags.*, post_tag.post_id AS pivot_post_id, post_tag.tag_id AS pivot_tag_id, \
             post_tag.role AS pivot_role FROM tags INNER JOIN post_tag ON post_tag.tag_id = tags.id"
        );
    }

    #[test]
    fn test_timestamps_and_custom_keys() {
        let rel = Relationship::belongs_to_many::<Post, Tag>("taggings", "article_id", "label_id")
            .with_timestamps()
            .parent_key("uuid")
            .related_key("slug");

        let sql = rel.get_query().unwrap().to_sql();
        assert!(sql.contains("taggings.created_at AS pivot_created_at"));
        assert!(sql.contains("INNER JOIN taggings ON taggings.label_id = tags.slug"));
        assert_eq!(rel.parent_key_field(), "uuid");

        let exists = rel.existence_query("posts").unwrap().select_raw("1").to_sql();
        assert!(exists.ends_with("WHERE taggings.article_id = posts.uuid"));
    }
}
