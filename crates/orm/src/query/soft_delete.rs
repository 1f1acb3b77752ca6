//! Soft-delete visibility
//!
//! Builders scoped to a soft-deleting table carry the table's marker column.
//! The visibility predicate is derived from the mode when the statement is
//! rendered, qualified with the table name so joins stay unambiguous.

use super::builder::QueryBuilder;
use super::types::*;

impl<M> QueryBuilder<M> {
    /// Include soft-deleted rows
    pub fn with_trashed(mut self) -> Self {
        self.trashed = TrashedMode::WithTrashed;
        self
    }

    /// Only soft-deleted rows
    pub fn only_trashed(mut self) -> Self {
        self.trashed = TrashedMode::OnlyTrashed;
        self
    }

    /// Exclude soft-deleted rows (the default)
    pub fn without_trashed(mut self) -> Self {
        self.trashed = TrashedMode::Default;
        self
    }

    pub fn trashed_mode(&self) -> TrashedMode {
        self.trashed
    }

    /// Enable soft-delete scoping on an ad-hoc builder
    pub fn soft_deletes(mut self, column: &str) -> Self {
        self.soft_delete_column = Some(column.to_string());
        self
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete_column.as_deref()
    }

    pub(crate) fn soft_delete_scope(&self) -> Option<Predicate> {
        let column = self.soft_delete_column.as_ref()?;
        let table = self.qualifier()?;
        let qualified = format!("{}.{}", table, column);
        match self.trashed {
            TrashedMode::Default => Some(Predicate::Null {
                column: qualified,
                negated: false,
            }),
            TrashedMode::OnlyTrashed => Some(Predicate::Null {
                column: qualified,
                negated: true,
            }),
            TrashedMode::WithTrashed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> QueryBuilder {
        QueryBuilder::table("posts").soft_deletes("deleted_at")
    }

    #[test]
    fn test_default_excludes_trashed() {
        assert_eq!(posts().to_sql(), "SELECT * FROM posts WHERE posts.deleted_at IS NULL");
    }

    #[test]
    fn test_with_trashed_adds_nothing() {
        assert_eq!(posts().with_trashed().to_sql(), "SELECT * FROM posts");
    }

    #[test]
    fn test_only_trashed() {
        let sql = posts().where_eq("user_id", 1).only_trashed().to_sql();
        assert_eq!(sql, "SELECT * FROM posts WHERE user_id = $1 AND posts.deleted_at IS NOT NULL");
    }

    #[test]
    fn test_scope_follows_table_alias() {
        let sql = posts().alias("posts_1").to_sql();
        assert_eq!(sql, "SELECT * FROM posts AS posts_1 WHERE posts_1.deleted_at IS NULL");
    }

    #[test]
    fn test_tables_without_soft_deletes_are_untouched() {
        let sql = QueryBuilder::<()>::table("tags").only_trashed().to_sql();
        assert_eq!(sql, "SELECT * FROM tags");
    }
}
