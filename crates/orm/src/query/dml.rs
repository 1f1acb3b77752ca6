//! Query Builder DML operations (INSERT, UPDATE, DELETE)
//!
//! The `into_*` methods turn a builder into a write statement. Predicates and
//! soft-delete mode already on the builder scope the write.

use chrono::{DateTime, Utc};

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    /// Set a column value (for INSERT/UPDATE)
    pub fn set<T: Into<DatabaseValue>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set multiple values at once
    pub fn set_values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, DatabaseValue)>,
        K: Into<String>,
    {
        self.set_clauses.extend(values.into_iter().map(|(column, value)| SetClause {
            column: column.into(),
            value,
        }));
        self
    }

    /// Columns returned by INSERT/UPDATE
    pub fn returning(mut self, column: &str) -> Self {
        self.returning.push(column.to_string());
        self
    }

    pub fn into_insert<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, DatabaseValue)>,
        K: Into<String>,
    {
        self.query_type = QueryType::Insert;
        self.set_values(values)
    }

    pub fn into_update<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, DatabaseValue)>,
        K: Into<String>,
    {
        self.query_type = QueryType::Update;
        self.set_values(values)
    }

    /// Hard DELETE regardless of soft-delete support
    pub fn into_delete(mut self) -> Self {
        self.query_type = QueryType::Delete;
        self
    }

    /// Soft delete when the table supports it, hard DELETE otherwise
    pub fn into_soft_delete(self, at: DateTime<Utc>) -> Self {
        match self.soft_delete_column.clone() {
            Some(column) => self.into_update([(column, DatabaseValue::DateTime(at))]),
            None => self.into_delete(),
        }
    }

    /// Clear the deleted marker on trashed rows
    pub fn into_restore(self) -> Self {
        let column = self.soft_delete_column.clone().unwrap_or_default();
        self.only_trashed().into_update([(column, DatabaseValue::Null)])
    }

    /// Hard DELETE that also reaches trashed rows
    pub fn into_force_delete(self) -> Self {
        self.with_trashed().into_delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> QueryBuilder {
        QueryBuilder::table("posts").soft_deletes("deleted_at")
    }

    #[test]
    fn test_insert_returning() {
        let (sql, params) = QueryBuilder::<()>::table("posts")
            .into_insert([("title", DatabaseValue::from("Hi")), ("body", DatabaseValue::Null)])
            .returning("id")
            .to_sql_with_params();

        assert_eq!(sql, "INSERT INTO posts (title, body) VALUES ($1, NULL) RETURNING id");
        assert_eq!(params, vec![DatabaseValue::String("Hi".into())]);
    }

    #[test]
    fn test_update_respects_soft_delete_scope() {
        let sql = posts()
            .where_eq("posts.id", 3)
            .into_update([("title", DatabaseValue::from("New"))])
            .to_sql();
        assert_eq!(
            sql,
            "UPDATE posts SET title = $1 WHERE posts.id = $2 AND posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let now = Utc::now();
        let (sql, params) = posts()
            .where_eq("posts.id", 3)
            .into_soft_delete(now)
            .to_sql_with_params();
        assert_eq!(
            sql,
            "UPDATE posts SET deleted_at = $1 WHERE posts.id = $2 AND posts.deleted_at IS NULL"
        );
        assert_eq!(params[0], DatabaseValue::DateTime(now));

        let sql = posts().where_eq("posts.id", 3).into_restore().to_sql();
        assert_eq!(
            sql,
            "UPDATE posts SET deleted_at = NULL WHERE posts.id = $1 \
             AND posts.deleted_at IS NOT NULL"
        );
    }

    #[test]
    fn test_delete_without_soft_delete_is_hard() {
        let sql = QueryBuilder::<()>::table("tags")
            .where_eq("id", 1)
            .into_soft_delete(Utc::now())
            .to_sql();
        assert_eq!(sql, "DELETE FROM tags WHERE id = $1");
    }

    #[test]
    fn test_force_delete_reaches_trashed_rows() {
        let sql = posts().where_eq("posts.id", 3).into_force_delete().to_sql();
        assert_eq!(sql, "DELETE FROM posts WHERE posts.id = $1");
    }
}
