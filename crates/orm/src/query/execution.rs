//! Query Builder execution
//!
//! Untyped execution (`get_rows`, `count`, DML) is available on every
//! builder. Typed reads (`get`, `first`, `find`) scan rows into `M` and run
//! the accumulated eager loads.

use chrono::Utc;

use super::builder::QueryBuilder;
use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::{ModelError, OrmResult};
use crate::model::Model;
use crate::scanner;
use crate::session::Session;

impl<M> QueryBuilder<M> {
    /// Execute the query and return raw rows
    pub async fn get_rows(self, session: &Session<'_>) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.require_table()?;
        let (sql, params) = self.to_sql_with_params();
        session.query(&self.target(), &sql, &params).await
    }

    /// Number of rows the query matches, ignoring order and paging
    pub async fn count(self, session: &Session<'_>) -> OrmResult<i64> {
        self.require_table()?;
        let target = self.target();
        let mut query = self.reselect(vec!["COUNT(*) AS aggregate".to_string()]);
        query.order_by.clear();
        query.limit_count = None;
        query.offset_value = None;

        let (sql, params) = query.to_sql_with_params();
        let row = session.query_one(&target, &sql, &params).await?;
        Ok(row
            .and_then(|row| row.get_by_index(0).ok())
            .and_then(|value| value.as_i64())
            .unwrap_or(0))
    }

    pub async fn exists(self, session: &Session<'_>) -> OrmResult<bool> {
        Ok(self.count(session).await? > 0)
    }

    async fn run(self, session: &Session<'_>) -> OrmResult<u64> {
        self.require_table()?;
        let (sql, params) = self.to_sql_with_params();
        session.execute(&self.target(), &sql, &params).await
    }

    /// Insert one row, returning the affected count
    pub async fn insert<I, K>(self, session: &Session<'_>, values: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, DatabaseValue)> + Send,
        K: Into<String>,
    {
        self.into_insert(values).run(session).await
    }

    /// Insert one row and read back `column` (typically the generated key)
    pub async fn insert_returning<I, K>(
        self,
        session: &Session<'_>,
        values: I,
        column: &str,
    ) -> OrmResult<Option<DatabaseValue>>
    where
        I: IntoIterator<Item = (K, DatabaseValue)> + Send,
        K: Into<String>,
    {
        let query = self.into_insert(values).returning(column);
        query.require_table()?;
        let (sql, params) = query.to_sql_with_params();
        let row = session.query_one(&query.target(), &sql, &params).await?;
        Ok(row.and_then(|row| row.get_by_name(column).ok()).filter(|value| !value.is_null()))
    }

    /// Update matching rows. Soft-deleted rows are untouched unless the
    /// trashed mode says otherwise.
    pub async fn update<I, K>(self, session: &Session<'_>, values: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, DatabaseValue)> + Send,
        K: Into<String>,
    {
        self.into_update(values).run(session).await
    }

    /// Soft delete when the table supports it, hard delete otherwise
    pub async fn delete(self, session: &Session<'_>) -> OrmResult<u64> {
        self.into_soft_delete(Utc::now()).run(session).await
    }

    /// Clear the soft-delete marker on matching trashed rows
    pub async fn restore(self, session: &Session<'_>) -> OrmResult<u64> {
        if self.soft_delete_column.is_none() {
            return Err(ModelError::Query(format!(
                "Table '{}' does not use soft deletes",
                self.target()
            )));
        }
        self.into_restore().run(session).await
    }

    /// Remove matching rows, trashed or not
    pub async fn force_delete(self, session: &Session<'_>) -> OrmResult<u64> {
        self.into_force_delete().run(session).await
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Execute the query, scan every row into `M` and run eager loads
    pub async fn get(self, session: &Session<'_>) -> OrmResult<Vec<M>> {
        let eager = self.eager.clone();
        eager.validate(session.context(), M::meta())?;

        let rows = self.get_rows(session).await?;
        let mut models = scanner::scan_rows::<M>(&rows)?;
        drop(rows);

        eager.load(session, &mut models).await?;
        Ok(models)
    }

    pub async fn first(self, session: &Session<'_>) -> OrmResult<Option<M>> {
        Ok(self.limit(1).get(session).await?.into_iter().next())
    }

    pub async fn first_or_fail(self, session: &Session<'_>) -> OrmResult<M> {
        let table = self.target();
        self.first(session).await?.ok_or(ModelError::NotFound(table))
    }

    /// Record by primary key
    pub async fn find<K>(self, session: &Session<'_>, id: K) -> OrmResult<Option<M>>
    where
        K: Into<DatabaseValue> + Send,
    {
        let meta = M::meta();
        self.where_eq(&meta.qualified(&meta.primary_key), id).first(session).await
    }
}
