//! Query Builder - Core builder implementation

use std::marker::PhantomData;

use super::types::*;
use crate::error::{ModelError, OrmResult};
use crate::loading::EagerLoader;
use crate::model::{Model, ModelMeta};

/// Query builder for constructing database queries
///
/// Untyped builders (`QueryBuilder<()>`) are what relationship descriptors and
/// constraint callbacks work with; `QueryBuilder<M>` adds typed execution.
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) query_type: QueryType,
    pub(crate) table: Option<String>,
    pub(crate) table_alias: Option<String>,
    pub(crate) select_fields: Vec<String>,
    pub(crate) count_subqueries: Vec<(QueryBuilder, String)>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having_conditions: Vec<Predicate>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
    pub(crate) returning: Vec<String>,
    pub(crate) soft_delete_column: Option<String>,
    pub(crate) trashed: TrashedMode,
    pub(crate) eager: EagerLoader,
    _phantom: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            query_type: self.query_type,
            table: self.table.clone(),
            table_alias: self.table_alias.clone(),
            select_fields: self.select_fields.clone(),
            count_subqueries: self.count_subqueries.clone(),
            set_clauses: self.set_clauses.clone(),
            predicates: self.predicates.clone(),
            joins: self.joins.clone(),
            order_by: self.order_by.clone(),
            group_by: self.group_by.clone(),
            having_conditions: self.having_conditions.clone(),
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            returning: self.returning.clone(),
            soft_delete_column: self.soft_delete_column.clone(),
            trashed: self.trashed,
            eager: self.eager.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            table: None,
            table_alias: None,
            select_fields: Vec::new(),
            count_subqueries: Vec::new(),
            set_clauses: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having_conditions: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            returning: Vec::new(),
            soft_delete_column: None,
            trashed: TrashedMode::Default,
            eager: EagerLoader::new(),
            _phantom: PhantomData,
        }
    }

    /// Builder scoped to a table
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }

    /// Builder scoped to a model's table, carrying its soft-delete column
    pub fn for_meta(meta: &ModelMeta) -> Self {
        let mut builder = Self::table(&meta.table);
        builder.soft_delete_column = meta.soft_delete_column.clone();
        builder
    }

    /// Independent untyped builder on another table.
    ///
    /// Nothing from this builder carries over; relationship sub-queries and
    /// existence checks start from here.
    pub fn fork(&self, table: &str) -> QueryBuilder {
        QueryBuilder::table(table)
    }

    /// Reinterpret the builder for another result type
    pub fn cast<N>(self) -> QueryBuilder<N> {
        QueryBuilder {
            query_type: self.query_type,
            table: self.table,
            table_alias: self.table_alias,
            select_fields: self.select_fields,
            count_subqueries: self.count_subqueries,
            set_clauses: self.set_clauses,
            predicates: self.predicates,
            joins: self.joins,
            order_by: self.order_by,
            group_by: self.group_by,
            having_conditions: self.having_conditions,
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            returning: self.returning,
            soft_delete_column: self.soft_delete_column,
            trashed: self.trashed,
            eager: self.eager,
            _phantom: PhantomData,
        }
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Reference the FROM table under another name (`FROM users AS users_1`)
    pub fn alias(mut self, alias: &str) -> Self {
        self.table_alias = Some(alias.to_string());
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Name columns of the FROM table are qualified with: the alias if set
    pub fn qualifier(&self) -> Option<&str> {
        self.table_alias.as_deref().or(self.table.as_deref())
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub(crate) fn require_table(&self) -> OrmResult<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| ModelError::Query("Query has no table".to_string()))
    }

    /// Label used in logs and execution errors
    pub(crate) fn target(&self) -> String {
        self.table.clone().unwrap_or_else(|| "<unscoped>".to_string())
    }

    pub fn eager_loader(&self) -> &EagerLoader {
        &self.eager
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Builder scoped to `M`'s table
    pub fn for_model() -> Self {
        Self::for_meta(M::meta())
    }
}
