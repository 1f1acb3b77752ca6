//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    fn push_compare(mut self, column: &str, operator: QueryOperator, value: DatabaseValue) -> Self {
        self.predicates.push(Predicate::Compare {
            column: column.to_string(),
            operator,
            value,
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::Equal, value.into())
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::NotEqual, value.into())
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::GreaterThan, value.into())
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::GreaterThanOrEqual, value.into())
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::LessThan, value.into())
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::LessThanOrEqual, value.into())
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_compare(column, QueryOperator::Like, pattern.into())
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.push_compare(column, QueryOperator::NotLike, pattern.into())
    }

    /// Add WHERE condition with an explicit operator
    pub fn where_condition<T: Into<DatabaseValue>>(
        self,
        column: &str,
        operator: QueryOperator,
        value: T,
    ) -> Self {
        self.push_compare(column, operator, value.into())
    }

    /// Compare two columns
    pub fn where_column(mut self, left: &str, operator: QueryOperator, right: &str) -> Self {
        self.predicates.push(Predicate::Columns {
            left: left.to_string(),
            operator,
            right: right.to_string(),
        });
        self
    }

    /// Add WHERE IN condition
    pub fn where_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DatabaseValue>,
    {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Add WHERE NOT IN condition
    pub fn where_not_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DatabaseValue>,
    {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Add WHERE IS NULL condition
    pub fn where_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    /// Add WHERE IS NOT NULL condition
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::Null {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    /// Add WHERE BETWEEN condition
    pub fn where_between<T: Into<DatabaseValue>>(mut self, column: &str, low: T, high: T) -> Self {
        self.predicates.push(Predicate::Between {
            column: column.to_string(),
            low: low.into(),
            high: high.into(),
        });
        self
    }

    /// Add a raw WHERE fragment; `?` placeholders bind `params` in order
    pub fn where_raw(mut self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.predicates.push(Predicate::Raw {
            sql: sql.to_string(),
            params,
        });
        self
    }

    /// Add WHERE EXISTS (subquery)
    pub fn where_exists(mut self, query: QueryBuilder) -> Self {
        self.predicates.push(Predicate::Exists {
            query: Box::new(query),
            negated: false,
        });
        self
    }

    /// Add WHERE NOT EXISTS (subquery)
    pub fn where_not_exists(mut self, query: QueryBuilder) -> Self {
        self.predicates.push(Predicate::Exists {
            query: Box::new(query),
            negated: true,
        });
        self
    }

    /// Append an already built predicate
    pub fn where_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}
