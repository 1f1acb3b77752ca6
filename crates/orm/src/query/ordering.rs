//! Query Builder ORDER BY, GROUP BY, HAVING operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    /// Add ORDER BY clause (ascending)
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Asc));
        self
    }

    /// Add ORDER BY clause (descending)
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Add ORDER BY clause with an explicit direction
    pub fn order_by_direction(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    /// Add GROUP BY clause
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    /// Add HAVING condition
    pub fn having<T: Into<DatabaseValue>>(
        mut self,
        expression: &str,
        operator: QueryOperator,
        value: T,
    ) -> Self {
        self.having_conditions.push(Predicate::Compare {
            column: expression.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Add a raw HAVING fragment; `?` placeholders bind `params` in order
    pub fn having_raw(mut self, sql: &str, params: Vec<DatabaseValue>) -> Self {
        self.having_conditions.push(Predicate::Raw {
            sql: sql.to_string(),
            params,
        });
        self
    }
}
