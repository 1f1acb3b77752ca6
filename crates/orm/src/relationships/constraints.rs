//! Extra filters attached to a relationship descriptor

use crate::backends::DatabaseValue;
use crate::query::{QueryBuilder, QueryOperator};

use super::types::qualify_column;

/// A `column <op> value` filter applied to every query a relationship issues.
/// Unqualified columns refer to the related table.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub column: String,
    pub operator: QueryOperator,
    pub value: DatabaseValue,
}

impl Constraint {
    pub fn new<T: Into<DatabaseValue>>(column: &str, operator: QueryOperator, value: T) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.into(),
        }
    }

    pub(crate) fn apply(&self, query: QueryBuilder, related_table: &str) -> QueryBuilder {
        let column = qualify_column(related_table, &self.column);
        if self.value.is_null() {
            return match self.operator {
                QueryOperator::NotEqual => query.where_not_null(&column),
                _ => query.where_null(&column),
            };
        }
        query.where_condition(&column, self.operator, self.value.clone())
    }
}
