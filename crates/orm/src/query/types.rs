//! Query Builder Types - Core types and enums for query building

use std::fmt;
use std::str::FromStr;

use super::builder::QueryBuilder;
use crate::backends::DatabaseValue;
use crate::error::ModelError;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "!=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterThanOrEqual => ">=",
            QueryOperator::LessThan => "<",
            QueryOperator::LessThanOrEqual => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT LIKE",
        };
        f.write_str(symbol)
    }
}

impl FromStr for QueryOperator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "=" => Ok(QueryOperator::Equal),
            "!=" | "<>" => Ok(QueryOperator::NotEqual),
            ">" => Ok(QueryOperator::GreaterThan),
            ">=" => Ok(QueryOperator::GreaterThanOrEqual),
            "<" => Ok(QueryOperator::LessThan),
            "<=" => Ok(QueryOperator::LessThanOrEqual),
            "LIKE" => Ok(QueryOperator::Like),
            "NOT LIKE" => Ok(QueryOperator::NotLike),
            other => Err(ModelError::Query(format!("Unsupported operator '{}'", other))),
        }
    }
}

/// One WHERE/HAVING condition
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `column op $n`
    Compare {
        column: String,
        operator: QueryOperator,
        value: DatabaseValue,
    },
    /// `left op right`, both columns
    Columns {
        left: String,
        operator: QueryOperator,
        right: String,
    },
    /// `column [NOT] IN (...)`; an empty list matches nothing (or everything when negated)
    In {
        column: String,
        values: Vec<DatabaseValue>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    Between {
        column: String,
        low: DatabaseValue,
        high: DatabaseValue,
    },
    /// Raw fragment; each `?` binds the next parameter
    Raw { sql: String, params: Vec<DatabaseValue> },
    /// `[NOT] EXISTS (subquery)`
    Exists { query: Box<QueryBuilder>, negated: bool },
    /// `(subquery) op $n`
    SubqueryCompare {
        query: Box<QueryBuilder>,
        operator: QueryOperator,
        value: DatabaseValue,
    },
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub on_conditions: Vec<(String, String)>, // (left_column, right_column)
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Column assignment for INSERT and UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: DatabaseValue,
}

/// Visibility of soft-deleted rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedMode {
    /// Exclude soft-deleted rows
    #[default]
    Default,
    /// Include every row
    WithTrashed,
    /// Only soft-deleted rows
    OnlyTrashed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parsing() {
        assert_eq!("<>".parse::<QueryOperator>().unwrap(), QueryOperator::NotEqual);
        assert_eq!("like".parse::<QueryOperator>().unwrap(), QueryOperator::Like);
        assert_eq!(" >= ".parse::<QueryOperator>().unwrap(), QueryOperator::GreaterThanOrEqual);
        assert!("~~".parse::<QueryOperator>().is_err());
    }
}
