//! Query Builder Module - fluent, soft-delete-aware query builder
//!
//! The builder is split by concern: predicates (`where_clause`), projection
//! (`select`), joins, ordering, paging, soft-delete visibility, write
//! statements (`dml`), rendering (`sql_generation`), execution, and the
//! relationship-aware methods in `with`.

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod soft_delete;
pub mod sql_generation;
pub mod types;
pub mod where_clause;
pub mod with;

pub use builder::QueryBuilder;
pub use types::{
    JoinClause, JoinType, OrderDirection, Predicate, QueryOperator, QueryType, SetClause,
    TrashedMode,
};
