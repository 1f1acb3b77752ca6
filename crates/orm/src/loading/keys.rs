//! Hashable join keys
//!
//! Parent and related rows rarely agree on integer width (an `INT4` foreign
//! key pointing at an `INT8` primary key), so values are normalized before
//! they are used to group rows back onto their parents.

use crate::backends::DatabaseValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKey {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RelationKey {
    /// Normalized key, `None` for NULL
    pub fn from_value(value: &DatabaseValue) -> Option<Self> {
        match value {
            DatabaseValue::Null => None,
            DatabaseValue::Bool(b) => Some(RelationKey::Bool(*b)),
            DatabaseValue::Int32(i) => Some(RelationKey::Int(i64::from(*i))),
            DatabaseValue::Int64(i) => Some(RelationKey::Int(*i)),
            DatabaseValue::String(s) => Some(RelationKey::Text(s.clone())),
            DatabaseValue::Uuid(u) => Some(RelationKey::Text(u.to_string())),
            other => Some(RelationKey::Text(other.to_json().to_string())),
        }
    }
}
