//! HasOneThrough / HasManyThrough - reach a distant model via an
//! intermediate one
//!
//! `Country -> User -> Post`: the intermediate (`users`) holds the first
//! key pointing at the parent, the related (`posts`) holds the second key
//! pointing at the intermediate.

use super::types::{or_convention, table_expression, RelationKind, Relationship};
use crate::model::{Model, ModelMeta};
use crate::query::QueryBuilder;

#[derive(Debug, Clone, PartialEq)]
pub struct ThroughConfig {
    pub through: &'static ModelMeta,
    /// Column on the related table pointing at the intermediate
    pub second_key: String,
    /// Intermediate column `second_key` points at
    pub second_local_key: String,
}

impl ThroughConfig {
    /// Alias of the intermediate's first key in result rows
    pub(crate) const KEY_ALIAS: &'static str = "through_key";

    /// Join the intermediate, referenced as `through`, onto the related
    /// table referenced as `related`
    pub(crate) fn join(&self, query: QueryBuilder, related: &str, through: &str) -> QueryBuilder {
        let query = query.join(
            &table_expression(&self.through.table, through),
            &format!("{}.{}", through, self.second_local_key),
            &format!("{}.{}", related, self.second_key),
        );
        match &self.through.soft_delete_column {
            Some(column) => query.where_null(&format!("{}.{}", through, column)),
            None => query,
        }
    }

    pub(crate) fn projection(&self, related: &ModelMeta, first_key: &str) -> Vec<String> {
        vec![
            format!("{}.*", related.table),
            format!("{} AS {}", self.through.qualified(first_key), Self::KEY_ALIAS),
        ]
    }
}

fn through<P: Model, R: Model, T: Model>(
    first_key: &str,
    second_key: &str,
    local_key: &str,
    second_local_key: &str,
    many: bool,
) -> Relationship {
    let config = ThroughConfig {
        through: T::meta(),
        second_key: or_convention(second_key, T::foreign_key_name),
        second_local_key: or_convention(second_local_key, || T::primary_key_name().to_string()),
    };
    let kind = if many {
        RelationKind::HasManyThrough(config)
    } else {
        RelationKind::HasOneThrough(config)
    };

    Relationship::from_parts(
        kind,
        P::meta(),
        Some(R::meta()),
        or_convention(first_key, P::foreign_key_name),
        or_convention(local_key, || P::primary_key_name().to_string()),
    )
}

impl Relationship {
    /// `P` has one `R` through `T`
    pub fn has_one_through<P: Model, R: Model, T: Model>(
        first_key: &str,
        second_key: &str,
        local_key: &str,
        second_local_key: &str,
    ) -> Self {
        through::<P, R, T>(first_key, second_key, local_key, second_local_key, false)
    }

    /// `P` has many `R` through `T`
    pub fn has_many_through<P: Model, R: Model, T: Model>(
        first_key: &str,
        second_key: &str,
        local_key: &str,
        second_local_key: &str,
    ) -> Self {
        through::<P, R, T>(first_key, second_key, local_key, second_local_key, true)
    }

    pub fn through(&self) -> Option<&ThroughConfig> {
        match &self.kind {
            RelationKind::HasOneThrough(config) | RelationKind::HasManyThrough(config) => {
                Some(config)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::relationships::{Relationship, RelationshipType};
    use crate::testing::{Comment, Country, Post, User};

    #[test]
    fn test_has_many_through_joins_intermediate() {
        let rel = Relationship::has_many_through::<Country, Post, User>("", "", "", "");
        assert_eq!(rel.relationship_type(), RelationshipType::HasManyThrough);
        assert_eq!(rel.foreign_key(), "country_id");
        assert_eq!(rel.match_column().unwrap(), "users.country_id");
        assert_eq!(rel.match_alias(), "through_key");

        let sql = rel.get_query().unwrap().to_sql();
        assert_eq!(
            sql,
            "SELECT posts.*, users.country_id AS through_key FROM posts \
             INNER JOIN users ON users.id = posts.user_id WHERE posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_soft_deleted_intermediate_is_excluded() {
        let sql = Relationship::has_one_through::<User, Comment, Post>("", "", "", "")
            .get_query()
            .unwrap()
            .to_sql();
        assert_eq!(
            sql,
            "SELECT comments.*, posts.user_id AS through_key FROM comments \
             INNER JOIN posts ON posts.id = comments.post_id WHERE posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_existence_query_correlates_through_first_key() {
        let sql = Relationship::has_many_through::<Country, Post, User>("", "", "", "")
            .existence_query("countries")
            .unwrap()
            .select_raw("1")
            .to_sql();
        assert!(sql.ends_with(
            "WHERE users.country_id = countries.id AND posts.deleted_at IS NULL"
        ));
    }
}
