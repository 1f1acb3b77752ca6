//! Query Builder relationship methods: eager loading, existence and counts
//!
//! Existence and count helpers resolve relationships through the context's
//! registry and expand them into correlated sub-queries.

use std::sync::Arc;

use super::builder::QueryBuilder;
use super::types::{Predicate, QueryOperator};
use crate::backends::DatabaseValue;
use crate::context::OrmContext;
use crate::error::OrmResult;
use crate::model::{Model, ModelMeta};

impl<M> QueryBuilder<M> {
    /// Eager load a relation path such as `"posts.comments"`
    pub fn with(mut self, path: &str) -> Self {
        self.eager.add_relation(path, None);
        self
    }

    /// Eager load a relation path, refining the query of its last segment
    pub fn with_constraint<F>(mut self, path: &str, constraint: F) -> Self
    where
        F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync + 'static,
    {
        self.eager.add_relation(path, Some(Arc::new(constraint)));
        self
    }

    /// Eager load only when `condition` holds
    pub fn with_when(self, condition: bool, path: &str) -> Self {
        if condition {
            self.with(path)
        } else {
            self
        }
    }
}

/// Correlated existence query for a dotted relation path. The constraint
/// refines the innermost relation.
fn existence_chain<F>(
    context: &OrmContext,
    meta: &ModelMeta,
    outer_table: &str,
    segments: &[&str],
    constraint: F,
) -> OrmResult<QueryBuilder>
where
    F: FnOnce(QueryBuilder) -> QueryBuilder,
{
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(constraint(QueryBuilder::new())),
    };

    let relationship = context.relationship(meta.model_name, first)?;
    let query = relationship.existence_query(outer_table)?;
    if rest.is_empty() {
        return Ok(constraint(query));
    }

    let related = relationship.related_meta()?;
    let inner_table = query.qualifier().unwrap_or(&related.table).to_string();
    let nested = existence_chain(context, related, &inner_table, rest, constraint)?;
    Ok(query.where_exists(nested.reselect(vec!["1".to_string()])))
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.').map(str::trim).filter(|s| !s.is_empty()).collect()
}

impl<M: Model> QueryBuilder<M> {
    fn existence<F>(
        &self,
        context: &OrmContext,
        relation: &str,
        constraint: F,
    ) -> OrmResult<QueryBuilder>
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.require_table()?;
        let outer = self.qualifier().unwrap_or_default().to_string();
        existence_chain(context, M::meta(), &outer, &split_path(relation), constraint)
    }

    /// Rows with at least one related record
    pub fn has(self, context: &OrmContext, relation: &str) -> OrmResult<Self> {
        self.where_has(context, relation, |query| query)
    }

    /// Rows with at least one related record matching `constraint`
    pub fn where_has<F>(
        self,
        context: &OrmContext,
        relation: &str,
        constraint: F,
    ) -> OrmResult<Self>
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let sub = self.existence(context, relation, constraint)?;
        Ok(self.where_exists(sub.reselect(vec!["1".to_string()])))
    }

    /// Rows without any related record
    pub fn doesnt_have(self, context: &OrmContext, relation: &str) -> OrmResult<Self> {
        self.where_doesnt_have(context, relation, |query| query)
    }

    /// Rows without a related record matching `constraint`
    pub fn where_doesnt_have<F>(
        self,
        context: &OrmContext,
        relation: &str,
        constraint: F,
    ) -> OrmResult<Self>
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let sub = self.existence(context, relation, constraint)?;
        Ok(self.where_not_exists(sub.reselect(vec!["1".to_string()])))
    }

    /// Rows whose related-record count satisfies `operator count`
    pub fn has_count(
        self,
        context: &OrmContext,
        relation: &str,
        operator: QueryOperator,
        count: i64,
    ) -> OrmResult<Self> {
        let sub = self.existence(context, relation, |query| query)?;
        Ok(self.where_predicate(Predicate::SubqueryCompare {
            query: Box::new(sub.reselect(vec!["COUNT(*)".to_string()])),
            operator,
            value: DatabaseValue::Int64(count),
        }))
    }

    /// Add a `<relation>_count` column
    pub fn with_count(self, context: &OrmContext, relation: &str) -> OrmResult<Self> {
        self.with_count_where(context, relation, |query| query)
    }

    /// Add a `<relation>_count` column counting records that match `constraint`
    pub fn with_count_where<F>(
        mut self,
        context: &OrmContext,
        relation: &str,
        constraint: F,
    ) -> OrmResult<Self>
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        let sub = self.existence(context, relation, constraint)?;
        let alias = format!("{}_count", split_path(relation).join("_"));
        self.count_subqueries
            .push((sub.reselect(vec!["COUNT(*)".to_string()]), alias));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::relationships::Relationship;
    use crate::testing::{Comment, Image, Post, User};

    fn context() -> OrmContext {
        let ctx = OrmContext::new();
        ctx.register_relationship::<User, _>("posts", || {
            Relationship::has_many::<User, Post>("", "")
        });
        ctx.register_relationship::<Post, _>("comments", || {
            Relationship::has_many::<Post, Comment>("", "")
        });
        ctx.register_relationship::<Image, _>("imageable", || {
            Relationship::morph_to::<Image>("imageable", "", "", "")
        });
        ctx
    }

    #[test]
    fn test_where_has_with_constraint() {
        let (sql, params) = User::query()
            .where_has(&context(), "posts", |q| q.where_like("posts.title", "%rust%"))
            .unwrap()
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE EXISTS (SELECT 1 FROM posts WHERE posts.user_id = users.id \
             AND posts.title LIKE $1 AND posts.deleted_at IS NULL)"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_nested_has() {
        let sql = User::query().has(&context(), "posts.comments").unwrap().to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE EXISTS (SELECT 1 FROM posts WHERE posts.user_id = users.id \
             AND EXISTS (SELECT 1 FROM comments WHERE comments.post_id = posts.id) \
             AND posts.deleted_at IS NULL)"
        );
    }

    #[test]
    fn test_doesnt_have() {
        let sql = Post::query().doesnt_have(&context(), "comments").unwrap().to_sql();
        assert_eq!(
            sql,
            "SELECT * FROM posts WHERE NOT EXISTS \
             (SELECT 1 FROM comments WHERE comments.post_id = posts.id) \
             AND posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_has_count_and_with_count() {
        let ctx = context();
        let (sql, params) = Post::query()
            .with_count(&ctx, "comments")
            .unwrap()
            .has_count(&ctx, "comments", QueryOperator::GreaterThanOrEqual, 3)
            .unwrap()
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT posts.*, \
             (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) AS comments_count \
             FROM posts \
             WHERE (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) >= $1 \
             AND posts.deleted_at IS NULL"
        );
        assert_eq!(params, vec![DatabaseValue::Int64(3)]);
    }

    #[test]
    fn test_self_relation_aliases_inner_table() {
        let ctx = context();
        ctx.register_relationship::<User, _>("members", || {
            Relationship::has_many::<User, User>("country_id", "")
        });
        ctx.register_relationship::<Post, _>("siblings", || {
            Relationship::has_many::<Post, Post>("user_id", "user_id")
        });

        assert_eq!(
            User::query().has(&ctx, "members").unwrap().to_sql(),
            "SELECT * FROM users WHERE EXISTS (SELECT 1 FROM users AS users_1 \
             WHERE users_1.country_id = users.id)"
        );
        assert_eq!(
            User::query().has(&ctx, "members.posts").unwrap().to_sql(),
            "SELECT * FROM users WHERE EXISTS (SELECT 1 FROM users AS users_1 \
             WHERE users_1.country_id = users.id \
             AND EXISTS (SELECT 1 FROM posts WHERE posts.user_id = users_1.id \
             AND posts.deleted_at IS NULL))"
        );
        assert_eq!(
            Post::query().has(&ctx, "siblings").unwrap().to_sql(),
            "SELECT * FROM posts WHERE EXISTS (SELECT 1 FROM posts AS posts_1 \
             WHERE posts_1.user_id = posts.user_id AND posts_1.deleted_at IS NULL) \
             AND posts.deleted_at IS NULL"
        );
    }

    #[test]
    fn test_unregistered_and_unsupported_relations() {
        let ctx = context();
        assert!(matches!(
            Post::query().has(&ctx, "tags"),
            Err(ModelError::RelationshipNotFound { .. })
        ));
        assert!(matches!(
            Image::query().has(&ctx, "imageable"),
            Err(ModelError::UnsupportedRelationshipKind { .. })
        ));
    }

    #[test]
    fn test_with_accumulates_paths() {
        let query = Post::query()
            .with("comments")
            .with_when(false, "author")
            .with_constraint("comments", |q| q.where_eq("approved", true));
        assert_eq!(query.eager_loader().paths(), vec!["comments"]);
        assert!(query.eager_loader().roots()[0].has_constraint());
    }
}
