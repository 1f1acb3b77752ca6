//! On-demand loading for a single owner

use std::sync::Arc;

use super::loaded::Loaded;
use super::types::{RelationKind, Relationship};
use crate::error::OrmResult;
use crate::loading::dispatch;
use crate::model::Record;
use crate::session::Session;

impl Relationship {
    /// Related records of one owner. A missing link key yields the empty
    /// form rather than an error.
    pub async fn get_results(
        &self,
        session: &Session<'_>,
        owner: &dyn Record,
    ) -> OrmResult<Loaded> {
        let many = self.is_many();

        match &self.kind {
            RelationKind::MorphTo(config) => {
                let Some((class, key, value)) =
                    dispatch::morph_link(owner, config, self.foreign_key())
                else {
                    return Ok(Loaded::One(None));
                };
                let meta = dispatch::resolve_morph(session, &class)?;
                let fetched = dispatch::fetch_morph(session, self, None, meta, &[value]).await?;
                let target = fetched
                    .into_iter()
                    .find(|(fetched_key, _)| *fetched_key == key)
                    .map(|(_, record)| Arc::from(record));
                Ok(Loaded::One(target))
            }
            RelationKind::BelongsTo
            | RelationKind::HasOne
            | RelationKind::HasMany
            | RelationKind::BelongsToMany(_)
            | RelationKind::MorphOne(_)
            | RelationKind::MorphMany(_)
            | RelationKind::HasOneThrough(_)
            | RelationKind::HasManyThrough(_) => {
                let Some((key, value)) = dispatch::link_key(owner, self.parent_key_field()) else {
                    return Ok(Loaded::empty(many));
                };
                let mut records = dispatch::fetch_keyed(session, self, None, &[value])
                    .await?
                    .into_iter()
                    .filter(|(fetched_key, _)| *fetched_key == key)
                    .map(|(_, record)| Arc::<dyn Record>::from(record));

                Ok(if many {
                    Loaded::Many(records.collect())
                } else {
                    Loaded::One(records.next())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backends::{MockStore, ValueRow};
    use crate::context::OrmContext;
    use crate::relationships::{Loaded, Relationship};
    use crate::testing::{Comment, Image, Post};

    #[tokio::test]
    async fn test_has_many_for_one_owner() {
        let store = MockStore::new();
        store.push_rows(vec![
            ValueRow::new().with("id", 10i64).with("post_id", 1i64).with("body", "first"),
            ValueRow::new().with("id", 11i64).with("post_id", 1i64).with("body", "second"),
        ]);
        let ctx = OrmContext::new();
        let session = ctx.session(&store);
        let post = Post {
            id: Some(1),
            ..Default::default()
        };

        let loaded = Relationship::has_many::<Post, Comment>("", "")
            .get_results(&session, &post)
            .await
            .unwrap();
        assert_eq!(loaded.len(), 2);

        let executed = store.executed();
        assert_eq!(executed[0].sql, "SELECT * FROM comments WHERE comments.post_id IN ($1)");
    }

    #[tokio::test]
    async fn test_unsaved_owner_issues_no_query() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let loaded = Relationship::has_many::<Post, Comment>("", "")
            .get_results(&session, &Post::default())
            .await
            .unwrap();
        assert!(matches!(loaded, Loaded::Many(ref records) if records.is_empty()));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_morph_to_resolves_through_context() {
        let store = MockStore::new();
        store.push_rows(vec![ValueRow::new().with("id", 4i64).with("title", "Hello")]);
        let ctx = OrmContext::new();
        ctx.register_morph_type::<Post>();
        let session = ctx.session(&store);
        let image = Image {
            id: 1,
            imageable_type: "Post".to_string(),
            imageable_id: 4,
            ..Default::default()
        };

        let loaded = Relationship::morph_to::<Image>("imageable", "", "", "")
            .get_results(&session, &image)
            .await
            .unwrap();
        let Loaded::One(Some(record)) = loaded else {
            panic!("expected a post");
        };
        assert_eq!(record.downcast_ref::<Post>().unwrap().title, "Hello");
        assert_eq!(
            store.executed()[0].sql,
            "SELECT * FROM posts WHERE posts.id IN ($1) AND posts.deleted_at IS NULL"
        );
    }
}
