//! CRUD Operations - persistence for single records
//!
//! Every `Model` gets these through a blanket impl. Writes run the
//! registered lifecycle observers: `saving`, `creating`/`updating`,
//! `deleting` before the statement (any error vetoes it), the matching
//! "-ed" hooks after.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::core_trait::Model;
use super::lifecycle::ModelLifecycle;
use crate::backends::DatabaseValue;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::loading::EagerLoader;
use crate::scanner;
use crate::session::Session;

const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

fn stamp(values: &mut Vec<(String, DatabaseValue)>, column: &str, now: DatabaseValue) {
    values.retain(|(name, _)| name != column);
    values.push((column.to_string(), now));
}

#[async_trait]
pub trait Persistence: Model {
    /// Find a model by its primary key
    async fn find(session: &Session<'_>, id: DatabaseValue) -> ModelResult<Option<Self>> {
        Self::query().find(session, id).await
    }

    /// Find a model by its primary key or fail with `NotFound`
    async fn find_or_fail(session: &Session<'_>, id: DatabaseValue) -> ModelResult<Self> {
        let label = format!("{}({:?})", Self::table_name(), id);
        Self::find(session, id).await?.ok_or(ModelError::NotFound(label))
    }

    /// Insert or update.
    ///
    /// A record read from storage is updated with its dirty columns only;
    /// nothing is written when it is clean. Anything else is inserted and
    /// receives the generated primary key.
    async fn save(&mut self, session: &Session<'_>) -> ModelResult<()> {
        let lifecycle = ModelLifecycle::<Self>::for_model(session.context());
        let meta = Self::meta();
        let now = DatabaseValue::DateTime(Utc::now());

        lifecycle.before(ModelEvent::Saving, self, &[]).await?;

        let existing = self.primary_key().filter(|_| self.state().is_persisted());
        if let Some(id) = existing {
            let dirty = self.get_dirty()?;
            if dirty.is_empty() {
                debug!("{}: nothing to save", meta.model_name);
                return Ok(());
            }

            lifecycle.before(ModelEvent::Updating, self, &dirty).await?;
            let mut changes = self.get_dirty()?;
            if meta.timestamps {
                stamp(&mut changes, UPDATED_AT, now.clone());
                scanner::assign(self, [(UPDATED_AT.to_string(), now)])?;
            }

            Self::query()
                .with_trashed()
                .where_eq(&meta.qualified(&meta.primary_key), id)
                .update(session, changes.clone())
                .await?;
            self.sync_original()?;
            lifecycle.after(ModelEvent::Updated, self, &changes).await?;
        } else {
            lifecycle.before(ModelEvent::Creating, self, &[]).await?;
            let mut values = self.to_fields()?;
            values.retain(|(column, value)| !(column == &meta.primary_key && value.is_null()));

            let mut assigned = Vec::new();
            if meta.timestamps {
                for column in [CREATED_AT, UPDATED_AT] {
                    stamp(&mut values, column, now.clone());
                    assigned.push((column.to_string(), now.clone()));
                }
            }

            let id = Self::query()
                .insert_returning(session, values.clone(), &meta.primary_key)
                .await?;
            if let Some(id) = id {
                assigned.push((meta.primary_key.clone(), id));
            }
            scanner::assign(self, assigned)?;
            self.sync_original()?;
            lifecycle.after(ModelEvent::Created, self, &values).await?;
        }

        lifecycle.after(ModelEvent::Saved, self, &[]).await
    }

    /// Soft delete when the model supports it, hard delete otherwise
    async fn delete(&mut self, session: &Session<'_>) -> ModelResult<()> {
        let lifecycle = ModelLifecycle::<Self>::for_model(session.context());
        let meta = Self::meta();
        let id = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;

        lifecycle.before(ModelEvent::Deleting, self, &[]).await?;

        let query = Self::query().where_eq(&meta.qualified(&meta.primary_key), id);
        match &meta.soft_delete_column {
            Some(column) => {
                let now = DatabaseValue::DateTime(Utc::now());
                query.update(session, [(column.clone(), now.clone())]).await?;
                scanner::assign(self, [(column.clone(), now)])?;
                self.sync_original()?;
            }
            None => {
                query.force_delete(session).await?;
                self.state_mut().forget_original();
            }
        }

        lifecycle.after(ModelEvent::Deleted, self, &[]).await
    }

    /// Clear the soft-delete marker
    async fn restore(&mut self, session: &Session<'_>) -> ModelResult<()> {
        let meta = Self::meta();
        let Some(column) = &meta.soft_delete_column else {
            return Err(ModelError::Query(format!("{} does not use soft deletes", meta.model_name)));
        };
        let id = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;

        Self::query()
            .where_eq(&meta.qualified(&meta.primary_key), id)
            .restore(session)
            .await?;
        scanner::assign(self, [(column.clone(), DatabaseValue::Null)])?;
        self.sync_original()
    }

    /// Remove the row even when the model soft-deletes
    async fn force_delete(&mut self, session: &Session<'_>) -> ModelResult<()> {
        let lifecycle = ModelLifecycle::<Self>::for_model(session.context());
        let meta = Self::meta();
        let id = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;

        lifecycle.before(ModelEvent::Deleting, self, &[]).await?;
        Self::query()
            .where_eq(&meta.qualified(&meta.primary_key), id)
            .force_delete(session)
            .await?;
        self.state_mut().forget_original();
        lifecycle.after(ModelEvent::Deleted, self, &[]).await
    }

    /// Eager load relation paths onto this record
    async fn load(&mut self, session: &Session<'_>, relations: &[&str]) -> ModelResult<()> {
        let mut loader = EagerLoader::new();
        for path in relations {
            loader.add_relation(path, None);
        }
        loader.load(session, std::slice::from_mut(self)).await
    }
}

impl<M: Model> Persistence for M {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::backends::{MockStore, ValueRow};
    use crate::context::OrmContext;
    use crate::event_error::EventError;
    use crate::events::ModelObserver;
    use crate::testing::{Post, User};

    struct RejectBlankTitles;

    #[async_trait]
    impl ModelObserver<Post> for RejectBlankTitles {
        async fn saving(&self, post: &mut Post) -> Result<(), EventError> {
            if post.title.trim().is_empty() {
                return Err(EventError::validation("title is required"));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountDeletes(Arc<AtomicUsize>);

    #[async_trait]
    impl ModelObserver<Post> for CountDeletes {
        async fn deleted(&self, _post: &Post) -> Result<(), EventError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn stored_post() -> Post {
        let mut post = Post {
            id: Some(3),
            user_id: Some(1),
            title: "Draft".to_string(),
            ..Default::default()
        };
        post.sync_original().unwrap();
        post
    }

    #[tokio::test]
    async fn test_insert_assigns_generated_key() {
        let store = MockStore::new();
        store.push_rows(vec![ValueRow::new().with("id", 42i64)]);
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut user = User {
            name: "Ada".to_string(),
            ..Default::default()
        };
        user.save(&session).await.unwrap();

        assert_eq!(user.id, Some(42));
        assert!(user.state().is_persisted());
        let executed = store.executed();
        assert_eq!(executed.len(), 1);
        assert!(executed[0].sql.starts_with("INSERT INTO users"));
        assert!(!executed[0].sql.contains("(id,"));
        assert!(executed[0].sql.ends_with("RETURNING id"));
    }

    #[tokio::test]
    async fn test_update_writes_dirty_columns_only() {
        let store = MockStore::new();
        store.push_affected(1);
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut post = stored_post();
        post.title = "Published".to_string();
        post.save(&session).await.unwrap();

        let executed = store.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].sql, "UPDATE posts SET title = $1 WHERE posts.id = $2");
        assert_eq!(executed[0].params[0], DatabaseValue::String("Published".to_string()));
        assert_eq!(executed[0].params.len(), 2);
        assert!(!post.is_dirty().unwrap());
    }

    #[tokio::test]
    async fn test_clean_record_is_not_written() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut post = stored_post();
        post.save(&session).await.unwrap();
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_saving_observer_vetoes_write() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        ctx.observe::<Post, _>(RejectBlankTitles);
        let session = ctx.session(&store);

        let mut post = Post::default();
        let err = post.save(&session).await.unwrap_err();
        assert!(matches!(err, ModelError::Vetoed(ref msg) if msg.contains("title is required")));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_marks_record() {
        let store = MockStore::new();
        store.push_affected(1);
        let ctx = OrmContext::new();
        let deletes = CountDeletes::default();
        ctx.observe::<Post, _>(deletes.clone());
        let session = ctx.session(&store);

        let mut post = stored_post();
        post.delete(&session).await.unwrap();

        assert!(post.is_soft_deleted());
        assert_eq!(deletes.0.load(Ordering::SeqCst), 1);
        let executed = store.executed();
        assert!(executed[0].sql.starts_with("UPDATE posts SET deleted_at = $1"));
    }

    #[tokio::test]
    async fn test_hard_delete_forgets_snapshot() {
        let store = MockStore::new();
        store.push_affected(1);
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut user = User {
            id: Some(5),
            name: "Ada".to_string(),
            ..Default::default()
        };
        user.sync_original().unwrap();
        user.delete(&session).await.unwrap();

        assert!(!user.state().is_persisted());
        assert!(store.executed()[0].sql.starts_with("DELETE FROM users"));
    }

    #[tokio::test]
    async fn test_delete_requires_primary_key() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut post = Post::default();
        let err = post.delete(&session).await.unwrap_err();
        assert!(matches!(err, ModelError::MissingPrimaryKey));
    }

    #[tokio::test]
    async fn test_restore_clears_marker() {
        let store = MockStore::new();
        store.push_affected(1);
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut post = stored_post();
        post.deleted_at = Some(Utc::now());
        post.sync_original().unwrap();
        post.restore(&session).await.unwrap();

        assert!(post.deleted_at.is_none());
        assert!(!post.is_dirty().unwrap());
    }

    #[tokio::test]
    async fn test_restore_without_soft_deletes_fails() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let mut user = User {
            id: Some(1),
            ..Default::default()
        };
        let err = user.restore(&session).await.unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
        assert_eq!(store.query_count(), 0);
    }
}
