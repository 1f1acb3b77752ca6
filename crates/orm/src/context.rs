//! ORM context: configuration, relationship registry, morph map and
//! observers, built once at startup and shared by cheap clones.

use std::sync::Arc;

use dashmap::DashMap;

use crate::backends::DataStore;
use crate::config::OrmConfig;
use crate::error::{ModelError, OrmResult};
use crate::events::ModelObserver;
use crate::model::{Model, ModelMeta};
use crate::observers::ObserverManager;
use crate::relationships::{Relationship, RelationshipRegistry};
use crate::session::Session;

#[derive(Debug, Default)]
struct ContextInner {
    config: OrmConfig,
    relationships: RelationshipRegistry,
    morph_types: DashMap<String, &'static ModelMeta>,
    observers: ObserverManager,
}

/// Shared, explicitly passed ORM state
#[derive(Debug, Clone, Default)]
pub struct OrmContext {
    inner: Arc<ContextInner>,
}

impl OrmContext {
    /// Context with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OrmConfig) -> OrmResult<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(ContextInner {
                config,
                ..Default::default()
            }),
        })
    }

    pub fn config(&self) -> &OrmConfig {
        &self.inner.config
    }

    pub fn relationships(&self) -> &RelationshipRegistry {
        &self.inner.relationships
    }

    /// Register relation `name` on `M`
    pub fn register_relationship<M, F>(&self, name: &str, factory: F)
    where
        M: Model,
        F: Fn() -> Relationship + Send + Sync + 'static,
    {
        self.inner.relationships.register(M::model_name(), name, factory);
    }

    /// Fresh descriptor for `model.relation`
    pub fn relationship(&self, model: &str, relation: &str) -> OrmResult<Relationship> {
        self.inner
            .relationships
            .get_relationship(model, relation)
            .ok_or_else(|| ModelError::RelationshipNotFound {
                model: model.to_string(),
                relation: relation.to_string(),
            })
    }

    /// Make `M` resolvable from polymorphic type columns holding its morph class
    pub fn register_morph_type<M: Model>(&self) {
        self.inner.morph_types.insert(M::morph_class(), M::meta());
    }

    pub fn morph_type(&self, class: &str) -> Option<&'static ModelMeta> {
        self.inner.morph_types.get(class).map(|entry| *entry.value())
    }

    pub fn observe<M, O>(&self, observer: O)
    where
        M: Model,
        O: ModelObserver<M> + 'static,
    {
        self.inner.observers.register_for_model::<M>(Arc::new(observer));
    }

    pub fn observers(&self) -> &ObserverManager {
        &self.inner.observers
    }

    /// Session over `store` with no deadline or cancellation
    pub fn session<'a>(&'a self, store: &'a dyn DataStore) -> Session<'a> {
        Session::new(store, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Image, Post, User};

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OrmConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(OrmContext::with_config(config), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_relationship_lookup() {
        let ctx = OrmContext::new();
        ctx.register_relationship::<Post, _>("author", || {
            Relationship::belongs_to::<Post, User>("", "")
        });

        let clone = ctx.clone();
        assert_eq!(clone.relationship("Post", "author").unwrap().name(), "author");

        match ctx.relationship("Post", "editor") {
            Err(ModelError::RelationshipNotFound { model, relation }) => {
                assert_eq!(model, "Post");
                assert_eq!(relation, "editor");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_morph_types() {
        let ctx = OrmContext::new();
        assert!(ctx.morph_type("Post").is_none());
        ctx.register_morph_type::<Post>();
        ctx.register_morph_type::<Image>();
        assert_eq!(ctx.morph_type("Post").unwrap().table, "posts");
    }
}
