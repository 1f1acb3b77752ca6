//! Relationship Registry - runtime lookup of relationship factories
//!
//! Factories are registered per model name and relation name. Every lookup
//! builds a fresh descriptor, so refinements made by one load never leak
//! into another.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use super::types::Relationship;

/// Builds a fresh relationship descriptor
pub type RelationshipFactory = Arc<dyn Fn() -> Relationship + Send + Sync>;

/// Thread-safe registry: model name -> relation name -> factory
#[derive(Clone, Default)]
pub struct RelationshipRegistry {
    relationships: Arc<DashMap<String, HashMap<String, RelationshipFactory>>>,
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; a later registration under the same names wins
    pub fn register<F>(&self, model_name: &str, relation: &str, factory: F)
    where
        F: Fn() -> Relationship + Send + Sync + 'static,
    {
        self.relationships
            .entry(model_name.to_string())
            .or_default()
            .insert(relation.to_string(), Arc::new(factory));
    }

    pub fn lookup(&self, model_name: &str, relation: &str) -> Option<RelationshipFactory> {
        self.relationships
            .get(model_name)
            .and_then(|relations| relations.get(relation).cloned())
    }

    /// Fresh descriptor named after the relation it was registered under
    pub fn get_relationship(&self, model_name: &str, relation: &str) -> Option<Relationship> {
        // Build outside the map guard; factories may consult the registry.
        let factory = self.lookup(model_name, relation)?;
        Some(factory().named(relation))
    }

    pub fn has_relationship(&self, model_name: &str, relation: &str) -> bool {
        self.relationships
            .get(model_name)
            .map_or(false, |relations| relations.contains_key(relation))
    }

    /// Relation names registered for a model, sorted
    pub fn relationship_names(&self, model_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .relationships
            .get(model_name)
            .map(|relations| relations.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.relationships.clear();
    }
}

impl fmt::Debug for RelationshipRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<String> = self
            .relationships
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        models.sort();
        f.debug_struct("RelationshipRegistry").field("models", &models).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Comment, Post, User};

    #[test]
    fn test_register_and_lookup() {
        let registry = RelationshipRegistry::new();
        registry.register("Post", "comments", || Relationship::has_many::<Post, Comment>("", ""));
        registry.register("Post", "author", || Relationship::belongs_to::<Post, User>("", ""));

        assert!(registry.has_relationship("Post", "comments"));
        assert!(!registry.has_relationship("Post", "tags"));
        assert!(!registry.has_relationship("User", "comments"));
        assert_eq!(registry.relationship_names("Post"), vec!["author", "comments"]);

        let rel = registry.get_relationship("Post", "author").unwrap();
        assert_eq!(rel.name(), "author");
        assert_eq!(rel.describe(), "Post.author");
    }

    #[test]
    fn test_each_lookup_builds_a_fresh_descriptor() {
        let registry = RelationshipRegistry::new();
        registry.register("Post", "comments", || Relationship::has_many::<Post, Comment>("", ""));

        let refined = registry
            .get_relationship("Post", "comments")
            .unwrap()
            .where_eq("approved", true);
        assert_eq!(refined.constraints().len(), 1);

        let fresh = registry.get_relationship("Post", "comments").unwrap();
        assert!(fresh.constraints().is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = RelationshipRegistry::new();
        registry.register("Post", "comments", || Relationship::has_many::<Post, Comment>("", ""));
        let shared = registry.clone();
        shared.clear();
        assert!(registry.get_relationship("Post", "comments").is_none());
    }
}
