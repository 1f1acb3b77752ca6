//! Eager-load forest and its entry points
//!
//! Dotted paths (`"posts.comments"`) are merged into a forest of
//! [`EagerLoadNode`]s. Loading walks the forest breadth by relation: one
//! batched query per (model type, relation) at every level.

use std::fmt;
use std::sync::Arc;

use super::dispatch;
use crate::context::OrmContext;
use crate::error::{ModelError, OrmResult};
use crate::model::{Model, ModelMeta, Record};
use crate::query::QueryBuilder;
use crate::session::Session;

/// Callback refining the related query of one node
pub type ConstraintFn = Arc<dyn Fn(QueryBuilder) -> QueryBuilder + Send + Sync>;

#[derive(Clone)]
pub struct EagerLoadNode {
    pub(crate) name: String,
    pub(crate) constraint: Option<ConstraintFn>,
    pub(crate) children: Vec<EagerLoadNode>,
}

impl EagerLoadNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            constraint: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[EagerLoadNode] {
        &self.children
    }

    pub fn has_constraint(&self) -> bool {
        self.constraint.is_some()
    }

    pub(crate) fn constrain(&self, query: QueryBuilder) -> QueryBuilder {
        match &self.constraint {
            Some(constraint) => constraint(query),
            None => query,
        }
    }

    fn depth(&self) -> usize {
        1 + self.children.iter().map(EagerLoadNode::depth).max().unwrap_or(0)
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", prefix, self.name)
        };
        out.push(path.clone());
        for child in &self.children {
            child.collect_paths(&path, out);
        }
    }
}

impl fmt::Debug for EagerLoadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerLoadNode")
            .field("name", &self.name)
            .field("constrained", &self.constraint.is_some())
            .field("children", &self.children)
            .finish()
    }
}

fn child_or_insert<'n>(nodes: &'n mut Vec<EagerLoadNode>, name: &str) -> &'n mut EagerLoadNode {
    let index = match nodes.iter().position(|node| node.name == name) {
        Some(index) => index,
        None => {
            nodes.push(EagerLoadNode::new(name));
            nodes.len() - 1
        }
    };
    &mut nodes[index]
}

#[derive(Debug, Clone, Default)]
pub struct EagerLoader {
    roots: Vec<EagerLoadNode>,
}

impl EagerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str) -> Self {
        self.add_relation(path, None);
        self
    }

    pub fn with_constraint<F>(mut self, path: &str, constraint: F) -> Self
    where
        F: Fn(QueryBuilder) -> QueryBuilder + Send + Sync + 'static,
    {
        self.add_relation(path, Some(Arc::new(constraint)));
        self
    }

    /// Merge a dotted path into the forest.
    ///
    /// Existing segments are reused. The constraint lands on the last segment
    /// and replaces any constraint already there.
    pub fn add_relation(&mut self, path: &str, constraint: Option<ConstraintFn>) {
        let segments: Vec<&str> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut level = &mut self.roots;
        for segment in parents {
            level = &mut child_or_insert(level, segment).children;
        }
        let leaf = child_or_insert(level, last);
        if constraint.is_some() {
            leaf.constraint = constraint;
        }
    }

    pub fn roots(&self) -> &[EagerLoadNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every node as a dotted path, parents before children
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for root in &self.roots {
            root.collect_paths("", &mut paths);
        }
        paths
    }

    /// Longest path, in segments
    pub fn depth(&self) -> usize {
        self.roots.iter().map(EagerLoadNode::depth).max().unwrap_or(0)
    }

    /// Check the forest against the registry and the depth limit.
    ///
    /// Children of a `MorphTo` node are only known per record and are
    /// checked when they are reached.
    pub fn validate(&self, context: &OrmContext, meta: &ModelMeta) -> OrmResult<()> {
        let limit = context.config().max_eager_depth;
        let depth = self.depth();
        if depth > limit {
            return Err(ModelError::Relationship(format!(
                "Eager load depth {} exceeds the limit of {}",
                depth, limit
            )));
        }
        validate_nodes(context, meta, &self.roots)
    }

    /// Load every node onto a heterogeneous batch of records
    pub async fn load_for_models(
        &self,
        session: &Session<'_>,
        records: &mut [Box<dyn Record>],
    ) -> OrmResult<()> {
        if self.roots.is_empty() || records.is_empty() {
            return Ok(());
        }

        let mut validated = Vec::new();
        for record in records.iter() {
            let meta = record.model_meta();
            if !validated.contains(&meta.type_id) {
                self.validate(session.context(), meta)?;
                validated.push(meta.type_id);
            }
        }

        let mut refs: Vec<&mut (dyn Record + 'static)> =
            records.iter_mut().map(|record| record.as_mut()).collect();
        dispatch::load_nodes(session, &self.roots, &mut refs).await
    }

    /// Typed form of [`load_for_models`](Self::load_for_models)
    pub async fn load<M: Model>(&self, session: &Session<'_>, models: &mut [M]) -> OrmResult<()> {
        if self.roots.is_empty() || models.is_empty() {
            return Ok(());
        }
        self.validate(session.context(), M::meta())?;

        let mut refs: Vec<&mut (dyn Record + 'static)> =
            models.iter_mut().map(|model| model as &mut (dyn Record + 'static)).collect();
        dispatch::load_nodes(session, &self.roots, &mut refs).await
    }
}

fn validate_nodes(
    context: &OrmContext,
    meta: &ModelMeta,
    nodes: &[EagerLoadNode],
) -> OrmResult<()> {
    for node in nodes {
        let relationship = context.relationship(meta.model_name, &node.name)?;
        if node.children.is_empty() {
            continue;
        }
        if let Some(related) = relationship.related() {
            validate_nodes(context, related, &node.children)?;
        }
    }
    Ok(())
}
