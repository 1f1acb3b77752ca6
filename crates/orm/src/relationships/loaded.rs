//! Loaded relation storage attached to every record

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Model, Record};

/// Result of loading one relation for one parent
#[derive(Debug, Clone)]
pub enum Loaded {
    /// Single-valued relation; `None` when nothing matched
    One(Option<Arc<dyn Record>>),
    /// Collection relation; empty when nothing matched
    Many(Vec<Arc<dyn Record>>),
}

impl Loaded {
    pub fn empty(many: bool) -> Self {
        if many {
            Loaded::Many(Vec::new())
        } else {
            Loaded::One(None)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Loaded::One(record) => usize::from(record.is_some()),
            Loaded::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<&Arc<dyn Record>> {
        match self {
            Loaded::One(record) => record.iter().collect(),
            Loaded::Many(records) => records.iter().collect(),
        }
    }
}

/// Relations loaded onto a record, keyed by relation name
#[derive(Debug, Clone, Default)]
pub struct Relations {
    loaded: HashMap<String, Loaded>,
}

impl Relations {
    pub fn set(&mut self, name: &str, loaded: Loaded) {
        self.loaded.insert(name.to_string(), loaded);
    }

    pub fn get(&self, name: &str) -> Option<&Loaded> {
        self.loaded.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn unload(&mut self, name: &str) -> Option<Loaded> {
        self.loaded.remove(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.loaded.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Typed access to a single-valued relation.
    ///
    /// `None` when the relation is not loaded, matched nothing, or holds a
    /// record of another type.
    pub fn one<M: Model>(&self, name: &str) -> Option<&M> {
        match self.loaded.get(name)? {
            Loaded::One(record) => record.as_deref()?.downcast_ref::<M>(),
            Loaded::Many(records) => records.first()?.downcast_ref::<M>(),
        }
    }

    /// Typed access to a collection relation. Records of other types are skipped.
    pub fn many<M: Model>(&self, name: &str) -> Vec<&M> {
        match self.loaded.get(name) {
            Some(loaded) => loaded
                .records()
                .into_iter()
                .filter_map(|record| record.downcast_ref::<M>())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
