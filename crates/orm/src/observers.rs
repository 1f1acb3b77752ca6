//! Observer registries keyed by model type

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::backends::DatabaseValue;
use crate::event_error::EventError;
use crate::events::ModelObserver;

/// Observers of one model type, run in registration order.
/// The first error stops the chain.
pub struct ObserverRegistry<T: Send + Sync> {
    observers: Vec<Arc<dyn ModelObserver<T>>>,
}

impl<T: Send + Sync> Clone for ObserverRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            observers: self.observers.clone(),
        }
    }
}

impl<T: Send + Sync> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> ObserverRegistry<T> {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub fn register(&mut self, observer: Arc<dyn ModelObserver<T>>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub async fn trigger_creating(&self, model: &mut T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.creating(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_created(&self, model: &T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.created(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_updating(
        &self,
        model: &mut T,
        changes: &[(String, DatabaseValue)],
    ) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.updating(model, changes).await?;
        }
        Ok(())
    }

    pub async fn trigger_updated(
        &self,
        model: &T,
        changes: &[(String, DatabaseValue)],
    ) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.updated(model, changes).await?;
        }
        Ok(())
    }

    pub async fn trigger_saving(&self, model: &mut T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.saving(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_saved(&self, model: &T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.saved(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_deleting(&self, model: &T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.deleting(model).await?;
        }
        Ok(())
    }

    pub async fn trigger_deleted(&self, model: &T) -> Result<(), EventError> {
        for observer in &self.observers {
            observer.deleted(model).await?;
        }
        Ok(())
    }
}

/// Per-type observer registries shared through the ORM context
#[derive(Default)]
pub struct ObserverManager {
    model_observers: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_for_model<T: Send + Sync + 'static>(
        &self,
        observer: Arc<dyn ModelObserver<T>>,
    ) {
        let mut entry = self
            .model_observers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                Box::new(ObserverRegistry::<T>::new()) as Box<dyn Any + Send + Sync>
            });
        if let Some(registry) = entry.value_mut().downcast_mut::<ObserverRegistry<T>>() {
            registry.register(observer);
        }
    }

    /// Snapshot of the registry for `T`; hooks run on the copy so no map
    /// guard is held across an await.
    pub fn get_registry_for<T: Send + Sync + 'static>(&self) -> Option<ObserverRegistry<T>> {
        self.model_observers
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().downcast_ref::<ObserverRegistry<T>>().cloned())
    }

    pub fn has_observers_for<T: Send + Sync + 'static>(&self) -> bool {
        self.observer_count_for::<T>() > 0
    }

    pub fn observer_count_for<T: Send + Sync + 'static>(&self) -> usize {
        self.model_observers
            .get(&TypeId::of::<T>())
            .and_then(|entry| {
                entry
                    .value()
                    .downcast_ref::<ObserverRegistry<T>>()
                    .map(ObserverRegistry::observer_count)
            })
            .unwrap_or(0)
    }
}

impl fmt::Debug for ObserverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverManager")
            .field("model_types", &self.model_observers.len())
            .finish()
    }
}
