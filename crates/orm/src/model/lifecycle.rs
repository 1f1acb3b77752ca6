//! Lifecycle hook dispatch for persistence operations

use tracing::warn;

use super::core_trait::Model;
use crate::backends::DatabaseValue;
use crate::context::OrmContext;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::observers::ObserverRegistry;

/// Observers of `M` captured for the duration of one operation
pub(crate) struct ModelLifecycle<M: Model> {
    registry: Option<ObserverRegistry<M>>,
}

impl<M: Model> ModelLifecycle<M> {
    pub(crate) fn for_model(context: &OrmContext) -> Self {
        Self {
            registry: context.observers().get_registry_for::<M>(),
        }
    }

    /// Run a before-hook. Any observer error vetoes the operation.
    pub(crate) async fn before(
        &self,
        event: ModelEvent,
        model: &mut M,
        changes: &[(String, DatabaseValue)],
    ) -> ModelResult<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };

        let outcome = match event {
            ModelEvent::Creating => registry.trigger_creating(model).await,
            ModelEvent::Updating => registry.trigger_updating(model, changes).await,
            ModelEvent::Saving => registry.trigger_saving(model).await,
            ModelEvent::Deleting => registry.trigger_deleting(model).await,
            ModelEvent::Created
            | ModelEvent::Updated
            | ModelEvent::Saved
            | ModelEvent::Deleted => Ok(()),
        };

        outcome.map_err(|err| {
            warn!("{} {} vetoed: {}", M::model_name(), event, err);
            ModelError::Vetoed(format!("{} {}: {}", M::model_name(), event, err))
        })
    }

    /// Run an after-hook; the write has already happened
    pub(crate) async fn after(
        &self,
        event: ModelEvent,
        model: &M,
        changes: &[(String, DatabaseValue)],
    ) -> ModelResult<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };

        let outcome = match event {
            ModelEvent::Created => registry.trigger_created(model).await,
            ModelEvent::Updated => registry.trigger_updated(model, changes).await,
            ModelEvent::Saved => registry.trigger_saved(model).await,
            ModelEvent::Deleted => registry.trigger_deleted(model).await,
            ModelEvent::Creating
            | ModelEvent::Updating
            | ModelEvent::Saving
            | ModelEvent::Deleting => Ok(()),
        };
        outcome.map_err(ModelError::from)
    }
}
