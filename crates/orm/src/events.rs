//! Model lifecycle hooks
//!
//! The "-ing" hooks run before the datastore is touched and may veto the
//! operation by returning an error. The "-ed" hooks run after the write.

use std::fmt;

use async_trait::async_trait;

use crate::backends::DatabaseValue;
use crate::event_error::EventError;

/// Lifecycle point a hook fires at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

impl ModelEvent {
    /// True for hooks that run before the write and can veto it
    pub fn is_before(self) -> bool {
        matches!(self, Self::Creating | Self::Updating | Self::Saving | Self::Deleting)
    }
}

impl fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Observer of one model type. Every hook defaults to a no-op.
///
/// `updating`/`updated` receive the dirty columns being written.
#[async_trait]
pub trait ModelObserver<T: Send + Sync>: Send + Sync {
    async fn creating(&self, _model: &mut T) -> Result<(), EventError> {
        Ok(())
    }

    async fn created(&self, _model: &T) -> Result<(), EventError> {
        Ok(())
    }

    async fn updating(
        &self,
        _model: &mut T,
        _changes: &[(String, DatabaseValue)],
    ) -> Result<(), EventError> {
        Ok(())
    }

    async fn updated(
        &self,
        _model: &T,
        _changes: &[(String, DatabaseValue)],
    ) -> Result<(), EventError> {
        Ok(())
    }

    async fn saving(&self, _model: &mut T) -> Result<(), EventError> {
        Ok(())
    }

    async fn saved(&self, _model: &T) -> Result<(), EventError> {
        Ok(())
    }

    async fn deleting(&self, _model: &T) -> Result<(), EventError> {
        Ok(())
    }

    async fn deleted(&self, _model: &T) -> Result<(), EventError> {
        Ok(())
    }
}
