//! Error types for the ORM core
//!
//! Every fallible operation in the crate returns [`OrmResult`]. Datastore
//! failures are wrapped with the table or relation they were issued for so a
//! failed eager load can be traced back to the node that triggered it.

use thiserror::Error;

use crate::event_error::EventError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Datastore reported a failure
    #[error("Database error: {0}")]
    Database(String),

    /// Model not found in database
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Model validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Relationship configuration or loading failed
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// No relationship registered under this name for the model
    #[error("Relationship '{relation}' is not registered for model '{model}'")]
    RelationshipNotFound { model: String, relation: String },

    /// The relationship kind cannot serve the requested operation
    #[error("Relationship '{relation}' of kind {kind} does not support this operation")]
    UnsupportedRelationshipKind { kind: String, relation: String },

    /// A polymorphic discriminator names a type the context does not know
    #[error("Unknown morph type '{0}'")]
    UnknownMorphType(String),

    /// Scan destination is not struct shaped
    #[error("Cannot scan into '{0}': destination must serialize as a struct")]
    ScanTarget(String),

    /// Requested column is absent from a row
    #[error("Column '{0}' not found in row")]
    ColumnNotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Query building error
    #[error("Query error: {0}")]
    Query(String),

    /// Datastore call failed for the given table or relation
    #[error("Query against '{target}' failed: {source}")]
    QueryExecution {
        target: String,
        #[source]
        source: Box<ModelError>,
    },

    /// The session was cancelled before the query completed
    #[error("Query against '{0}' was cancelled")]
    Cancelled(String),

    /// The query exceeded the session deadline or the configured timeout
    #[error("Query against '{0}' timed out")]
    Timeout(String),

    /// A lifecycle observer refused the operation
    #[error("Operation vetoed: {0}")]
    Vetoed(String),

    /// Event system error
    #[error("Event error: {0}")]
    Event(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// Wrap a datastore failure with the table or relation it was issued for.
    pub fn query_execution(target: impl Into<String>, source: ModelError) -> Self {
        ModelError::QueryExecution {
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// True for outcomes produced by the session rather than the datastore.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, ModelError::Cancelled(_) | ModelError::Timeout(_))
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<EventError> for ModelError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::PropagationStopped { reason } => ModelError::Vetoed(reason),
            EventError::Validation { .. } => ModelError::Vetoed(err.to_string()),
            other => ModelError::Event(other.to_string()),
        }
    }
}
