use std::time::Duration;

use serde::Deserialize;

use crate::error::{ModelError, OrmResult};

/// Tuning for batched loading and query execution.
///
/// Deserializable so hosts can embed it in their own configuration files;
/// missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Maximum number of keys bound into a single `IN (...)` query
    pub max_batch_size: usize,
    /// Maximum depth of nested eager-load paths
    pub max_eager_depth: usize,
    /// Per-query timeout in milliseconds
    pub query_timeout_ms: Option<u64>,
    /// Trace rendered SQL and parameters
    pub log_queries: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_eager_depth: 10,
            query_timeout_ms: None,
            log_queries: false,
        }
    }
}

impl OrmConfig {
    pub fn validate(&self) -> OrmResult<()> {
        if self.max_batch_size == 0 {
            return Err(ModelError::Configuration(
                "max_batch_size must be greater than zero".into(),
            ));
        }
        if self.max_eager_depth == 0 {
            return Err(ModelError::Configuration(
                "max_eager_depth must be greater than zero".into(),
            ));
        }
        if self.query_timeout_ms == Some(0) {
            return Err(ModelError::Configuration(
                "query_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrmConfig::default();
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.max_eager_depth, 10);
        assert!(config.query_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: OrmConfig =
            serde_json::from_str(r#"{"max_batch_size": 50, "query_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.max_eager_depth, 10);
        assert_eq!(config.query_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_rejects_zero_batch() {
        let config = OrmConfig {
            max_batch_size: 0,
            ..OrmConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::Configuration(_))));
    }
}
