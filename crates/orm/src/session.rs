//! Per-call execution handle
//!
//! A [`Session`] pairs a datastore with the ORM context and carries the
//! call's cancellation token and deadline. Every statement the crate issues
//! goes through it.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::backends::{DataStore, DatabaseRow, DatabaseValue};
use crate::config::OrmConfig;
use crate::context::OrmContext;
use crate::error::{ModelError, OrmResult};

#[derive(Clone)]
pub struct Session<'a> {
    store: &'a dyn DataStore,
    context: &'a OrmContext,
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn DataStore, context: &'a OrmContext) -> Self {
        Self {
            store,
            context,
            cancellation: None,
            deadline: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn context(&self) -> &'a OrmContext {
        self.context
    }

    pub fn store(&self) -> &'a dyn DataStore {
        self.store
    }

    pub fn config(&self) -> &'a OrmConfig {
        self.context.config()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().map_or(false, CancellationToken::is_cancelled)
    }

    /// Run a query issued for `target` (a table or relation label)
    pub async fn query(
        &self,
        target: &str,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        self.guard(target, sql, params, self.store.query(sql, params)).await
    }

    pub async fn query_one(
        &self,
        target: &str,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Option<Box<dyn DatabaseRow>>> {
        self.guard(target, sql, params, self.store.query_one(sql, params)).await
    }

    pub async fn execute(
        &self,
        target: &str,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<u64> {
        self.guard(target, sql, params, self.store.execute(sql, params)).await
    }

    /// Earliest of the session deadline and the configured per-query timeout
    fn effective_deadline(&self) -> Option<Instant> {
        let configured = self.config().query_timeout().map(|timeout| Instant::now() + timeout);
        match (self.deadline, configured) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn guard<T, F>(
        &self,
        target: &str,
        sql: &str,
        params: &[DatabaseValue],
        call: F,
    ) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
    {
        if self.is_cancelled() {
            return Err(ModelError::Cancelled(target.to_string()));
        }
        if self.config().log_queries {
            trace!("[{}] {} {:?}", target, sql, params);
        }

        let deadline = self.effective_deadline();
        if deadline.map_or(false, |deadline| deadline <= Instant::now()) {
            return Err(ModelError::Timeout(target.to_string()));
        }
        let bounded = async move {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, call)
                    .await
                    .unwrap_or_else(|_| Err(ModelError::Timeout(target.to_string()))),
                None => call.await,
            }
        };

        let outcome = match &self.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(ModelError::Cancelled(target.to_string())),
                result = bounded => result,
            },
            None => bounded.await,
        };

        outcome.map_err(|err| {
            if err.is_interrupt() {
                err
            } else {
                ModelError::query_execution(target, err)
            }
        })
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cancellable", &self.cancellation.is_some())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockStore, ValueRow};

    #[tokio::test]
    async fn test_errors_are_wrapped_with_target() {
        let store = MockStore::new();
        store.push_error("relation \"posts\" does not exist");
        let ctx = OrmContext::new();
        let session = ctx.session(&store);

        let err = session.query("posts", "SELECT * FROM posts", &[]).await.err().unwrap();
        match err {
            ModelError::QueryExecution { target, source } => {
                assert_eq!(target, "posts");
                assert!(matches!(*source, ModelError::Database(_)));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_session_issues_nothing() {
        let store = MockStore::new();
        let ctx = OrmContext::new();
        let token = CancellationToken::new();
        token.cancel();
        let session = ctx.session(&store).with_cancellation(token);

        let err = session.execute("posts", "DELETE FROM posts", &[]).await.err().unwrap();
        assert!(matches!(err, ModelError::Cancelled(ref target) if target == "posts"));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_elapsed_deadline_times_out() {
        let store = MockStore::new();
        store.push_rows(vec![ValueRow::new().with("id", 1i64)]);
        let ctx = OrmContext::new();
        let session = ctx.session(&store).with_deadline(Instant::now() - Duration::from_millis(1));

        let err = session.query("posts", "SELECT * FROM posts", &[]).await.err().unwrap();
        assert!(matches!(err, ModelError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_passthrough() {
        let store = MockStore::new();
        store.push_rows(vec![ValueRow::new().with("id", 1i64)]);
        let ctx = OrmContext::new();
        let session = ctx.session(&store).with_timeout(Duration::from_secs(5));

        let row = session.query_one("posts", "SELECT * FROM posts", &[]).await.unwrap();
        assert!(row.is_some());
    }
}
