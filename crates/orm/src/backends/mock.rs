//! Scripted in-memory datastore
//!
//! `MockStore` answers statements from a FIFO of queued responses, falling
//! back to SQL-fragment rules and finally to an empty answer. Every statement
//! is logged with its parameters so callers can assert on the exact queries
//! an operation issued.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::core::{DataStore, DatabaseRow, DatabaseValue, ValueRow};
use crate::error::{ModelError, OrmResult};

/// A queued or rule-bound answer
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(Vec<ValueRow>),
    Affected(u64),
    Error(String),
}

/// A statement observed by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<MockResponse>,
    rules: Vec<(String, MockResponse)>,
    log: Vec<ExecutedQuery>,
}

#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue rows for the next statement
    pub fn push_rows(&self, rows: Vec<ValueRow>) -> &Self {
        self.state().queue.push_back(MockResponse::Rows(rows));
        self
    }

    /// Queue an affected-row count for the next statement
    pub fn push_affected(&self, affected: u64) -> &Self {
        self.state().queue.push_back(MockResponse::Affected(affected));
        self
    }

    /// Queue a failure for the next statement
    pub fn push_error(&self, message: &str) -> &Self {
        self.state().queue.push_back(MockResponse::Error(message.to_string()));
        self
    }

    /// Answer every statement containing `fragment` once the queue is drained
    pub fn on(&self, fragment: &str, response: MockResponse) -> &Self {
        self.state().rules.push((fragment.to_string(), response));
        self
    }

    /// All statements executed so far
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.state().log.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state().log.len()
    }

    /// Statements whose SQL contains `fragment`
    pub fn executed_matching(&self, fragment: &str) -> Vec<ExecutedQuery> {
        self.state()
            .log
            .iter()
            .filter(|q| q.sql.contains(fragment))
            .cloned()
            .collect()
    }

    pub fn reset_log(&self) {
        self.state().log.clear();
    }

    fn respond(&self, sql: &str, params: &[DatabaseValue]) -> Option<MockResponse> {
        let mut state = self.state();
        state.log.push(ExecutedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(response) = state.queue.pop_front() {
            return Some(response);
        }
        state
            .rules
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl DataStore for MockStore {
    async fn execute(&self, sql: &str, params: &[DatabaseValue]) -> OrmResult<u64> {
        match self.respond(sql, params) {
            Some(MockResponse::Affected(count)) => Ok(count),
            Some(MockResponse::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResponse::Error(message)) => Err(ModelError::Database(message)),
            None => Ok(0),
        }
    }

    async fn query(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> OrmResult<Vec<Box<dyn DatabaseRow>>> {
        match self.respond(sql, params) {
            Some(MockResponse::Rows(rows)) => Ok(rows
                .into_iter()
                .map(|row| Box::new(row) as Box<dyn DatabaseRow>)
                .collect()),
            Some(MockResponse::Affected(_)) | None => Ok(Vec::new()),
            Some(MockResponse::Error(message)) => Err(ModelError::Database(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_rules_then_empty() {
        let store = MockStore::new();
        store.push_rows(vec![ValueRow::new().with("id", 1)]);
        store.on("FROM tags", MockResponse::Rows(vec![ValueRow::new().with("id", 9)]));

        let first = store.query("SELECT * FROM posts", &[]).await.unwrap();
        assert_eq!(first.len(), 1);

        let ruled = store.query("SELECT * FROM tags", &[]).await.unwrap();
        assert_eq!(ruled[0].get_by_name("id").unwrap(), DatabaseValue::Int32(9));

        let empty = store.query("SELECT * FROM users", &[]).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(store.query_count(), 3);
    }

    #[tokio::test]
    async fn test_errors_and_log() {
        let store = MockStore::new();
        store.push_error("boom");

        let result = store
            .execute("DELETE FROM posts WHERE id = $1", &[DatabaseValue::Int64(4)])
            .await;
        assert!(matches!(result, Err(ModelError::Database(ref m)) if m == "boom"));
        assert_eq!(store.executed()[0].params, vec![DatabaseValue::Int64(4)]);
    }
}
