//! Collaborator seams for the remote data store.
//!
//! Pages never talk to Postgres directly: session lookups go through
//! [`AuthProvider`] and table reads/writes go through [`RecordStore`], so the
//! access gate and the data fetchers can be exercised against an in-memory
//! double.

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::web::models::Identity;

/// Errors surfaced by store collaborators.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// The backend could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflicting record: {0}")]
    Conflict(String),

    /// The row handed to a write was not a JSON object.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Password material for a username, used only by the login form.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: Uuid,
    pub password_hash: String,
}

/// Authentication collaborator.
///
/// `current_session` returns `Ok(None)` for unknown or expired tokens; `Err`
/// is reserved for a backend that cannot answer.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn current_session(&self, token: Uuid) -> StoreResult<Option<Identity>>;

    async fn credentials_for(&self, username: &str) -> StoreResult<Option<StoredCredentials>>;

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Uuid>;

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<Uuid>;

    async fn end_session(&self, token: Uuid) -> StoreResult<()>;

    /// Removes sessions past their expiry and returns how many were dropped.
    async fn purge_expired_sessions(&self) -> StoreResult<u64>;
}

/// Table query collaborator. Rows travel as JSON objects keyed by column.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>>;

    async fn insert(&self, table: &'static str, row: Value) -> StoreResult<()>;

    /// Deletes rows matching `filter`, returning the number removed.
    async fn delete(&self, table: &'static str, filter: &Filter) -> StoreResult<u64>;
}

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: &'static str,
    pub filter: Option<Filter>,
    /// Column to sort ascending by.
    pub order_by: Option<&'static str>,
}

impl SelectQuery {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }
}
