//! In-memory store double for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{
    AuthProvider, Filter, RecordStore, SelectQuery, StoreError, StoreResult, StoredCredentials,
};
use crate::web::models::Identity;

struct MemoryUser {
    id: Uuid,
    username: String,
    password_hash: String,
}

struct MemorySession {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    users: Vec<MemoryUser>,
    sessions: HashMap<Uuid, MemorySession>,
    tables: HashMap<&'static str, Vec<Value>>,
    selects: HashMap<&'static str, usize>,
    failing_tables: HashSet<&'static str>,
    auth_down: bool,
}

/// Rows are returned in insertion order; the order hint of a query is
/// ignored so callers cannot rely on the collaborator for sorting.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_rows(&self, table: &'static str, rows: Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        inner.tables.entry(table).or_default().extend(rows);
    }

    pub fn rows(&self, table: &'static str) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    /// Makes every read and write against `table` fail.
    pub fn fail_table(&self, table: &'static str) {
        self.inner.lock().unwrap().failing_tables.insert(table);
    }

    /// Makes the auth collaborator unreachable.
    pub fn take_auth_down(&self) {
        self.inner.lock().unwrap().auth_down = true;
    }

    pub fn selects_for(&self, table: &'static str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.selects.get(table).copied().unwrap_or(0)
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().users.push(MemoryUser {
            id,
            username: username.to_string(),
            password_hash: String::new(),
        });
        id
    }

    pub fn add_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Uuid {
        let token = Uuid::new_v4();
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(token, MemorySession { user_id, expires_at });
        token
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    fn check_auth(inner: &Inner) -> StoreResult<()> {
        if inner.auth_down {
            return Err(StoreError::Unavailable("auth backend down".to_string()));
        }
        Ok(())
    }

    fn check_table(inner: &Inner, table: &'static str) -> StoreResult<()> {
        if inner.failing_tables.contains(table) {
            return Err(StoreError::Unavailable(format!("{table} unavailable")));
        }
        Ok(())
    }
}

fn matches(row: &Value, filter: Option<&Filter>) -> bool {
    match filter {
        Some(filter) => row.get(filter.column) == Some(&filter.value),
        None => true,
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn current_session(&self, token: Uuid) -> StoreResult<Option<Identity>> {
        let inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;

        let Some(session) = inner.sessions.get(&token) else {
            return Ok(None);
        };
        if session.expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(inner
            .users
            .iter()
            .find(|user| user.id == session.user_id)
            .map(|user| Identity {
                id: user.id,
                username: user.username.clone(),
            }))
    }

    async fn credentials_for(&self, username: &str) -> StoreResult<Option<StoredCredentials>> {
        let inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        Ok(inner
            .users
            .iter()
            .find(|user| user.username == username)
            .map(|user| StoredCredentials {
                user_id: user.id,
                password_hash: user.password_hash.clone(),
            }))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        if inner.users.iter().any(|user| user.username == username) {
            return Err(StoreError::Conflict(username.to_string()));
        }
        let id = Uuid::new_v4();
        inner.users.push(MemoryUser {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });
        Ok(id)
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        let token = Uuid::new_v4();
        inner
            .sessions
            .insert(token, MemorySession { user_id, expires_at });
        Ok(token)
    }

    async fn end_session(&self, token: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        inner.sessions.remove(&token);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> StoreResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_auth(&inner)?;
        let now = Utc::now();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, session| session.expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        let mut inner = self.inner.lock().unwrap();
        *inner.selects.entry(query.table).or_default() += 1;
        Self::check_table(&inner, query.table)?;

        Ok(inner
            .tables
            .get(query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, query.filter.as_ref()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &'static str, row: Value) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_table(&inner, table)?;
        if !row.is_object() {
            return Err(StoreError::InvalidRow(table.to_string()));
        }
        inner.tables.entry(table).or_default().push(row);
        Ok(())
    }

    async fn delete(&self, table: &'static str, filter: &Filter) -> StoreResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_table(&inner, table)?;
        let Some(rows) = inner.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, Some(filter)));
        Ok((before - rows.len()) as u64)
    }
}
