use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};
use uuid::Uuid;

use super::{
    AuthProvider, Filter, RecordStore, SelectQuery, StoreError, StoreResult,
    StoredCredentials,
};
use crate::web::models::Identity;

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed implementation of both store collaborators.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Self { pool })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
}

#[async_trait]
impl AuthProvider for PgStore {
    async fn current_session(&self, token: Uuid) -> StoreResult<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT users.id, users.username FROM sessions JOIN users ON users.id = sessions.user_id WHERE sessions.id = $1 AND sessions.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn credentials_for(&self, username: &str) -> StoreResult<Option<StoredCredentials>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredCredentials {
            user_id: row.id,
            password_hash: row.password_hash,
        }))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<Uuid> {
        let token = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn end_session(&self, token: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        let sql = build_select_sql(query);
        let mut statement = sqlx::query_scalar::<_, Value>(&sql);
        if let Some(filter) = &query.filter {
            statement = statement.bind(Json(filter.value.clone()));
        }
        let rows = statement.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn insert(&self, table: &'static str, row: Value) -> StoreResult<()> {
        let sql = build_insert_sql(table, &row)?;
        sqlx::query(&sql)
            .bind(Json(row))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, table: &'static str, filter: &Filter) -> StoreResult<u64> {
        let sql = format!(
            "DELETE FROM {table} AS t WHERE to_jsonb(t) -> '{column}' = $1::jsonb",
            table = quote_ident(table),
            column = filter.column.replace('\'', "''"),
        );
        let result = sqlx::query(&sql)
            .bind(Json(filter.value.clone()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn build_select_sql(query: &SelectQuery) -> String {
    let mut sql = format!("SELECT to_jsonb(t) FROM {} AS t", quote_ident(query.table));

    if let Some(filter) = &query.filter {
        sql.push_str(&format!(
            " WHERE to_jsonb(t) -> '{}' = $1::jsonb",
            filter.column.replace('\'', "''")
        ));
    }

    if let Some(column) = query.order_by {
        sql.push_str(&format!(" ORDER BY t.{} ASC", quote_ident(column)));
    }

    sql
}

fn build_insert_sql(table: &str, row: &Value) -> StoreResult<String> {
    let object = row
        .as_object()
        .ok_or_else(|| StoreError::InvalidRow(format!("expected object for {table}")))?;
    if object.is_empty() {
        return Err(StoreError::InvalidRow(format!("no columns for {table}")));
    }

    let columns = object
        .keys()
        .map(|key| quote_ident(key))
        .collect::<Vec<_>>()
        .join(", ");
    let table = quote_ident(table);

    Ok(format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)"
    ))
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
