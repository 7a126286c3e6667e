//! SQLite-backed credential store

use super::users::{CredentialStore, Identity, Role, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, error, info};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    login: String,
    password_hash: String,
    role: String,
    created_at: String, // RFC 3339
}

impl UserRecord {
    fn into_identity(self) -> Result<Identity, StoreError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(format!("corrupt role for '{}': {}", self.login, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Backend(format!("corrupt timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Identity {
            login: self.login,
            password_hash: self.password_hash,
            role,
            created_at,
        })
    }
}

/// Credential store persisting identities in a `users` table
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Open (creating if needed) the database at `url` and prepare the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true);

        // Every connection to ":memory:" is its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to open credential database: {}", e);
                backend(e)
            })?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                login TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create users table: {}", e);
            backend(e)
        })?;

        info!("Credential store ready");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT login, password_hash, role, created_at FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        record.map(UserRecord::into_identity).transpose()
    }

    async fn save(&self, identity: Identity) -> Result<Identity, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (login, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&identity.login)
        .bind(&identity.password_hash)
        .bind(identity.role.to_string())
        .bind(identity.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("User inserted: {}", identity.login);
                Ok(identity)
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(identity.login)),
            Err(e) => {
                error!("Failed to insert user: {}", e);
                Err(backend(e))
            }
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
