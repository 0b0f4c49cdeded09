//! Database client for VacationStay
//!
//! A thin wrapper around an `sqlx::Any` pool, so the same code runs against
//! SQLite in development and tests and against a server database in production.

use crate::error::{map_lock_error, DbError};
use crate::query::is_identifier;
use sqlx::AnyConnection;
use sqlx::pool::{PoolConnection, PoolOptions};
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vacationstay_config::{AppConfig, DatabaseConfig};

/// Type alias for a database transaction
pub type DbTransaction<'a> = Transaction<'a, sqlx::Any>;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Database client for VacationStay
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
}

impl DbClient {
    /// Create a new database client from the `[database]` section of the application config.
    ///
    /// # Errors
    ///
    /// Fails if the section is missing, the URL is empty, or the connection fails.
    pub async fn new(config: &AppConfig) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    /// Create a new database client from a database configuration
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }

        let max_connections = db_config
            .max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let pool = Self::create_pool(&db_config.url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Create a new database client from a database URL, e.g. `sqlite::memory:`
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }

        let pool = Self::create_pool(db_url, DEFAULT_MAX_CONNECTIONS).await?;
        Ok(Self { pool })
    }

    /// Create a connection pool
    ///
    /// SQLite database files and their parent directories are created when
    /// missing. An in-memory SQLite database lives only as long as its single
    /// connection, so such pools hold exactly one connection that is never
    /// reaped.
    async fn create_pool(db_url: &str, max_connections: u32) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        sqlx::any::install_default_drivers();

        let in_memory = db_url.starts_with("sqlite:") && db_url.contains(":memory:");

        let pool_options = if in_memory {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::<sqlx::Any>::new()
                .max_connections(max_connections.max(1))
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        if db_url.starts_with("sqlite:") && !in_memory {
            Self::ensure_sqlite_file(db_url)?;
        }

        let connect_options = sqlx::any::AnyConnectOptions::from_str(db_url)
            .map_err(|e| DbError::UrlError(e.to_string()))?;

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully");
        Ok(pool)
    }

    /// Creates the SQLite file (and its directory) behind a `sqlite:` URL.
    fn ensure_sqlite_file(db_url: &str) -> Result<(), DbError> {
        // Handle both "sqlite:example.db" and "sqlite://example.db"
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);

        if db_path.is_empty() {
            return Ok(());
        }

        let path = Path::new(db_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating directory for SQLite database: {:?}", dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    error!("Failed to create directory for SQLite database: {}", e);
                    DbError::PoolError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        if !path.exists() {
            debug!("Creating empty SQLite database file: {}", db_path);
            std::fs::File::create(path).map_err(|e| {
                error!("Failed to create SQLite database file: {}", e);
                DbError::PoolError(format!("Failed to create database file: {}", e))
            })?;
        }
        Ok(())
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    /// Begin a transaction
    pub async fn begin(&self) -> Result<DbTransaction<'_>, DbError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    /// Begin a transaction that already holds the write lock for row `id` of
    /// `table`, so that reads inside it cannot be invalidated by a concurrent
    /// writer of the same row.
    ///
    /// SQLite locks the whole database with `BEGIN IMMEDIATE`. Other backends
    /// lock the row with `SELECT ... FOR UPDATE`.
    pub async fn begin_locked(&self, table: &str, id: i64) -> Result<LockedConnection, DbError> {
        if !is_identifier(table) {
            return Err(DbError::QueryError(format!("Invalid identifier: {:?}", table)));
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DbError::PoolError(e.to_string()))?;
        let sqlite = conn.backend_name().eq_ignore_ascii_case("sqlite");
        let begin = if sqlite { "BEGIN IMMEDIATE" } else { "BEGIN" };
        sqlx::query(begin)
            .execute(&mut *conn)
            .await
            .map_err(map_lock_error)?;

        let mut locked = LockedConnection { conn: Some(conn) };
        if !sqlite {
            let sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", table);
            sqlx::query(&sql)
                .bind(id)
                .fetch_optional(locked.connection()?)
                .await
                .map_err(map_lock_error)?;
        }
        debug!("Holding write lock on {} {}", table, id);
        Ok(locked)
    }

    /// Execute a statement that returns no rows, yielding the number of rows affected
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database answers a trivial query
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// A pooled connection inside a transaction opened by [`DbClient::begin_locked`].
///
/// Finish it with [`commit`](Self::commit) or [`rollback`](Self::rollback).
/// If it is dropped unfinished, the connection is closed instead of being
/// returned to the pool, which rolls the transaction back.
pub struct LockedConnection {
    conn: Option<PoolConnection<sqlx::Any>>,
}

impl LockedConnection {
    /// The connection to run statements on.
    pub fn connection(&mut self) -> Result<&mut AnyConnection, DbError> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| DbError::TransactionError("Transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> Result<(), DbError> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, statement: &str) -> Result<(), DbError> {
        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| DbError::TransactionError("Transaction already finished".to_string()))?;
        match sqlx::query(statement).execute(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("{} failed: {}", statement, e);
                drop(conn.detach());
                Err(map_lock_error(e))
            }
        }
    }
}

impl Drop for LockedConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("Locked transaction dropped without commit or rollback; closing its connection");
            drop(conn.detach());
        }
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient")
    }
}
