//! Connection pool for the audit database.
//!
//! r2d2 over SQLite in WAL mode: readers never block the single writer,
//! and writers wait on `busy_timeout` instead of failing immediately.

use crate::{migrations, DatabaseError, DatabaseResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Pragmas applied to every new connection.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA cache_size = -16000;
    PRAGMA temp_store = MEMORY;
    PRAGMA busy_timeout = 5000;
";

/// Configuration for the database pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum connections in the pool.
    pub max_size: u32,
    /// Minimum idle connections to maintain.
    pub min_idle: Option<u32>,
    /// Connection acquisition timeout.
    pub connection_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 8,
            min_idle: Some(1),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// Thread-safe database connection pool.
pub struct DatabasePool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl DatabasePool {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path, config: PoolConfig) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        info!(
            path = %path.display(),
            max_size = config.max_size,
            "Audit database pool created"
        );

        let db = Self {
            pool,
            path: path.to_path_buf(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run pending migrations on a dedicated connection.
    pub fn migrate(&self) -> DatabaseResult<()> {
        let conn = self.get()?;
        migrations::run_migrations(&conn)
    }

    /// Get a connection from the pool.
    ///
    /// Blocks until a connection is available or the timeout is reached.
    pub fn get(&self) -> DatabaseResult<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the pool by acquiring a connection and running a trivial query.
    pub fn health_check(&self) -> DatabaseResult<()> {
        let conn = self.get()?;
        conn.execute_batch("SELECT 1")?;
        debug!("Audit database health check passed");
        Ok(())
    }
}
