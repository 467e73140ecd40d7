//! Database handle for the recording store.
//!
//! [`Database`] is the explicitly constructed session factory: it owns the
//! SQLite pool and hands out one transaction per repository call. Calls that
//! write take the write lock when they begin, so a read-then-write unit of
//! work never upgrades a stale snapshot.
//! [`SyncDb`] wraps it with an embedded runtime for blocking callers.

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite, Transaction};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::constants::EXPECTED_DB_VERSION;
use crate::error::{Error, Result};
use crate::queries::{ddl, metadata};

/// How long a writer waits for another writer to commit
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Pooled connection to the recording store
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) a file-based database, initialise the schema
    /// and verify the schema version.
    /// Enables WAL mode and foreign keys
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("SQLite database: {}", db_path.as_ref().display());

        let db = Self { pool };
        db.init_schema().await?;
        db.ensure_schema_version().await?;
        Ok(db)
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a read-only unit of work. All reads inside it see one snapshot.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Start a unit of work that will write.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front; competing writers wait
    /// up to [`BUSY_TIMEOUT`] instead of failing with a snapshot conflict.
    /// Dropping the transaction without committing rolls it back.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn init_schema(&self) -> Result<()> {
        for statement in ddl::all_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Stamp a fresh database with the expected version, or refuse one
    /// written by an incompatible build.
    pub async fn ensure_schema_version(&self) -> Result<()> {
        let found = self.query_metadata("version").await?;
        match found {
            None => {
                let sql = metadata::insert("version", EXPECTED_DB_VERSION);
                sqlx::query(&sql).execute(&self.pool).await?;
                Ok(())
            }
            Some(version) if version == EXPECTED_DB_VERSION => Ok(()),
            Some(version) => Err(Error::SchemaVersion {
                expected: EXPECTED_DB_VERSION.to_string(),
                found: version,
            }),
        }
    }

    /// Query a single metadata value by key
    pub async fn query_metadata(&self, key: &str) -> Result<Option<String>> {
        let sql = metadata::select_by_key(key);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Create a database in a temporary directory for testing.
/// Keep the returned guard alive for as long as the database is in use.
pub async fn create_test_connection_in_temporary_file() -> Result<(Database, tempfile::TempDir)> {
    let dir = tempfile::tempdir()?;
    let db = Database::open(dir.path().join("test.sqlite")).await?;
    Ok((db, dir))
}

/// Synchronous database wrapper that owns a runtime for blocking operations.
pub struct SyncDb {
    db: Database,
    runtime: Runtime,
}

impl SyncDb {
    /// Open a database with an embedded current-thread runtime
    pub fn connect(db_path: impl AsRef<Path>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let db = runtime.block_on(Database::open(db_path))?;
        Ok(Self { db, runtime })
    }

    /// Block on an async future using the embedded runtime
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Get a reference to the underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }
}
