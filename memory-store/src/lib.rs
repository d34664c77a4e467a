//! `memory_store`: the `libsql`-backed implementation of
//! `memory_core::store::Store`.
//!
//! A single embedded database, WAL mode, one writer at a time enforced
//! by SQLite's own locking, foreign keys on. No connection pool: the
//! engine is meant to run inside one host process per database file, so
//! a fresh connection per call keeps the surface area small.

mod ops;
mod schema;

use memory_core::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry/backoff tuning for [`LibsqlStore::execute_with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// The embedded relational store.
pub struct LibsqlStore {
    db: libsql::Database,
    retry: RetryConfig,
}

impl LibsqlStore {
    /// Open (creating if absent) a local database file.
    pub async fn open(path: &str) -> Result<Self> {
        info!(path, "opening libsql database");
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to open {path}: {e}")))?;
        Ok(Self {
            db,
            retry: RetryConfig::default(),
        })
    }

    /// Open an in-process, non-persistent database, for tests and for
    /// `memory-cli` dry runs.
    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to open in-memory db: {e}")))?;
        Ok(Self {
            db,
            retry: RetryConfig::default(),
        })
    }

    async fn connection(&self) -> Result<libsql::Connection> {
        self.db
            .connect()
            .map_err(|e| Error::StoreUnavailable(format!("failed to get connection: {e}")))
    }

    /// Enable WAL mode with relaxed (non-`FULL`) durability for
    /// throughput, a generous busy timeout, and foreign key enforcement.
    /// Best-effort: a pragma failing is logged, not fatal, since some
    /// backends (`:memory:`) reject WAL silently.
    async fn apply_pragmas(&self, conn: &libsql::Connection) {
        for pragma in [
            "PRAGMA journal_mode=WAL",
            "PRAGMA synchronous=NORMAL",
            "PRAGMA busy_timeout=30000",
            "PRAGMA foreign_keys=ON",
        ] {
            if let Ok(mut rows) = conn.query(pragma, ()).await {
                while rows.next().await.is_ok_and(|r| r.is_some()) {}
            } else {
                warn!(pragma, "pragma failed, continuing with defaults");
            }
        }
    }

    /// Execute one statement with exponential-backoff retry. Used for
    /// schema DDL and for writes that might race with SQLite's own
    /// writer lock.
    async fn execute_with_retry(&self, conn: &libsql::Connection, sql: &str) -> Result<()> {
        let mut attempt = 0u32;
        let mut delay = Duration::from_millis(self.retry.base_delay_ms);
        loop {
            match conn.execute(sql, ()).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        error!(attempt, error = %e, "statement failed after retries");
                        return Err(Error::StoreUnavailable(format!(
                            "statement failed after {attempt} attempts: {e}"
                        )));
                    }
                    warn!(attempt, error = %e, "statement failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_millis(self.retry.max_delay_ms));
                }
            }
        }
    }

    async fn migrate_impl(&self) -> Result<()> {
        debug!("running schema migration");
        let conn = self.connection().await?;
        self.apply_pragmas(&conn).await;

        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_TABLE).await?;
        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_DOMAIN_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_STATUS_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_ACTIVATION_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_PATTERN_TYPE_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_MEMORIES_DOMAIN_ACTIVATION_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_TAGS_TABLE).await?;
        self.execute_with_retry(&conn, schema::CREATE_TAGS_TAG_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_COOCCURRENCE_TABLE).await?;
        self.execute_with_retry(&conn, schema::CREATE_COOCCURRENCE_FROM_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_COOCCURRENCE_TO_INDEX).await?;
        self.execute_with_retry(&conn, schema::CREATE_META_TABLE).await?;

        debug!("schema migration complete");
        Ok(())
    }
}


/// Tests against one shared on-disk database file, as opposed to the
/// `:memory:` instance every other test case opens for itself. Each test
/// reopens the same path with its own `LibsqlStore`/connection to check
/// that state written by one `LibsqlStore` handle is visible to another,
/// something an in-memory database (private to its connection) can't
/// exercise. Serialised because they share one file on disk.
#[cfg(test)]
mod shared_fixture_tests {
    use super::*;
    use memory_core::store::Store;
    use memory_core::types::{Memory, PatternType, Status};
    use serial_test::serial;

    fn fixture_memory(id: &str) -> Memory {
        let now = chrono::Utc::now();
        Memory {
            id: id.to_string(),
            title: "shared fixture row".to_string(),
            detail: "written by one handle, read back by another".to_string(),
            domain: "fixture".to_string(),
            pattern_type: Some(PatternType::Fact),
            source: "atomic".to_string(),
            source_section: String::new(),
            created: now,
            last_retrieved: now,
            retrieval_count: 0,
            activation: 1.0,
            content_hash: "fixturehash".to_string(),
            embedding: None,
            status: Status::Active,
            superseded_by: None,
            corrects: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn write_from_one_handle_is_visible_to_a_fresh_handle_on_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let path = path.to_str().unwrap();

        let writer = LibsqlStore::open(path).await.unwrap();
        writer.migrate().await.unwrap();
        writer.upsert_memory(&fixture_memory("fixture:atomic:a")).await.unwrap();
        drop(writer);

        let reader = LibsqlStore::open(path).await.unwrap();
        let found = reader.get_memory("fixture:atomic:a").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    #[serial]
    async fn migrate_on_a_reopened_file_preserves_prior_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let path = path.to_str().unwrap();

        let first = LibsqlStore::open(path).await.unwrap();
        first.migrate().await.unwrap();
        first.upsert_memory(&fixture_memory("fixture:atomic:b")).await.unwrap();
        drop(first);

        let second = LibsqlStore::open(path).await.unwrap();
        second.migrate().await.unwrap();
        let stats = second.stats().await.unwrap();
        assert_eq!(stats.total_active, 1);
    }
}
