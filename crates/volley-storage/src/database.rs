// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Clones of a [`Database`] share that thread.

use tracing::debug;
use volley_core::VolleyError;

use crate::migrations;

/// Handle to one SQLite database file with migrations applied.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Opens (or creates) the database at `path` in WAL mode and migrates it.
    pub async fn open(path: &str) -> Result<Self, VolleyError> {
        Self::open_with(path, true).await
    }

    /// Opens the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, VolleyError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| VolleyError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| VolleyError::Storage {
                source: Box::new(e),
            })?;
        let db = Self {
            conn,
            path: path.to_string(),
        };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, VolleyError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| VolleyError::Storage {
                source: Box::new(e),
            })?;
        let db = Self {
            conn,
            path: ":memory:".to_string(),
        };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), VolleyError> {
        self.conn
            .call(move |conn| -> Result<(), VolleyError> {
                let journal = if wal_mode { "WAL" } else { "DELETE" };
                conn.execute_batch(&format!(
                    "PRAGMA journal_mode = {journal};
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;"
                ))
                .map_err(|e| VolleyError::Storage {
                    source: Box::new(e),
                })?;
                migrations::run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => VolleyError::Storage {
                    source: Box::new(other),
                },
            })
    }

    /// The shared tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Path this database was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoints the WAL and closes the background connection.
    pub async fn close(self) -> Result<(), VolleyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(|e| VolleyError::Storage {
            source: Box::new(e),
        })?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `VolleyError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> VolleyError {
    VolleyError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("volley.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for table in ["campaign_contacts", "campaigns", "delivery_ledger", "dispatch_queue"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}: {tables:?}");
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("volley.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert_eq!(db.path(), path.to_str().unwrap());
        db.close().await.unwrap();
    }
}
