// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` assembles a complete engine over a temp SQLite database and
//! a [`ScriptedDispatcher`], and exposes each backend for assertions.

use std::sync::Arc;
use std::time::Duration;

use volley_config::PacingMode;
use volley_core::VolleyError;
use volley_engine::{CampaignEngine, DeliveryWorker, WorkerSettings};
use volley_storage::{Database, SqliteCampaignDirectory, SqliteLedger, SqliteWorkQueue};

use crate::mock_dispatcher::ScriptedDispatcher;

/// Queue name used by every harness.
pub const TEST_QUEUE: &str = "test_dispatch";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    settings: WorkerSettings,
    lease: Duration,
    dispatcher: Option<ScriptedDispatcher>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            settings: WorkerSettings {
                poll_interval: Duration::from_millis(10),
                reconnect_interval: Duration::from_millis(10),
                ..WorkerSettings::default()
            },
            lease: Duration::from_secs(60),
            dispatcher: None,
        }
    }

    pub fn with_pacing(mut self, pacing: PacingMode) -> Self {
        self.settings.pacing = pacing;
        self
    }

    pub fn with_skip_already_attempted(mut self, skip: bool) -> Self {
        self.settings.skip_already_attempted = skip;
        self
    }

    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.settings.prefetch = prefetch;
        self
    }

    /// Lease after which unacknowledged jobs are redelivered.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: ScriptedDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Build the harness, creating the temp database and all backends.
    pub async fn build(self) -> Result<TestHarness, VolleyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| VolleyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("volley-test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let db = Database::open(&db_path_str).await?;
        let queue = Arc::new(SqliteWorkQueue::new(db.clone(), TEST_QUEUE, self.lease));
        let ledger = Arc::new(SqliteLedger::new(db.clone()));
        let directory = Arc::new(SqliteCampaignDirectory::new(db.clone()));
        let dispatcher = Arc::new(self.dispatcher.unwrap_or_default());

        let engine = CampaignEngine::new(
            directory.clone(),
            ledger.clone(),
            queue.clone(),
            dispatcher.clone(),
            self.settings.clone(),
        );

        Ok(TestHarness {
            engine,
            queue,
            ledger,
            directory,
            dispatcher,
            database: db,
            settings: self.settings,
            db_path: db_path_str,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine over temp storage with a scripted dispatcher.
pub struct TestHarness {
    pub engine: CampaignEngine,
    pub queue: Arc<SqliteWorkQueue>,
    pub ledger: Arc<SqliteLedger>,
    pub directory: Arc<SqliteCampaignDirectory>,
    pub dispatcher: Arc<ScriptedDispatcher>,
    pub database: Database,
    pub settings: WorkerSettings,
    /// Path of the temp database file.
    pub db_path: String,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, VolleyError> {
        Self::builder().build().await
    }

    pub fn worker(&self) -> DeliveryWorker {
        self.engine.worker(0)
    }

    /// Processes deliveries one receive at a time until the queue has none
    /// available. Returns the number of deliveries handled.
    pub async fn drain(&self) -> Result<usize, VolleyError> {
        let worker = self.worker();
        let mut handled = 0;
        loop {
            let received = worker.run_once().await?;
            if received == 0 {
                return Ok(handled);
            }
            handled += received;
        }
    }

    /// Processes exactly `n` receives, stopping early if the queue is empty.
    pub async fn process(&self, n: usize) -> Result<usize, VolleyError> {
        let worker = self.worker();
        let mut handled = 0;
        for _ in 0..n {
            let received = worker.run_once().await?;
            if received == 0 {
                break;
            }
            handled += received;
        }
        Ok(handled)
    }
}
