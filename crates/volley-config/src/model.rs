// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Volley configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VolleyConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Ledger and campaign registry storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Durable work queue connection and consumption parameters.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Delivery worker behavior.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Messaging gateway request settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration for the ledger and campaign registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("volley").join("volley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("volley.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Durable work queue configuration.
///
/// The queue lives in a SQLite database; by default the same file as
/// [`StorageConfig::database_path`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Queue database path. `None` shares the storage database.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Name of the shared queue every campaign publishes to.
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Maximum jobs a single worker may hold unacknowledged.
    #[serde(default = "default_prefetch")]
    pub prefetch: usize,

    /// Seconds before an unacknowledged job is handed to another worker.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    /// How often an idle worker polls for new jobs, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Fixed wait between reconnect attempts after a queue transport error.
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            queue_name: default_queue_name(),
            prefetch: default_prefetch(),
            lease_secs: default_lease_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_interval_secs: default_reconnect_interval_secs(),
        }
    }
}

impl QueueConfig {
    /// Resolves the queue database path against the storage configuration.
    pub fn resolved_database_path<'a>(&'a self, storage: &'a StorageConfig) -> &'a str {
        self.database_path
            .as_deref()
            .unwrap_or(&storage.database_path)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }
}

fn default_queue_name() -> String {
    "campaign_dispatch".to_string()
}

fn default_prefetch() -> usize {
    1
}

fn default_lease_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_reconnect_interval_secs() -> u64 {
    5
}

/// How the delivery worker enforces campaign cadence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Sleep the job's delay after recording it, before acknowledging.
    #[default]
    Blocking,
    /// Keep one lane per campaign and only claim jobs from lanes that are due.
    PerCampaign,
}

/// Delivery worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Independent consumer loops run by one process.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Cadence enforcement strategy.
    #[serde(default)]
    pub pacing: PacingMode,

    /// Skip jobs whose idempotency key is already in the ledger.
    #[serde(default)]
    pub skip_already_attempted: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pacing: PacingMode::default(),
            skip_already_attempted: false,
        }
    }
}

fn default_concurrency() -> usize {
    1
}

/// Messaging gateway request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Timeout for `sendText` calls, in seconds.
    #[serde(default = "default_text_timeout_secs")]
    pub text_timeout_secs: u64,

    /// Timeout for `sendMedia` calls, in seconds.
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,

    /// Typing-indicator delay the gateway shows before a message, in milliseconds.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Presence hint sent with every message.
    #[serde(default = "default_presence")]
    pub presence: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            text_timeout_secs: default_text_timeout_secs(),
            media_timeout_secs: default_media_timeout_secs(),
            typing_delay_ms: default_typing_delay_ms(),
            presence: default_presence(),
        }
    }
}

fn default_text_timeout_secs() -> u64 {
    10
}

fn default_media_timeout_secs() -> u64 {
    30
}

fn default_typing_delay_ms() -> u64 {
    1200
}

fn default_presence() -> String {
    "composing".to_string()
}
