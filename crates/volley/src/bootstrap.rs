// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires the configured storage, queue, and gateway into a [`CampaignEngine`].

use std::sync::Arc;

use tracing::{debug, info};
use volley_config::VolleyConfig;
use volley_core::VolleyError;
use volley_engine::{CampaignEngine, WorkerSettings};
use volley_gateway::{GatewayClient, GatewayOptions};
use volley_storage::{Database, SqliteCampaignDirectory, SqliteLedger, SqliteWorkQueue};

/// Opens the databases named by `config` and builds the engine over them.
pub async fn build_engine(config: &VolleyConfig) -> Result<CampaignEngine, VolleyError> {
    let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
    debug!(path = %config.storage.database_path, "storage opened");

    let queue_path = config.queue.resolved_database_path(&config.storage);
    let queue = if queue_path == config.storage.database_path {
        SqliteWorkQueue::new(db.clone(), &config.queue.queue_name, config.queue.lease())
    } else {
        SqliteWorkQueue::open(queue_path, &config.queue.queue_name, config.queue.lease()).await?
    };
    info!(
        queue = %config.queue.queue_name,
        path = queue_path,
        "work queue ready"
    );

    let dispatcher = GatewayClient::new(GatewayOptions::from(&config.gateway))?;

    Ok(CampaignEngine::new(
        Arc::new(SqliteCampaignDirectory::new(db.clone())),
        Arc::new(SqliteLedger::new(db)),
        Arc::new(queue),
        Arc::new(dispatcher),
        WorkerSettings::from_config(config),
    ))
}

#[cfg(test)]
mod tests {
    use volley_core::CampaignId;

    use super::*;

    #[tokio::test]
    async fn engine_builds_over_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VolleyConfig::default();
        config.storage.database_path = dir.path().join("volley.db").display().to_string();

        let engine = build_engine(&config).await.unwrap();
        let depth = engine.queue_depth().await.unwrap();
        assert_eq!(depth.pending, 0);

        let err = engine.stats(&CampaignId::from("missing")).await.unwrap_err();
        assert!(matches!(err, VolleyError::NotFound(_)));
    }

    #[tokio::test]
    async fn queue_can_live_in_a_separate_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VolleyConfig::default();
        config.storage.database_path = dir.path().join("volley.db").display().to_string();
        config.queue.database_path = Some(dir.path().join("queue.db").display().to_string());

        let engine = build_engine(&config).await.unwrap();
        assert_eq!(engine.queue_depth().await.unwrap().leased, 0);
        assert!(dir.path().join("queue.db").exists());
    }
}
