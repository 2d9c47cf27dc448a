// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `volley work`: long-running delivery worker process.

use tracing::info;
use volley_core::VolleyError;
use volley_engine::CampaignEngine;
use volley_engine::shutdown::install_signal_handler;

/// Runs `concurrency` delivery workers until SIGINT or SIGTERM.
///
/// Jobs prefetched but not yet started when the signal arrives are released
/// back to the queue before this returns.
pub async fn run_work(engine: &CampaignEngine, concurrency: usize) -> Result<(), VolleyError> {
    let cancel = install_signal_handler();
    let depth = engine.queue_depth().await?;
    info!(
        concurrency,
        pending = depth.pending,
        leased = depth.leased,
        "volley worker starting"
    );

    let snapshot = engine.run_workers(concurrency, cancel).await;

    info!(
        processed = snapshot.processed,
        skipped = snapshot.skipped,
        ledger_errors = snapshot.ledger_errors,
        "volley worker stopped"
    );
    Ok(())
}
