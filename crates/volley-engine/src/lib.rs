// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign dispatch engine for Volley.
//!
//! The [`CampaignEngine`] is the collaborator-facing coordinator that:
//! - Materializes a campaign's contacts into delivery jobs and enqueues them
//! - Moves campaign status with compare-and-swap transitions
//! - Reconciles a paused campaign against the delivery ledger on resume
//! - Aggregates per-campaign statistics from the ledger
//! - Builds and runs [`DeliveryWorker`] loops that drain the queue

pub mod materializer;
pub mod pacing;
pub mod reconciler;
pub mod shutdown;
pub mod stats;
pub mod worker;

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use volley_core::{
    CampaignDefinition, CampaignDirectory, CampaignId, CampaignRuntimeStatus, CampaignStats,
    ContactRef, DeliveryLedger, Dispatcher, LedgerEntry, QueueDepth, VolleyError, WorkQueue,
};

pub use materializer::{Materializer, materialize, render_template};
pub use pacing::CampaignPacer;
pub use reconciler::ResumeReconciler;
pub use stats::StatsAggregator;
pub use worker::{DeliveryWorker, JobDisposition, WorkerSettings, WorkerStats, WorkerStatsSnapshot};

/// Composes the materializer, reconciler, stats aggregator, and workers over
/// one set of backends.
pub struct CampaignEngine {
    directory: Arc<dyn CampaignDirectory>,
    ledger: Arc<dyn DeliveryLedger>,
    queue: Arc<dyn WorkQueue>,
    dispatcher: Arc<dyn Dispatcher>,
    materializer: Materializer,
    reconciler: ResumeReconciler,
    stats: StatsAggregator,
    settings: WorkerSettings,
    pacer: Arc<CampaignPacer>,
    worker_stats: Arc<WorkerStats>,
}

impl CampaignEngine {
    pub fn new(
        directory: Arc<dyn CampaignDirectory>,
        ledger: Arc<dyn DeliveryLedger>,
        queue: Arc<dyn WorkQueue>,
        dispatcher: Arc<dyn Dispatcher>,
        settings: WorkerSettings,
    ) -> Self {
        let materializer = Materializer::new(Arc::clone(&queue));
        let reconciler = ResumeReconciler::new(
            Arc::clone(&directory),
            Arc::clone(&ledger),
            materializer.clone(),
        );
        let stats = StatsAggregator::new(Arc::clone(&directory), Arc::clone(&ledger));
        Self {
            directory,
            ledger,
            queue,
            dispatcher,
            materializer,
            reconciler,
            stats,
            settings,
            pacer: Arc::new(CampaignPacer::new()),
            worker_stats: Arc::new(WorkerStats::default()),
        }
    }

    /// Registers a campaign, enqueues one job per contact, and moves it
    /// `draft → processing`. Returns the number of jobs enqueued.
    ///
    /// A start that failed part way leaves the campaign in `draft`; calling
    /// this again retries it from the beginning.
    pub async fn start_campaign(
        &self,
        definition: &CampaignDefinition,
        contacts: &[ContactRef],
    ) -> Result<usize, VolleyError> {
        let id = &definition.id;
        materializer::pacing_delay_seconds(id, definition.messages_per_minute)?;
        if contacts.is_empty() {
            return Err(VolleyError::Config(format!(
                "campaign {id} has no contacts"
            )));
        }

        // Registration replaces a campaign left in draft by an interrupted
        // start; drop whatever that attempt managed to enqueue.
        self.directory.register(definition, contacts).await?;
        let leftover = self.queue.purge_campaign(id).await?;
        if leftover > 0 {
            debug!(campaign_id = %id, leftover, "dropped jobs of an earlier start attempt");
        }
        let generation = self.directory.generation(id).await?;
        let count = self
            .materializer
            .enqueue(definition, contacts, generation)
            .await?;
        self.directory
            .compare_and_set_status(
                id,
                CampaignRuntimeStatus::Draft,
                CampaignRuntimeStatus::Processing,
            )
            .await?;

        info!(campaign_id = %id, jobs = count, "campaign started");
        Ok(count)
    }

    /// Moves a campaign `processing → paused`.
    ///
    /// Jobs already queued or held by a worker are still delivered. Pausing
    /// an already-paused campaign succeeds without change.
    pub async fn pause_campaign(&self, id: &CampaignId) -> Result<(), VolleyError> {
        match self
            .directory
            .compare_and_set_status(
                id,
                CampaignRuntimeStatus::Processing,
                CampaignRuntimeStatus::Paused,
            )
            .await
        {
            Ok(()) => {
                info!(campaign_id = %id, "campaign paused");
                Ok(())
            }
            Err(VolleyError::StatusConflict {
                actual: CampaignRuntimeStatus::Paused,
                ..
            }) => Ok(()),
            Err(VolleyError::StatusConflict { actual, .. }) => Err(VolleyError::Precondition {
                campaign_id: id.clone(),
                message: format!("only a processing campaign can be paused, status is {actual}"),
            }),
            Err(e) => Err(e),
        }
    }

    /// Re-enqueues the contacts of a paused campaign that have no ledger
    /// entry yet. Returns the number of jobs enqueued.
    pub async fn resume_campaign(&self, id: &CampaignId) -> Result<usize, VolleyError> {
        self.reconciler.resume(id).await
    }

    pub async fn stats(&self, id: &CampaignId) -> Result<CampaignStats, VolleyError> {
        self.stats.stats(id).await
    }

    /// Ledger entries of a campaign in append order.
    pub async fn log(&self, id: &CampaignId) -> Result<Vec<LedgerEntry>, VolleyError> {
        self.stats.log(id).await
    }

    pub async fn queue_depth(&self) -> Result<QueueDepth, VolleyError> {
        self.queue.depth().await
    }

    /// A worker loop sharing this engine's backends, lanes, and counters.
    pub fn worker(&self, id: usize) -> DeliveryWorker {
        DeliveryWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.ledger),
            Arc::clone(&self.dispatcher),
            self.settings.clone(),
        )
        .with_id(id)
        .with_pacer(Arc::clone(&self.pacer))
        .with_stats(Arc::clone(&self.worker_stats))
    }

    /// Counters accumulated by every worker this engine has built.
    pub fn worker_stats(&self) -> WorkerStatsSnapshot {
        self.worker_stats.snapshot()
    }

    /// Runs `concurrency` worker loops until `cancel` fires and all of them
    /// have stopped.
    pub async fn run_workers(
        &self,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> WorkerStatsSnapshot {
        let concurrency = concurrency.max(1);
        info!(concurrency, "starting delivery workers");

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            let worker = self.worker(id);
            let cancel = cancel.clone();
            workers.spawn(async move { worker.run(cancel).await });
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "delivery worker task panicked");
            }
        }

        let snapshot = self.worker_stats();
        info!(
            processed = snapshot.processed,
            sent = snapshot.sent,
            failed = snapshot.failed,
            "all delivery workers stopped"
        );
        snapshot
    }
}
