// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery worker: receive, dispatch, record, pace, acknowledge.
//!
//! Each [`DeliveryWorker`] is one sequential consumer loop. Scale-out comes
//! from running several loops (or processes) against the same queue; the
//! queue's lease protocol is the only coordination between them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use volley_config::{PacingMode, VolleyConfig};
use volley_core::{
    Delivery, DeliveryJob, DeliveryLedger, DeliveryStatus, DispatchOutcome, Dispatcher,
    NewLedgerEntry, VolleyError, WorkQueue,
};

use crate::pacing::CampaignPacer;

/// Runtime knobs for a worker loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Jobs claimed per receive.
    pub prefetch: usize,
    /// Wait between receives when the queue is empty.
    pub poll_interval: Duration,
    /// Fixed backoff between reconnect attempts.
    pub reconnect_interval: Duration,
    pub pacing: PacingMode,
    pub skip_already_attempted: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&VolleyConfig::default())
    }
}

impl WorkerSettings {
    pub fn from_config(config: &VolleyConfig) -> Self {
        Self {
            prefetch: config.queue.prefetch.max(1),
            poll_interval: config.queue.poll_interval(),
            reconnect_interval: config.queue.reconnect_interval(),
            pacing: config.worker.pacing,
            skip_already_attempted: config.worker.skip_already_attempted,
        }
    }
}

/// Counters shared by the worker loops of one process.
#[derive(Debug, Default)]
pub struct WorkerStats {
    processed: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    ledger_errors: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStatsSnapshot {
    /// Jobs taken to acknowledgment, dispatched or skipped.
    pub processed: u64,
    pub sent: u64,
    pub failed: u64,
    pub skipped: u64,
    pub ledger_errors: u64,
}

impl WorkerStats {
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            ledger_errors: self.ledger_errors.load(Ordering::Relaxed),
        }
    }

    fn record_dispatch(&self, status: DeliveryStatus) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        match status {
            DeliveryStatus::Sent => self.sent.fetch_add(1, Ordering::Relaxed),
            DeliveryStatus::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn record_skip(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened to one received delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDisposition {
    /// Dispatched, recorded (best effort), and acknowledged.
    Dispatched(DeliveryStatus),
    /// Its idempotency key was already in the ledger; acknowledged unsent.
    Skipped,
    /// Its campaign lane was busy; returned to the queue.
    Deferred,
    /// Its lease ran out while it waited in the batch and another worker
    /// claimed it; left to that worker.
    LeaseLost,
}

/// One sequential consumer loop over the durable work queue.
pub struct DeliveryWorker {
    id: usize,
    queue: Arc<dyn WorkQueue>,
    ledger: Arc<dyn DeliveryLedger>,
    dispatcher: Arc<dyn Dispatcher>,
    settings: WorkerSettings,
    pacer: Arc<CampaignPacer>,
    stats: Arc<WorkerStats>,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        ledger: Arc<dyn DeliveryLedger>,
        dispatcher: Arc<dyn Dispatcher>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            id: 0,
            queue,
            ledger,
            dispatcher,
            settings,
            pacer: Arc::new(CampaignPacer::new()),
            stats: Arc::new(WorkerStats::default()),
        }
    }

    /// Numeric id used in log fields.
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    /// Shares a lane table with sibling loops.
    pub fn with_pacer(mut self, pacer: Arc<CampaignPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Shares counters with sibling loops.
    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Runs until `cancel` fires, then returns the counters.
    ///
    /// The job in hand always completes. Jobs prefetched but not started
    /// when the token fires are returned to the queue.
    pub async fn run(&self, cancel: CancellationToken) -> WorkerStatsSnapshot {
        info!(
            worker = self.id,
            pacing = %self.settings.pacing,
            prefetch = self.settings.prefetch,
            "delivery worker started"
        );

        while !cancel.is_cancelled() {
            match self.fetch().await {
                Ok(batch) if batch.is_empty() => {
                    let wait = self.idle_wait();
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                Ok(batch) => {
                    for delivery in batch {
                        if cancel.is_cancelled() {
                            self.defer(&delivery).await;
                        } else {
                            self.process(delivery).await;
                        }
                    }
                }
                Err(e) => {
                    warn!(worker = self.id, error = %e, "queue receive failed");
                    if !self.reconnect(&cancel).await {
                        break;
                    }
                }
            }
        }

        let snapshot = self.stats.snapshot();
        info!(
            worker = self.id,
            processed = snapshot.processed,
            sent = snapshot.sent,
            failed = snapshot.failed,
            skipped = snapshot.skipped,
            ledger_errors = snapshot.ledger_errors,
            "delivery worker stopped"
        );
        snapshot
    }

    /// Receives one batch and processes it. Returns the number of deliveries
    /// received, zero when the queue had nothing available.
    pub async fn run_once(&self) -> Result<usize, VolleyError> {
        let batch = self.fetch().await?;
        let received = batch.len();
        for delivery in batch {
            self.process(delivery).await;
        }
        Ok(received)
    }

    /// Handles one delivery end to end.
    ///
    /// The lease is renewed first, so a job that waited behind others in a
    /// prefetched batch gets a full lease for its own dispatch and pacing.
    pub async fn process(&self, delivery: Delivery) -> JobDisposition {
        let job = &delivery.job;
        match self.queue.extend(&delivery).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    tag = delivery.tag,
                    campaign_id = %job.campaign_id,
                    phone = %job.phone,
                    "lease lost before processing, leaving job to its new holder"
                );
                return JobDisposition::LeaseLost;
            }
            Err(e) => warn!(
                tag = delivery.tag,
                campaign_id = %job.campaign_id,
                error = %e,
                "failed to renew lease, processing on the current one"
            ),
        }

        if delivery.redelivered() {
            info!(
                tag = delivery.tag,
                campaign_id = %job.campaign_id,
                phone = %job.phone,
                deliveries = delivery.deliveries,
                "processing redelivered job"
            );
        }

        if self.settings.skip_already_attempted && self.already_attempted(job).await {
            info!(
                tag = delivery.tag,
                campaign_id = %job.campaign_id,
                phone = %job.phone,
                "job already recorded, acknowledging without dispatch"
            );
            self.stats.record_skip();
            self.acknowledge(&delivery).await;
            return JobDisposition::Skipped;
        }

        if self.settings.pacing == PacingMode::PerCampaign
            && !self.pacer.try_acquire(&job.campaign_id, job.delay())
        {
            debug!(tag = delivery.tag, campaign_id = %job.campaign_id, "lane busy, deferring job");
            self.defer(&delivery).await;
            return JobDisposition::Deferred;
        }

        let outcome = self.dispatcher.send(job).await;
        let status = outcome.status();
        self.stats.record_dispatch(status);
        match &outcome {
            DispatchOutcome::Sent => info!(
                campaign_id = %job.campaign_id,
                phone = %job.phone,
                status = %status,
                "message dispatched"
            ),
            DispatchOutcome::Failed(detail) => warn!(
                campaign_id = %job.campaign_id,
                phone = %job.phone,
                status = %status,
                error = %detail,
                "message dispatch failed"
            ),
        }

        let entry = NewLedgerEntry::for_outcome(job, &outcome);
        if let Err(e) = self.ledger.append(&entry).await {
            self.stats.ledger_errors.fetch_add(1, Ordering::Relaxed);
            error!(
                campaign_id = %job.campaign_id,
                phone = %job.phone,
                status = %status,
                error = %e,
                "failed to record delivery outcome"
            );
        }

        if self.settings.pacing == PacingMode::Blocking {
            let delay = job.delay();
            if !delay.is_zero() {
                debug!(
                    campaign_id = %job.campaign_id,
                    delay_ms = delay.as_millis() as u64,
                    "pacing before ack"
                );
                tokio::time::sleep(delay).await;
            }
        }

        self.acknowledge(&delivery).await;
        JobDisposition::Dispatched(status)
    }

    async fn fetch(&self) -> Result<Vec<Delivery>, VolleyError> {
        let skip = match self.settings.pacing {
            PacingMode::PerCampaign => self.pacer.throttled(),
            PacingMode::Blocking => Vec::new(),
        };
        self.queue.receive(self.settings.prefetch, &skip).await
    }

    fn idle_wait(&self) -> Duration {
        match self.settings.pacing {
            PacingMode::PerCampaign => self
                .pacer
                .next_ready_in()
                .map_or(self.settings.poll_interval, |ready| {
                    ready.min(self.settings.poll_interval)
                }),
            PacingMode::Blocking => self.settings.poll_interval,
        }
    }

    async fn already_attempted(&self, job: &DeliveryJob) -> bool {
        match self.ledger.contains_key(&job.idempotency_key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    campaign_id = %job.campaign_id,
                    phone = %job.phone,
                    error = %e,
                    "idempotency lookup failed, dispatching anyway"
                );
                false
            }
        }
    }

    async fn acknowledge(&self, delivery: &Delivery) {
        match self.queue.ack(delivery).await {
            Ok(true) => {}
            Ok(false) => warn!(
                tag = delivery.tag,
                campaign_id = %delivery.job.campaign_id,
                "job was reclaimed by another worker before its ack"
            ),
            Err(e) => error!(
                tag = delivery.tag,
                campaign_id = %delivery.job.campaign_id,
                error = %e,
                "failed to acknowledge job, it will be redelivered"
            ),
        }
    }

    /// Hands back a job that was never dispatched.
    async fn defer(&self, delivery: &Delivery) {
        if let Err(e) = self.queue.defer(delivery).await {
            warn!(
                tag = delivery.tag,
                campaign_id = %delivery.job.campaign_id,
                error = %e,
                "failed to return job to the queue, it will be redelivered after its lease"
            );
        }
    }

    /// Retries [`WorkQueue::reconnect`] at a fixed interval. Returns false if
    /// cancelled first.
    async fn reconnect(&self, cancel: &CancellationToken) -> bool {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.settings.reconnect_interval) => {}
            }
            match self.queue.reconnect().await {
                Ok(()) => {
                    info!(worker = self.id, "queue connection restored");
                    return true;
                }
                Err(e) => warn!(
                    worker = self.id,
                    error = %e,
                    retry_in_ms = self.settings.reconnect_interval.as_millis() as u64,
                    "queue reconnect failed"
                ),
            }
        }
    }
}
