// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery worker loop behavior: pacing modes, shutdown, and recovery.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use volley_config::PacingMode;
use volley_core::{
    CampaignId, Delivery, DeliveryJob, DeliveryLedger, DeliveryStatus, LedgerEntry,
    NewLedgerEntry, QueueDepth, VolleyError, WorkQueue,
};
use volley_engine::{DeliveryWorker, JobDisposition, WorkerSettings, materialize};
use volley_storage::{Database, SqliteLedger, SqliteWorkQueue};
use volley_test_utils::fixtures::{campaign, contacts};
use volley_test_utils::{ScriptedDispatcher, TestHarness};

async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn fast_settings() -> WorkerSettings {
    WorkerSettings {
        poll_interval: Duration::from_millis(10),
        reconnect_interval: Duration::from_millis(10),
        ..WorkerSettings::default()
    }
}

#[tokio::test]
async fn run_drains_queue_until_cancelled() {
    let h = TestHarness::new().await.unwrap();
    let def = campaign("loop", 6000);
    h.engine.start_campaign(&def, &contacts(3)).await.unwrap();

    let worker = h.worker();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { worker.run(cancel).await }
    });

    let dispatcher = h.dispatcher.clone();
    wait_until(|| dispatcher.call_count() == 3, Duration::from_secs(5)).await;
    cancel.cancel();
    let snapshot = handle.await.unwrap();

    assert_eq!(snapshot.sent, 3);
    assert_eq!(snapshot.processed, 3);
    assert_eq!(h.engine.queue_depth().await.unwrap(), QueueDepth::default());
}

#[tokio::test]
async fn shutdown_returns_prefetched_jobs_to_the_queue() {
    let h = TestHarness::builder()
        .with_prefetch(3)
        .with_dispatcher(ScriptedDispatcher::new().with_latency(Duration::from_millis(150)))
        .build()
        .await
        .unwrap();
    let def = campaign("stop", 6000);
    h.engine.start_campaign(&def, &contacts(3)).await.unwrap();

    let worker = h.worker();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { worker.run(cancel).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    let snapshot = handle.await.unwrap();

    // The job in hand completed; the two prefetched ones went back unsent.
    assert_eq!(snapshot.sent, 1);
    assert_eq!(h.engine.stats(&def.id).await.unwrap().total, 1);
    assert_eq!(
        h.engine.queue_depth().await.unwrap(),
        QueueDepth { pending: 2, leased: 0 }
    );
    let returned = h.queue.receive(2, &[]).await.unwrap();
    assert!(returned.iter().all(|delivery| !delivery.redelivered()));
}

#[tokio::test]
async fn per_campaign_pacing_interleaves_campaigns() {
    let h = TestHarness::builder()
        .with_pacing(PacingMode::PerCampaign)
        .build()
        .await
        .unwrap();
    let slow_a = campaign("a", 1);
    let slow_b = campaign("b", 1);
    h.engine.start_campaign(&slow_a, &contacts(2)).await.unwrap();
    h.engine.start_campaign(&slow_b, &contacts(2)).await.unwrap();

    let worker = h.worker();
    let started = tokio::time::Instant::now();
    assert_eq!(worker.run_once().await.unwrap(), 1);
    assert_eq!(worker.run_once().await.unwrap(), 1);
    assert_eq!(worker.run_once().await.unwrap(), 0);
    assert!(started.elapsed() < Duration::from_secs(5));

    let campaigns: Vec<String> = h
        .dispatcher
        .calls()
        .into_iter()
        .map(|job| job.campaign_id.to_string())
        .collect();
    assert_eq!(campaigns, ["a", "b"]);
    assert_eq!(h.engine.queue_depth().await.unwrap().pending, 2);
}

#[tokio::test]
async fn per_campaign_pacing_defers_a_busy_lane() {
    let h = TestHarness::builder()
        .with_pacing(PacingMode::PerCampaign)
        .with_prefetch(2)
        .build()
        .await
        .unwrap();
    let def = campaign("solo", 1);
    h.engine.start_campaign(&def, &contacts(2)).await.unwrap();

    let worker = h.worker();
    let batch = h.queue.receive(2, &[]).await.unwrap();
    let mut dispositions = Vec::new();
    for delivery in batch {
        dispositions.push(worker.process(delivery).await);
    }
    assert_eq!(
        dispositions,
        vec![
            JobDisposition::Dispatched(DeliveryStatus::Sent),
            JobDisposition::Deferred
        ]
    );
    assert_eq!(
        h.engine.queue_depth().await.unwrap(),
        QueueDepth { pending: 1, leased: 0 }
    );

    // A deferral is not a delivery attempt.
    let again = h.queue.receive(1, &[]).await.unwrap();
    assert_eq!(again[0].deliveries, 1);
    assert!(!again[0].redelivered());
}

#[tokio::test]
async fn blocking_pacing_holds_the_job_delay_before_ack() {
    let h = TestHarness::new().await.unwrap();
    // 600 per minute: 100ms between sends.
    let def = campaign("paced", 600);
    h.engine.start_campaign(&def, &contacts(2)).await.unwrap();

    let started = tokio::time::Instant::now();
    assert_eq!(h.drain().await.unwrap(), 2);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn prefetched_jobs_keep_their_lease_while_waiting() {
    // 400 per minute: each job is held 150ms, longer than the batch lease
    // allows for the third job.
    let h = TestHarness::builder()
        .with_prefetch(3)
        .with_lease(Duration::from_millis(200))
        .build()
        .await
        .unwrap();
    let def = campaign("held", 400);
    h.engine.start_campaign(&def, &contacts(3)).await.unwrap();

    let first = h.engine.worker(0);
    let second = h.engine.worker(1);
    let late_claim = async {
        tokio::time::sleep(Duration::from_millis(370)).await;
        second.run_once().await.unwrap()
    };
    let (claimed_first, claimed_second) = tokio::join!(
        async { first.run_once().await.unwrap() },
        late_claim
    );

    assert_eq!(claimed_first, 3);
    assert_eq!(claimed_second, 0);
    assert_eq!(h.dispatcher.call_count(), 3);
    assert_eq!(h.engine.stats(&def.id).await.unwrap().total, 3);
    assert_eq!(h.engine.queue_depth().await.unwrap(), QueueDepth::default());
}

#[tokio::test]
async fn job_reclaimed_by_another_worker_is_not_sent_twice() {
    let h = TestHarness::builder()
        .with_lease(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    let def = campaign("lost", 6000);
    h.engine.start_campaign(&def, &contacts(1)).await.unwrap();

    let stale = h.queue.receive(1, &[]).await.unwrap().remove(0);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(h.engine.worker(1).run_once().await.unwrap(), 1);

    let disposition = h.engine.worker(0).process(stale).await;
    assert_eq!(disposition, JobDisposition::LeaseLost);
    assert_eq!(h.dispatcher.call_count(), 1);
    assert_eq!(h.engine.stats(&def.id).await.unwrap().total, 1);
}

/// Ledger whose every append fails.
struct BrokenLedger;

#[async_trait]
impl DeliveryLedger for BrokenLedger {
    async fn append(&self, _entry: &NewLedgerEntry) -> Result<i64, VolleyError> {
        Err(VolleyError::Storage {
            source: "disk full".into(),
        })
    }

    async fn entries(&self, _campaign_id: &CampaignId) -> Result<Vec<LedgerEntry>, VolleyError> {
        Ok(Vec::new())
    }

    async fn attempted_numbers(
        &self,
        _campaign_id: &CampaignId,
    ) -> Result<HashSet<String>, VolleyError> {
        Ok(HashSet::new())
    }

    async fn counts_by_status(
        &self,
        _campaign_id: &CampaignId,
    ) -> Result<BTreeMap<DeliveryStatus, u64>, VolleyError> {
        Ok(BTreeMap::new())
    }

    async fn contains_key(&self, _idempotency_key: &str) -> Result<bool, VolleyError> {
        Err(VolleyError::Storage {
            source: "disk full".into(),
        })
    }
}

#[tokio::test]
async fn ledger_failure_still_acknowledges() {
    let db = Database::open_in_memory().await.unwrap();
    let queue = Arc::new(SqliteWorkQueue::new(db, "q", Duration::from_secs(60)));
    let jobs = materialize(&campaign("c", 6000), &contacts(1), 1).unwrap();
    queue.enqueue_batch(&jobs).await.unwrap();

    let worker = DeliveryWorker::new(
        queue.clone(),
        Arc::new(BrokenLedger),
        Arc::new(ScriptedDispatcher::new()),
        WorkerSettings {
            skip_already_attempted: true,
            ..fast_settings()
        },
    );
    assert_eq!(worker.run_once().await.unwrap(), 1);

    let stats = worker.stats().snapshot();
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.ledger_errors, 1);
    assert_eq!(queue.depth().await.unwrap(), QueueDepth::default());
}

/// Queue whose receive fails until it has been reconnected.
struct FlakyQueue {
    inner: SqliteWorkQueue,
    broken: AtomicBool,
    reconnects: AtomicUsize,
}

#[async_trait]
impl WorkQueue for FlakyQueue {
    async fn enqueue_batch(&self, jobs: &[DeliveryJob]) -> Result<usize, VolleyError> {
        self.inner.enqueue_batch(jobs).await
    }

    async fn receive(
        &self,
        limit: usize,
        skip: &[CampaignId],
    ) -> Result<Vec<Delivery>, VolleyError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(VolleyError::Queue {
                message: "connection reset".into(),
                source: None,
            });
        }
        self.inner.receive(limit, skip).await
    }

    async fn ack(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        self.inner.ack(delivery).await
    }

    async fn nack(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        self.inner.nack(delivery).await
    }

    async fn defer(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        self.inner.defer(delivery).await
    }

    async fn extend(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        self.inner.extend(delivery).await
    }

    async fn purge_campaign(&self, campaign_id: &CampaignId) -> Result<usize, VolleyError> {
        self.inner.purge_campaign(campaign_id).await
    }

    async fn depth(&self) -> Result<QueueDepth, VolleyError> {
        self.inner.depth().await
    }

    async fn reconnect(&self) -> Result<(), VolleyError> {
        let attempt = self.reconnects.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            return Err(VolleyError::Queue {
                message: "still down".into(),
                source: None,
            });
        }
        self.broken.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn worker_reconnects_after_transport_errors() {
    let db = Database::open_in_memory().await.unwrap();
    let queue = Arc::new(FlakyQueue {
        inner: SqliteWorkQueue::new(db.clone(), "q", Duration::from_secs(60)),
        broken: AtomicBool::new(true),
        reconnects: AtomicUsize::new(0),
    });
    let jobs = materialize(&campaign("c", 6000), &contacts(2), 1).unwrap();
    queue.enqueue_batch(&jobs).await.unwrap();

    let dispatcher = Arc::new(ScriptedDispatcher::new());
    let worker = DeliveryWorker::new(
        queue.clone(),
        Arc::new(SqliteLedger::new(db)),
        dispatcher.clone(),
        fast_settings(),
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { worker.run(cancel).await }
    });

    let watched = dispatcher.clone();
    wait_until(|| watched.call_count() == 2, Duration::from_secs(5)).await;
    cancel.cancel();
    let snapshot = handle.await.unwrap();

    assert_eq!(snapshot.sent, 2);
    assert_eq!(queue.reconnects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cancelled_worker_stops_while_reconnecting() {
    let db = Database::open_in_memory().await.unwrap();
    let queue = Arc::new(FlakyQueue {
        inner: SqliteWorkQueue::new(db.clone(), "q", Duration::from_secs(60)),
        broken: AtomicBool::new(true),
        reconnects: AtomicUsize::new(0),
    });
    let worker = DeliveryWorker::new(
        queue,
        Arc::new(SqliteLedger::new(db)),
        Arc::new(ScriptedDispatcher::new()),
        WorkerSettings {
            reconnect_interval: Duration::from_secs(60),
            ..fast_settings()
        },
    );
    let cancel = CancellationToken::new();
    let trigger = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            cancel.cancel();
        }
    };
    let (snapshot, ()) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(worker.run(cancel), trigger)
    })
    .await
    .unwrap();
    assert_eq!(snapshot.processed, 0);
}
