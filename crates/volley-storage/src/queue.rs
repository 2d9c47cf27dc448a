// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the durable work queue.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use volley_core::{CampaignId, Delivery, DeliveryJob, QueueDepth, VolleyError, WorkQueue};

use crate::database::Database;
use crate::queries;

/// Lease-based durable queue stored in a `dispatch_queue` table.
///
/// Claimed jobs are leased rather than removed. A job whose lease runs out
/// without an ack is claimable again, which is how a crashed worker's jobs
/// get redelivered.
pub struct SqliteWorkQueue {
    db: ArcSwap<Database>,
    queue_name: String,
    lease: Duration,
}

impl SqliteWorkQueue {
    pub fn new(db: Database, queue_name: impl Into<String>, lease: Duration) -> Self {
        Self {
            db: ArcSwap::from_pointee(db),
            queue_name: queue_name.into(),
            lease,
        }
    }

    /// Opens the queue database at `path` and wraps it.
    pub async fn open(
        path: &str,
        queue_name: impl Into<String>,
        lease: Duration,
    ) -> Result<Self, VolleyError> {
        let db = Database::open(path).await.map_err(|e| transport("open", e))?;
        Ok(Self::new(db, queue_name, lease))
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    fn lease_ms(&self) -> i64 {
        i64::try_from(self.lease.as_millis()).unwrap_or(i64::MAX)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Re-labels a storage failure as a queue transport error.
fn transport(op: &str, err: VolleyError) -> VolleyError {
    match err {
        VolleyError::Storage { source } => VolleyError::Queue {
            message: format!("{op} failed"),
            source: Some(source),
        },
        other => other,
    }
}

#[async_trait]
impl WorkQueue for SqliteWorkQueue {
    async fn enqueue_batch(&self, jobs: &[DeliveryJob]) -> Result<usize, VolleyError> {
        if jobs.is_empty() {
            return Ok(0);
        }
        let items = jobs
            .iter()
            .map(|job| -> Result<(String, String), VolleyError> {
                Ok((job.campaign_id.to_string(), serde_json::to_string(job)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let db = self.db.load_full();
        let count = queries::queue::enqueue_batch(&db, &self.queue_name, items)
            .await
            .map_err(|e| transport("enqueue", e))?;
        debug!(queue = %self.queue_name, count, "jobs enqueued");
        Ok(count)
    }

    async fn receive(
        &self,
        limit: usize,
        skip: &[CampaignId],
    ) -> Result<Vec<Delivery>, VolleyError> {
        let db = self.db.load_full();
        let skip = skip.iter().map(|id| id.to_string()).collect();
        let rows = queries::queue::claim(
            &db,
            &self.queue_name,
            limit,
            skip,
            now_ms(),
            self.lease_ms(),
        )
        .await
        .map_err(|e| transport("receive", e))?;

        let mut deliveries = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_str::<DeliveryJob>(&row.payload) {
                Ok(job) => deliveries.push(Delivery {
                    tag: row.id,
                    job,
                    deliveries: row.deliveries,
                    claim: row.claim,
                }),
                Err(e) => {
                    // An undecodable payload can never succeed; drop it.
                    warn!(
                        tag = row.id,
                        campaign_id = %row.campaign_id,
                        error = %e,
                        "discarding undecodable queue payload"
                    );
                    queries::queue::delete(&db, row.id)
                        .await
                        .map_err(|e| transport("discard", e))?;
                }
            }
        }
        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        let db = self.db.load_full();
        let held = queries::queue::complete(&db, delivery.tag, delivery.claim)
            .await
            .map_err(|e| transport("ack", e))?;
        if !held {
            debug!(tag = delivery.tag, claim = delivery.claim, "ack for a superseded lease");
        }
        Ok(held)
    }

    async fn nack(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        let db = self.db.load_full();
        let held = queries::queue::release(&db, delivery.tag, delivery.claim, true)
            .await
            .map_err(|e| transport("nack", e))?;
        if !held {
            debug!(tag = delivery.tag, claim = delivery.claim, "nack for a superseded lease");
        }
        Ok(held)
    }

    async fn defer(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        let db = self.db.load_full();
        queries::queue::release(&db, delivery.tag, delivery.claim, false)
            .await
            .map_err(|e| transport("defer", e))
    }

    async fn extend(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        let db = self.db.load_full();
        let leased_until = now_ms().saturating_add(self.lease_ms());
        queries::queue::renew(&db, delivery.tag, delivery.claim, leased_until)
            .await
            .map_err(|e| transport("extend", e))
    }

    async fn purge_campaign(&self, campaign_id: &CampaignId) -> Result<usize, VolleyError> {
        let db = self.db.load_full();
        let removed =
            queries::queue::purge_pending(&db, &self.queue_name, campaign_id.as_str(), now_ms())
                .await
                .map_err(|e| transport("purge", e))?;
        debug!(queue = %self.queue_name, campaign_id = %campaign_id, removed, "pending jobs purged");
        Ok(removed)
    }

    async fn depth(&self) -> Result<QueueDepth, VolleyError> {
        let db = self.db.load_full();
        let (pending, leased) = queries::queue::depth(&db, &self.queue_name, now_ms())
            .await
            .map_err(|e| transport("depth", e))?;
        Ok(QueueDepth { pending, leased })
    }

    async fn reconnect(&self) -> Result<(), VolleyError> {
        let current = self.db.load_full();
        let path = current.path().to_string();
        if path == ":memory:" {
            return Ok(());
        }
        let fresh = Database::open(&path)
            .await
            .map_err(|e| transport("reconnect", e))?;
        self.db.store(Arc::new(fresh));
        info!(queue = %self.queue_name, path, "queue connection re-established");
        Ok(())
    }
}
