// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable, at-least-once work queue shared by every campaign.

use async_trait::async_trait;

use crate::error::VolleyError;
use crate::types::{CampaignId, Delivery, DeliveryJob, QueueDepth};

/// A durable FIFO of [`DeliveryJob`]s with explicit acknowledgment.
///
/// A received job stays logically in the queue until [`ack`](WorkQueue::ack)
/// is called. Jobs held by a worker that crashes, or that are
/// [`nack`](WorkQueue::nack)ed, are delivered again.
///
/// Each [`Delivery`] is held under a lease. Once the lease lapses another
/// worker may claim the job, after which `ack`, `nack`, `defer` and `extend`
/// on the older delivery do nothing and return `false`.
#[async_trait]
pub trait WorkQueue: Send + Sync + 'static {
    /// Persists every job, in order, before returning the number enqueued.
    async fn enqueue_batch(&self, jobs: &[DeliveryJob]) -> Result<usize, VolleyError>;

    /// Persists a single job.
    async fn enqueue(&self, job: &DeliveryJob) -> Result<(), VolleyError> {
        self.enqueue_batch(std::slice::from_ref(job)).await?;
        Ok(())
    }

    /// Claims up to `limit` of the oldest available jobs, skipping jobs of the
    /// campaigns in `skip`. Returns an empty vector when nothing is available.
    async fn receive(
        &self,
        limit: usize,
        skip: &[CampaignId],
    ) -> Result<Vec<Delivery>, VolleyError>;

    /// Removes a delivery from the queue permanently. Returns `false` if the
    /// delivery's lease was superseded.
    async fn ack(&self, delivery: &Delivery) -> Result<bool, VolleyError>;

    /// Returns a delivery to the queue for immediate redelivery, counting the
    /// hand-out as an attempt.
    async fn nack(&self, delivery: &Delivery) -> Result<bool, VolleyError>;

    /// Returns a delivery that was never worked on. Unlike
    /// [`nack`](WorkQueue::nack) the hand-out does not count as a delivery.
    async fn defer(&self, delivery: &Delivery) -> Result<bool, VolleyError> {
        self.nack(delivery).await
    }

    /// Restarts the delivery's lease from now. Returns `false` if the lease
    /// was already superseded and the job belongs to another worker.
    async fn extend(&self, _delivery: &Delivery) -> Result<bool, VolleyError> {
        Ok(true)
    }

    /// Deletes every job of `campaign_id` that no worker currently holds.
    /// Returns the number removed. Leased jobs are left to finish.
    async fn purge_campaign(&self, campaign_id: &CampaignId) -> Result<usize, VolleyError>;

    /// Current pending and in-flight job counts.
    async fn depth(&self) -> Result<QueueDepth, VolleyError>;

    /// Re-establishes the connection to the queue backend after a transport error.
    async fn reconnect(&self) -> Result<(), VolleyError> {
        Ok(())
    }
}
