// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job materialization: one rendered, paced [`DeliveryJob`] per contact.

use std::sync::Arc;

use tracing::info;
use volley_core::{
    CampaignDefinition, CampaignId, ContactRef, DeliveryJob, VolleyError, WorkQueue,
};

/// Placeholder replaced with the contact's display name.
pub const CONTACT_NAME_PLACEHOLDER: &str = "$contact_name";
/// Placeholder replaced with the contact's phone number.
pub const CONTACT_NUMBER_PLACEHOLDER: &str = "$contact_number";

/// Substitutes the contact placeholders in `template`. Missing values render
/// as the empty string.
pub fn render_template(template: &str, contact: &ContactRef) -> String {
    template
        .replace(CONTACT_NAME_PLACEHOLDER, contact.display_name())
        .replace(CONTACT_NUMBER_PLACEHOLDER, &contact.number)
}

/// Seconds to wait after each dispatch to hold `messages_per_minute`.
pub fn pacing_delay_seconds(
    campaign_id: &CampaignId,
    messages_per_minute: i64,
) -> Result<f64, VolleyError> {
    if messages_per_minute <= 0 {
        return Err(VolleyError::Config(format!(
            "campaign {campaign_id}: messages_per_minute must be positive, got {messages_per_minute}"
        )));
    }
    Ok((60.0 / messages_per_minute as f64).max(0.0))
}

/// Key identifying one dispatch attempt of `phone` in enqueue `generation`.
pub fn idempotency_key(campaign_id: &CampaignId, phone: &str, generation: u32) -> String {
    format!("{campaign_id}:{phone}:{generation}")
}

/// Builds the jobs for `contacts`, in list order.
///
/// Media reference and declared kind are copied unchanged.
pub fn materialize(
    definition: &CampaignDefinition,
    contacts: &[ContactRef],
    generation: u32,
) -> Result<Vec<DeliveryJob>, VolleyError> {
    let delay_seconds = pacing_delay_seconds(&definition.id, definition.messages_per_minute)?;
    let media_url = definition.media.as_ref().map(|m| m.url.clone());
    let media_type = definition.media.as_ref().and_then(|m| m.kind);

    Ok(contacts
        .iter()
        .map(|contact| DeliveryJob {
            campaign_id: definition.id.clone(),
            phone: contact.number.clone(),
            name: contact.display_name().to_string(),
            message: render_template(&definition.message_template, contact),
            media_url: media_url.clone(),
            media_type,
            delay_seconds,
            connection: definition.connection.clone(),
            idempotency_key: idempotency_key(&definition.id, &contact.number, generation),
        })
        .collect())
}

/// Materializes jobs and hands them to the durable work queue.
#[derive(Clone)]
pub struct Materializer {
    queue: Arc<dyn WorkQueue>,
}

impl Materializer {
    pub fn new(queue: Arc<dyn WorkQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    /// Enqueues one job per contact and returns how many were enqueued.
    pub async fn enqueue(
        &self,
        definition: &CampaignDefinition,
        contacts: &[ContactRef],
        generation: u32,
    ) -> Result<usize, VolleyError> {
        let jobs = materialize(definition, contacts, generation)?;
        if jobs.is_empty() {
            return Ok(0);
        }
        let count = self.queue.enqueue_batch(&jobs).await?;
        info!(
            campaign_id = %definition.id,
            jobs = count,
            generation,
            delay_ms = jobs[0].delay().as_millis() as u64,
            "campaign jobs enqueued"
        );
        Ok(count)
    }
}
