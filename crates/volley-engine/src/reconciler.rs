// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resume reconciliation: re-enqueue only the contacts the ledger has not
//! seen for a paused campaign.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};
use volley_core::{
    CampaignDirectory, CampaignId, CampaignRuntimeStatus, ContactRef, DeliveryLedger, VolleyError,
};

use crate::materializer::{Materializer, pacing_delay_seconds};

/// Contacts whose number has no ledger entry, in list order.
///
/// Both `sent` and `failed` numbers count as attempted.
pub fn remaining_contacts(contacts: &[ContactRef], attempted: &HashSet<String>) -> Vec<ContactRef> {
    contacts
        .iter()
        .filter(|contact| !attempted.contains(&contact.number))
        .cloned()
        .collect()
}

/// Recomputes and re-enqueues the remaining work of paused campaigns.
#[derive(Clone)]
pub struct ResumeReconciler {
    directory: Arc<dyn CampaignDirectory>,
    ledger: Arc<dyn DeliveryLedger>,
    materializer: Materializer,
}

impl ResumeReconciler {
    pub fn new(
        directory: Arc<dyn CampaignDirectory>,
        ledger: Arc<dyn DeliveryLedger>,
        materializer: Materializer,
    ) -> Self {
        Self {
            directory,
            ledger,
            materializer,
        }
    }

    /// Resumes a paused campaign and returns the number of jobs enqueued.
    ///
    /// With nothing left to send this is a no-op returning 0 and the status
    /// stays `paused`. Otherwise the campaign is claimed with a
    /// `paused → processing` compare-and-swap, its still-queued jobs that no
    /// worker holds are dropped, and the remainder is enqueued under a new
    /// generation. The status goes back to `paused` if the enqueue fails.
    pub async fn resume(&self, id: &CampaignId) -> Result<usize, VolleyError> {
        let status = self.directory.status(id).await?;
        if status != CampaignRuntimeStatus::Paused {
            return Err(VolleyError::Precondition {
                campaign_id: id.clone(),
                message: format!("resume requires a paused campaign, status is {status}"),
            });
        }

        let definition = self.directory.definition(id).await?;
        pacing_delay_seconds(id, definition.messages_per_minute)?;

        let contacts = self.directory.contacts(id).await?;
        if contacts.is_empty() {
            return Err(VolleyError::Config(format!(
                "campaign {id} has no contacts to resume"
            )));
        }

        let attempted = self.ledger.attempted_numbers(id).await?;
        let remainder = remaining_contacts(&contacts, &attempted);
        if remainder.is_empty() {
            info!(
                campaign_id = %id,
                contacts = contacts.len(),
                "every contact already attempted, nothing to resume"
            );
            return Ok(0);
        }

        self.directory
            .compare_and_set_status(
                id,
                CampaignRuntimeStatus::Paused,
                CampaignRuntimeStatus::Processing,
            )
            .await?;

        let enqueued = async {
            let superseded = self.materializer.queue().purge_campaign(id).await?;
            if superseded > 0 {
                info!(campaign_id = %id, superseded, "dropped queued jobs from before the pause");
            }
            let generation = self.directory.bump_generation(id).await?;
            self.materializer
                .enqueue(&definition, &remainder, generation)
                .await
        }
        .await;

        match enqueued {
            Ok(count) => {
                info!(
                    campaign_id = %id,
                    remaining = count,
                    already_attempted = contacts.len() - remainder.len(),
                    "campaign resumed"
                );
                Ok(count)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .directory
                    .compare_and_set_status(
                        id,
                        CampaignRuntimeStatus::Processing,
                        CampaignRuntimeStatus::Paused,
                    )
                    .await
                {
                    error!(
                        campaign_id = %id,
                        error = %rollback,
                        "failed to restore paused status after enqueue error"
                    );
                }
                Err(e)
            }
        }
    }
}
