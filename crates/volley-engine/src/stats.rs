// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only campaign statistics computed from the delivery ledger.

use std::sync::Arc;

use volley_core::{CampaignDirectory, CampaignId, CampaignStats, DeliveryLedger, LedgerEntry, VolleyError};

/// Groups ledger rows by status. Counts attempts, not distinct contacts.
#[derive(Clone)]
pub struct StatsAggregator {
    directory: Arc<dyn CampaignDirectory>,
    ledger: Arc<dyn DeliveryLedger>,
}

impl StatsAggregator {
    pub fn new(directory: Arc<dyn CampaignDirectory>, ledger: Arc<dyn DeliveryLedger>) -> Self {
        Self { directory, ledger }
    }

    pub async fn stats(&self, id: &CampaignId) -> Result<CampaignStats, VolleyError> {
        let status = self.directory.status(id).await?;
        let counts = self.ledger.counts_by_status(id).await?;
        let total = counts.values().sum();
        Ok(CampaignStats {
            campaign_id: id.clone(),
            status,
            counts,
            total,
        })
    }

    /// Every ledger entry of the campaign in append order.
    pub async fn log(&self, id: &CampaignId) -> Result<Vec<LedgerEntry>, VolleyError> {
        self.directory.status(id).await?;
        self.ledger.entries(id).await
    }
}
