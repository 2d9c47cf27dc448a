// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the delivery ledger.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use volley_core::{
    CampaignId, DeliveryLedger, DeliveryStatus, LedgerEntry, NewLedgerEntry, VolleyError,
};

use crate::database::Database;
use crate::queries;

/// Delivery ledger stored in the `delivery_ledger` table.
#[derive(Clone)]
pub struct SqliteLedger {
    db: Database,
}

impl SqliteLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeliveryLedger for SqliteLedger {
    async fn append(&self, entry: &NewLedgerEntry) -> Result<i64, VolleyError> {
        queries::ledger::insert_entry(&self.db, entry).await
    }

    async fn entries(&self, campaign_id: &CampaignId) -> Result<Vec<LedgerEntry>, VolleyError> {
        queries::ledger::list_entries(&self.db, campaign_id).await
    }

    async fn attempted_numbers(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<HashSet<String>, VolleyError> {
        queries::ledger::distinct_numbers(&self.db, campaign_id).await
    }

    async fn counts_by_status(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<BTreeMap<DeliveryStatus, u64>, VolleyError> {
        queries::ledger::count_by_status(&self.db, campaign_id).await
    }

    async fn contains_key(&self, idempotency_key: &str) -> Result<bool, VolleyError> {
        queries::ledger::has_key(&self.db, idempotency_key).await
    }
}
