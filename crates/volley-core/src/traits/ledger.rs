// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only record of per-contact dispatch outcomes.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::error::VolleyError;
use crate::types::{CampaignId, DeliveryStatus, LedgerEntry, NewLedgerEntry};

/// The delivery ledger: source of truth for stats and resume reconciliation.
///
/// Entries are never updated or deleted. Concurrent appends from several
/// workers are independent and need no coordination.
#[async_trait]
pub trait DeliveryLedger: Send + Sync + 'static {
    /// Appends one entry and returns its id.
    async fn append(&self, entry: &NewLedgerEntry) -> Result<i64, VolleyError>;

    /// All entries for a campaign in append order.
    async fn entries(&self, campaign_id: &CampaignId) -> Result<Vec<LedgerEntry>, VolleyError>;

    /// Distinct contact numbers with at least one entry, whatever the status.
    async fn attempted_numbers(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<HashSet<String>, VolleyError>;

    /// Row counts grouped by status.
    async fn counts_by_status(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<BTreeMap<DeliveryStatus, u64>, VolleyError>;

    /// Whether an entry carrying this idempotency key already exists.
    async fn contains_key(&self, idempotency_key: &str) -> Result<bool, VolleyError>;
}
