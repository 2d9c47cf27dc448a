// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to campaign definitions, target lists, and runtime status.

use async_trait::async_trait;

use crate::error::VolleyError;
use crate::types::{CampaignDefinition, CampaignId, CampaignRuntimeStatus, ContactRef};

/// The campaign collaborator as seen by the engine.
///
/// Owns campaign snapshots and their resolved contact lists. The engine only
/// reads them, moves the status with compare-and-swap, and bumps the enqueue
/// generation on every resume.
#[async_trait]
pub trait CampaignDirectory: Send + Sync + 'static {
    /// Registers a campaign in `draft` status with generation 1.
    ///
    /// Registering again while the campaign is still in `draft` replaces its
    /// definition and contacts; once it has left `draft` registration fails
    /// with [`VolleyError::Precondition`].
    async fn register(
        &self,
        definition: &CampaignDefinition,
        contacts: &[ContactRef],
    ) -> Result<(), VolleyError>;

    async fn definition(&self, id: &CampaignId) -> Result<CampaignDefinition, VolleyError>;

    /// The full target contact list, in list order.
    async fn contacts(&self, id: &CampaignId) -> Result<Vec<ContactRef>, VolleyError>;

    async fn status(&self, id: &CampaignId) -> Result<CampaignRuntimeStatus, VolleyError>;

    /// Moves the status from `expected` to `new`, failing with
    /// [`VolleyError::StatusConflict`] if another writer got there first.
    async fn compare_and_set_status(
        &self,
        id: &CampaignId,
        expected: CampaignRuntimeStatus,
        new: CampaignRuntimeStatus,
    ) -> Result<(), VolleyError>;

    /// Current enqueue generation.
    async fn generation(&self, id: &CampaignId) -> Result<u32, VolleyError>;

    /// Increments and returns the enqueue generation.
    async fn bump_generation(&self, id: &CampaignId) -> Result<u32, VolleyError>;
}
