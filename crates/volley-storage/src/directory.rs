// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite campaign registry standing in for the external campaign service.

use async_trait::async_trait;
use tracing::debug;

use volley_core::{
    CampaignDefinition, CampaignDirectory, CampaignId, CampaignRuntimeStatus, ContactRef,
    VolleyError,
};

use crate::database::Database;
use crate::queries;
use crate::queries::campaigns::{Registration, StatusUpdate};

/// Campaign definitions, ordered contact lists, and versioned status.
#[derive(Clone)]
pub struct SqliteCampaignDirectory {
    db: Database,
}

impl SqliteCampaignDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CampaignDirectory for SqliteCampaignDirectory {
    async fn register(
        &self,
        definition: &CampaignDefinition,
        contacts: &[ContactRef],
    ) -> Result<(), VolleyError> {
        match queries::campaigns::register_campaign(&self.db, definition, contacts).await? {
            Registration::Inserted => {
                debug!(campaign_id = %definition.id, contacts = contacts.len(), "campaign registered");
                Ok(())
            }
            Registration::Replaced => {
                debug!(
                    campaign_id = %definition.id,
                    contacts = contacts.len(),
                    "draft campaign registration replaced"
                );
                Ok(())
            }
            Registration::Rejected(status) => Err(VolleyError::Precondition {
                campaign_id: definition.id.clone(),
                message: format!("campaign is already registered and {status}"),
            }),
        }
    }

    async fn definition(&self, id: &CampaignId) -> Result<CampaignDefinition, VolleyError> {
        queries::campaigns::get_definition(&self.db, id)
            .await?
            .ok_or_else(|| VolleyError::NotFound(id.clone()))
    }

    async fn contacts(&self, id: &CampaignId) -> Result<Vec<ContactRef>, VolleyError> {
        queries::campaigns::get_contacts(&self.db, id).await
    }

    async fn status(&self, id: &CampaignId) -> Result<CampaignRuntimeStatus, VolleyError> {
        queries::campaigns::get_status(&self.db, id)
            .await?
            .map(|(status, _)| status)
            .ok_or_else(|| VolleyError::NotFound(id.clone()))
    }

    async fn compare_and_set_status(
        &self,
        id: &CampaignId,
        expected: CampaignRuntimeStatus,
        new: CampaignRuntimeStatus,
    ) -> Result<(), VolleyError> {
        match queries::campaigns::compare_and_set_status(&self.db, id, expected, new).await? {
            StatusUpdate::Applied => {
                debug!(campaign_id = %id, from = %expected, to = %new, "status changed");
                Ok(())
            }
            StatusUpdate::Conflict(actual) => Err(VolleyError::StatusConflict {
                campaign_id: id.clone(),
                expected,
                actual,
            }),
            StatusUpdate::Missing => Err(VolleyError::NotFound(id.clone())),
        }
    }

    async fn generation(&self, id: &CampaignId) -> Result<u32, VolleyError> {
        queries::campaigns::get_status(&self.db, id)
            .await?
            .map(|(_, generation)| generation)
            .ok_or_else(|| VolleyError::NotFound(id.clone()))
    }

    async fn bump_generation(&self, id: &CampaignId) -> Result<u32, VolleyError> {
        queries::campaigns::bump_generation(&self.db, id)
            .await?
            .ok_or_else(|| VolleyError::NotFound(id.clone()))
    }
}
