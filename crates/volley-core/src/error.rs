// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Volley campaign dispatch engine.
//!
//! Delivery failures are deliberately absent: a failed gateway call is a
//! [`DispatchOutcome::Failed`](crate::types::DispatchOutcome) value recorded in
//! the ledger, never an error that propagates.

use thiserror::Error;

use crate::types::{CampaignId, CampaignRuntimeStatus};

/// The primary error type used across all Volley traits and engine operations.
#[derive(Debug, Error)]
pub enum VolleyError {
    /// Configuration errors (invalid cadence, empty contact list, bad config file).
    #[error("configuration error: {0}")]
    Config(String),

    /// The operation is not legal in the campaign's current state.
    #[error("precondition failed for campaign {campaign_id}: {message}")]
    Precondition {
        campaign_id: CampaignId,
        message: String,
    },

    /// A compare-and-swap status transition lost against a concurrent writer.
    #[error(
        "status conflict for campaign {campaign_id}: expected {expected}, found {actual}"
    )]
    StatusConflict {
        campaign_id: CampaignId,
        expected: CampaignRuntimeStatus,
        actual: CampaignRuntimeStatus,
    },

    /// The campaign is unknown to the campaign directory.
    #[error("campaign not found: {0}")]
    NotFound(CampaignId),

    /// Storage backend errors (ledger or registry reads and writes).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Durable work queue transport errors (unreachable, closed, corrupt lease).
    #[error("queue error: {message}")]
    Queue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A job payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VolleyError {
    /// Returns true for transport errors that the worker recovers from by reconnecting.
    pub fn is_transport(&self) -> bool {
        matches!(self, VolleyError::Queue { .. })
    }
}
