// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Volley campaign dispatch engine.
//!
//! This crate provides the error type, the domain types moved between the
//! materializer, the durable work queue, the delivery worker and the ledger,
//! and the trait seams that storage and gateway crates implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VolleyError;
pub use types::{
    CampaignDefinition, CampaignId, CampaignRuntimeStatus, CampaignStats, ConnectionCredentials,
    ContactRef, Delivery, DeliveryJob, DeliveryStatus, DispatchOutcome, LedgerEntry, MediaKind,
    MediaReference, NewLedgerEntry, QueueDepth,
};

pub use traits::{CampaignDirectory, DeliveryLedger, Dispatcher, WorkQueue};
