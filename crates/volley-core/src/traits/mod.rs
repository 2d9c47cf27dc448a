// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the engine and its backends.
//!
//! All traits use `#[async_trait]` so the engine can hold them as
//! `Arc<dyn Trait>` and tests can swap in scripted implementations.

pub mod directory;
pub mod dispatcher;
pub mod ledger;
pub mod queue;

pub use directory::CampaignDirectory;
pub use dispatcher::Dispatcher;
pub use ledger::DeliveryLedger;
pub use queue::WorkQueue;
