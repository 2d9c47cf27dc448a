// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Dispatch Client seam.

use async_trait::async_trait;

use crate::types::{DeliveryJob, DispatchOutcome};

/// Sends one rendered job through the external messaging gateway.
///
/// Implementations never fail past this boundary: transport errors and
/// non-success responses become [`DispatchOutcome::Failed`].
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    async fn send(&self, job: &DeliveryJob) -> DispatchOutcome;
}
