// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted dispatcher for deterministic testing.
//!
//! `ScriptedDispatcher` implements `Dispatcher` with per-number outcomes and
//! captures every job it is asked to send.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use volley_core::{DeliveryJob, DispatchOutcome, Dispatcher};

/// A dispatcher whose outcome per phone number is set up front.
///
/// Numbers without a script are sent successfully.
#[derive(Default)]
pub struct ScriptedDispatcher {
    outcomes: Mutex<HashMap<String, DispatchOutcome>>,
    sent: Mutex<Vec<DeliveryJob>>,
    latency: Duration,
}

impl ScriptedDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send sleeps for `latency` before resolving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes every future send to `phone` fail with `detail`.
    pub fn fail_number(&self, phone: &str, detail: &str) {
        self.script(phone, DispatchOutcome::Failed(detail.to_string()));
    }

    pub fn script(&self, phone: &str, outcome: DispatchOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.insert(phone.to_string(), outcome);
        }
    }

    /// Jobs passed to `send`, in call order.
    pub fn calls(&self) -> Vec<DeliveryJob> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }

    /// Phone numbers passed to `send`, in call order.
    pub fn phones(&self) -> Vec<String> {
        self.calls().into_iter().map(|job| job.phone).collect()
    }
}

#[async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, job: &DeliveryJob) -> DispatchOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(job.clone());
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|outcomes| outcomes.get(&job.phone).cloned())
            .unwrap_or(DispatchOutcome::Sent)
    }
}
