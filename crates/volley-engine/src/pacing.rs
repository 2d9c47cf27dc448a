// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-campaign pacing lanes.
//!
//! Each campaign that has dispatched recently owns a lane recording the
//! earliest instant it may dispatch again. Workers skip jobs of campaigns
//! whose lane is not ready yet, so interleaved campaigns each keep their own
//! cadence instead of sharing one worker-wide sleep.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;
use volley_core::CampaignId;

/// Upper bound on how far a single dispatch can push a lane.
const MAX_LANE_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Lane table shared by every worker loop in a process.
#[derive(Debug, Default)]
pub struct CampaignPacer {
    lanes: DashMap<CampaignId, Instant>,
}

impl CampaignPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a dispatch slot for `campaign_id` if its lane is ready, pushing
    /// the lane forward by `delay`. Returns false if the lane is still busy.
    pub fn try_acquire(&self, campaign_id: &CampaignId, delay: Duration) -> bool {
        let now = Instant::now();
        let mut lane = self.lanes.entry(campaign_id.clone()).or_insert(now);
        if *lane > now {
            trace!(campaign_id = %campaign_id, "pacing lane busy");
            return false;
        }
        *lane = now + delay.min(MAX_LANE_DELAY);
        true
    }

    /// Campaigns that may not dispatch yet. Drops lanes that have gone idle.
    pub fn throttled(&self) -> Vec<CampaignId> {
        let now = Instant::now();
        self.lanes.retain(|_, next| *next > now);
        self.lanes.iter().map(|lane| lane.key().clone()).collect()
    }

    /// Time until the earliest busy lane becomes ready, if any lane is busy.
    pub fn next_ready_in(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lanes
            .iter()
            .filter(|lane| *lane.value() > now)
            .map(|lane| lane.value().saturating_duration_since(now))
            .min()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}
