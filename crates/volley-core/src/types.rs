// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the queue, ledger, gateway, and engine crates.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a campaign, assigned by the campaign collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CampaignId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CampaignId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Runtime status of a campaign as seen by the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignRuntimeStatus {
    Draft,
    Processing,
    Paused,
}

/// Coarse media kind understood by the messaging gateway.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

/// A media attachment as declared on the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub url: String,
    /// Kind declared by the campaign author; the gateway may infer a better one.
    #[serde(default)]
    pub kind: Option<MediaKind>,
}

/// Gateway credentials for one tenant instance.
///
/// Treated as a capability value: built once, copied into every job, never
/// mutated. The API key is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCredentials {
    base_url: String,
    api_key: String,
    instance: String,
}

impl ConnectionCredentials {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            instance: instance.into(),
        }
    }

    /// Base URL with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("instance", &self.instance)
            .finish()
    }
}

/// Immutable snapshot of a campaign, read once at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDefinition {
    pub id: CampaignId,
    #[serde(default)]
    pub name: String,
    /// Message template; may contain `$contact_name` and `$contact_number`.
    pub message_template: String,
    #[serde(default)]
    pub media: Option<MediaReference>,
    /// Target cadence. Must be positive; anything else is a configuration error.
    pub messages_per_minute: i64,
    pub connection: ConnectionCredentials,
}

/// A contact in a campaign's target set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    /// Phone number, the dispatch identity.
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ContactRef {
    pub fn new(number: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            number: number.into(),
            name: name.map(str::to_string),
        }
    }

    /// Display name, or the empty string when the contact has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// The unit moved through the durable work queue.
///
/// Serialized as the queue message payload. A job is created once per
/// (campaign, contact) attempt and never mutated in transit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryJob {
    pub campaign_id: CampaignId,
    pub phone: String,
    pub name: String,
    /// Template already rendered for this contact.
    pub message: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub delay_seconds: f64,
    pub connection: ConnectionCredentials,
    /// `{campaign}:{phone}:{generation}`; stable across redeliveries of this job.
    pub idempotency_key: String,
}

impl DeliveryJob {
    /// Pacing delay to hold after dispatching this job.
    pub fn delay(&self) -> Duration {
        if self.delay_seconds > 0.0 {
            Duration::try_from_secs_f64(self.delay_seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    pub fn media(&self) -> Option<MediaReference> {
        self.media_url.as_ref().map(|url| MediaReference {
            url: url.clone(),
            kind: self.media_type,
        })
    }
}

/// Terminal outcome recorded for a dispatch attempt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Result of one Dispatch Client call. Never an error: every outcome is a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Response body or transport error message, preserved verbatim.
    Failed(String),
}

impl DispatchOutcome {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            DispatchOutcome::Sent => DeliveryStatus::Sent,
            DispatchOutcome::Failed(_) => DeliveryStatus::Failed,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Sent => None,
            DispatchOutcome::Failed(detail) => Some(detail),
        }
    }
}

/// A ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub campaign_id: CampaignId,
    pub contact_number: String,
    pub contact_name: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub idempotency_key: Option<String>,
}

impl NewLedgerEntry {
    /// Builds the ledger row describing `outcome` for `job`.
    pub fn for_outcome(job: &DeliveryJob, outcome: &DispatchOutcome) -> Self {
        Self {
            campaign_id: job.campaign_id.clone(),
            contact_number: job.phone.clone(),
            contact_name: job.name.clone(),
            status: outcome.status(),
            error_message: outcome.error_detail().map(str::to_string),
            idempotency_key: Some(job.idempotency_key.clone()),
        }
    }
}

/// An appended, immutable ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub contact_number: String,
    pub contact_name: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub idempotency_key: Option<String>,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// A job claimed from the queue, held by one worker until acked or nacked.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Queue-assigned tag used to acknowledge this delivery.
    pub tag: i64,
    pub job: DeliveryJob,
    /// How many times this job has been handed to a worker, this one included.
    pub deliveries: u32,
    /// Lease token of this hand-out. A later claim of the same job
    /// supersedes it.
    pub claim: i64,
}

impl Delivery {
    pub fn redelivered(&self) -> bool {
        self.deliveries > 1
    }
}

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueDepth {
    pub pending: u64,
    pub leased: u64,
}

/// Read-side view of a campaign's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignStats {
    pub campaign_id: CampaignId,
    pub status: CampaignRuntimeStatus,
    /// Row count per ledger status. Attempts, not distinct contacts.
    pub counts: BTreeMap<DeliveryStatus, u64>,
    pub total: u64,
}

impl CampaignStats {
    pub fn count(&self, status: DeliveryStatus) -> u64 {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}
