// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the messaging gateway.
//!
//! Provides [`GatewayClient`], which builds text and media send requests,
//! authenticates with the per-tenant API key, and maps every response or
//! transport failure to a [`DispatchOutcome`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, warn};

use volley_config::model::GatewayConfig;
use volley_core::{DeliveryJob, DispatchOutcome, Dispatcher, VolleyError};

use crate::media::MediaInfo;
use crate::types::{
    MediaMessage, SendMediaRequest, SendOptions, SendTextRequest, TextMessage,
};

/// Header carrying the tenant API key.
const API_KEY_HEADER: &str = "apikey";

/// Request settings shared by every send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOptions {
    pub text_timeout: Duration,
    pub media_timeout: Duration,
    pub typing_delay_ms: u64,
    pub presence: String,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from(&GatewayConfig::default())
    }
}

impl From<&GatewayConfig> for GatewayOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            text_timeout: Duration::from_secs(config.text_timeout_secs),
            media_timeout: Duration::from_secs(config.media_timeout_secs),
            typing_delay_ms: config.typing_delay_ms,
            presence: config.presence.clone(),
        }
    }
}

/// Dispatch client for the messaging gateway.
///
/// Credentials travel with each job, so one client serves every tenant.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    options: GatewayOptions,
}

impl GatewayClient {
    pub fn new(options: GatewayOptions) -> Result<Self, VolleyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| VolleyError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    fn send_options(&self) -> SendOptions {
        SendOptions {
            delay: self.options.typing_delay_ms,
            presence: self.options.presence.clone(),
        }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        job: &DeliveryJob,
        endpoint: &str,
        body: &B,
        timeout: Duration,
    ) -> DispatchOutcome {
        let credentials = &job.connection;
        let url = format!(
            "{}/message/{endpoint}/{}",
            credentials.base_url(),
            credentials.instance()
        );
        debug!(campaign_id = %job.campaign_id, phone = %job.phone, %url, "sending gateway request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, credentials.api_key())
            .timeout(timeout)
            .json(body)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::OK || status == StatusCode::CREATED {
                    return DispatchOutcome::Sent;
                }
                let body = response.text().await.unwrap_or_default();
                warn!(
                    campaign_id = %job.campaign_id,
                    phone = %job.phone,
                    status = status.as_u16(),
                    "gateway rejected message"
                );
                let detail = if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                };
                DispatchOutcome::Failed(detail)
            }
            Err(e) => {
                warn!(
                    campaign_id = %job.campaign_id,
                    phone = %job.phone,
                    error = %e,
                    "gateway request failed"
                );
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Dispatcher for GatewayClient {
    async fn send(&self, job: &DeliveryJob) -> DispatchOutcome {
        match job.media() {
            None => {
                let body = SendTextRequest {
                    number: job.phone.clone(),
                    options: self.send_options(),
                    text_message: TextMessage {
                        text: job.message.clone(),
                    },
                };
                self.post(job, "sendText", &body, self.options.text_timeout)
                    .await
            }
            Some(media) => {
                let info = MediaInfo::infer(&media.url, media.kind);
                let body = SendMediaRequest {
                    number: job.phone.clone(),
                    options: self.send_options(),
                    media_message: MediaMessage {
                        mediatype: info.kind,
                        mimetype: info.mime_type,
                        caption: job.message.clone(),
                        media: media.url,
                        file_name: info.file_name,
                    },
                };
                self.post(job, "sendMedia", &body, self.options.media_timeout)
                    .await
            }
        }
    }
}
