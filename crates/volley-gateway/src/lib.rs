// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch client for the external messaging gateway.
//!
//! Turns a [`DeliveryJob`](volley_core::DeliveryJob) into a `sendText` or
//! `sendMedia` call and reports the result as a
//! [`DispatchOutcome`](volley_core::DispatchOutcome). Media file name, MIME
//! type and kind are inferred from the media URL in [`media`].

pub mod client;
pub mod media;
pub mod types;

pub use client::{GatewayClient, GatewayOptions};
pub use media::{MediaInfo, classify_media_kind, file_name_from_url, guess_mime_type};
