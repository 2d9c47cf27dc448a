// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request bodies for the gateway's send endpoints.

use serde::Serialize;
use volley_core::MediaKind;

/// Provider-level hints sent with every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOptions {
    /// Typing simulation in milliseconds.
    pub delay: u64,
    pub presence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessage {
    pub text: String,
}

/// Body for `POST /message/sendText/{instance}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTextRequest {
    pub number: String,
    pub options: SendOptions,
    pub text_message: TextMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    pub mediatype: MediaKind,
    pub mimetype: String,
    pub caption: String,
    pub media: String,
    pub file_name: String,
}

/// Body for `POST /message/sendMedia/{instance}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    pub number: String,
    pub options: SendOptions,
    pub media_message: MediaMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SendOptions {
        SendOptions {
            delay: 1200,
            presence: "composing".into(),
        }
    }

    #[test]
    fn text_request_shape() {
        let body = SendTextRequest {
            number: "5511".into(),
            options: options(),
            text_message: TextMessage { text: "hi".into() },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "number": "5511",
                "options": {"delay": 1200, "presence": "composing"},
                "textMessage": {"text": "hi"}
            })
        );
    }

    #[test]
    fn media_request_shape() {
        let body = SendMediaRequest {
            number: "5511".into(),
            options: options(),
            media_message: MediaMessage {
                mediatype: MediaKind::Document,
                mimetype: "application/pdf".into(),
                caption: "see attached".into(),
                media: "https://x.test/a.pdf".into(),
                file_name: "a.pdf".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mediaMessage"]["mediatype"], "document");
        assert_eq!(json["mediaMessage"]["fileName"], "a.pdf");
        assert_eq!(json["mediaMessage"]["mimetype"], "application/pdf");
        assert_eq!(json["options"]["presence"], "composing");
    }
}
