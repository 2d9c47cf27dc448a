// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign and contact fixtures.

use volley_core::{CampaignDefinition, CampaignId, ConnectionCredentials, ContactRef};

/// A text-only campaign with a name/number template.
pub fn campaign(id: &str, messages_per_minute: i64) -> CampaignDefinition {
    CampaignDefinition {
        id: CampaignId::from(id),
        name: format!("campaign {id}"),
        message_template: "Hello $contact_name ($contact_number)".to_string(),
        media: None,
        messages_per_minute,
        connection: ConnectionCredentials::new("http://gateway.test", "test-key", "test-instance"),
    }
}

/// `count` contacts numbered `5500000000001`, `5500000000002`, ...
pub fn contacts(count: usize) -> Vec<ContactRef> {
    (1..=count)
        .map(|i| {
            let name = format!("Contact {i}");
            ContactRef::new(format!("55000000000{i:02}"), Some(name.as_str()))
        })
        .collect()
}
