// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign and contact files accepted by `volley start`.
//!
//! A campaign is a TOML document:
//!
//! ```toml
//! id = "spring-sale"
//! name = "Spring sale"
//! message_template = "Hi $contact_name, your number is $contact_number"
//! messages_per_minute = 20
//!
//! [media]
//! url = "https://cdn.example.com/flyer.png"
//! kind = "image"
//!
//! [connection]
//! base_url = "https://gateway.example.com"
//! api_key = "secret"
//! instance = "store-01"
//! ```
//!
//! Contacts are a CSV file with a `number` column and an optional `name`
//! column.

use std::path::Path;

use serde::Deserialize;
use volley_core::{CampaignDefinition, ContactRef, VolleyError};

/// Reads and parses a campaign definition file.
pub fn load_campaign(path: &Path) -> Result<CampaignDefinition, VolleyError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        VolleyError::Config(format!("cannot read campaign file {}: {e}", path.display()))
    })?;
    parse_campaign(&content)
        .map_err(|e| VolleyError::Config(format!("invalid campaign file {}: {e}", path.display())))
}

fn parse_campaign(content: &str) -> Result<CampaignDefinition, toml::de::Error> {
    toml::from_str(content)
}

#[derive(Debug, Deserialize)]
struct ContactRow {
    number: String,
    #[serde(default)]
    name: Option<String>,
}

/// Reads a contacts CSV file. Rows with a blank number are dropped.
pub fn load_contacts(path: &Path) -> Result<Vec<ContactRef>, VolleyError> {
    let file = std::fs::File::open(path).map_err(|e| {
        VolleyError::Config(format!("cannot read contacts file {}: {e}", path.display()))
    })?;
    parse_contacts(file)
        .map_err(|e| VolleyError::Config(format!("invalid contacts file {}: {e}", path.display())))
}

fn parse_contacts(reader: impl std::io::Read) -> Result<Vec<ContactRef>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut contacts = Vec::new();
    for row in reader.deserialize::<ContactRow>() {
        let row = row?;
        if row.number.is_empty() {
            continue;
        }
        let name = row.name.filter(|n| !n.is_empty());
        contacts.push(ContactRef {
            number: row.number,
            name,
        });
    }
    Ok(contacts)
}
