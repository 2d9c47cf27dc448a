// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign registry queries: definitions, ordered contact lists, and the
//! versioned runtime status.

use std::str::FromStr;

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use volley_core::{
    CampaignDefinition, CampaignId, CampaignRuntimeStatus, ConnectionCredentials, ContactRef,
    MediaKind, MediaReference, VolleyError,
};

use crate::database::Database;

/// Result of a compare-and-swap on the campaign status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// The stored status did not match; carries the status actually found.
    Conflict(CampaignRuntimeStatus),
    Missing,
}

fn text_conversion<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_runtime_status(idx: usize, raw: &str) -> Result<CampaignRuntimeStatus, rusqlite::Error> {
    CampaignRuntimeStatus::from_str(raw).map_err(|e| text_conversion(idx, e))
}

/// Outcome of [`register_campaign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// A `draft` campaign with this id existed and its definition and
    /// contacts were overwritten.
    Replaced,
    /// The id is taken by a campaign that already left `draft`.
    Rejected(CampaignRuntimeStatus),
}

/// Registers a campaign in `draft` with its contacts.
///
/// A campaign still in `draft` (a start that never reached `processing`)
/// is overwritten; any other existing campaign is left untouched.
pub async fn register_campaign(
    db: &Database,
    definition: &CampaignDefinition,
    contacts: &[ContactRef],
) -> Result<Registration, VolleyError> {
    let definition = definition.clone();
    let contacts = contacts.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM campaigns WHERE id = ?1",
                    params![definition.id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let current = current
                .map(|raw| parse_runtime_status(0, &raw))
                .transpose()?;

            let media_url = definition.media.as_ref().map(|m| m.url.clone());
            let media_kind = definition
                .media
                .as_ref()
                .and_then(|m| m.kind)
                .map(|k| k.to_string());
            let id = definition.id.as_str();
            let base_url = definition.connection.base_url();
            let api_key = definition.connection.api_key();
            let instance = definition.connection.instance();
            let fields = params![
                id,
                definition.name,
                definition.message_template,
                media_url,
                media_kind,
                definition.messages_per_minute,
                base_url,
                api_key,
                instance,
            ];

            let outcome = match current {
                None => {
                    tx.execute(
                        "INSERT INTO campaigns
                            (id, name, message_template, media_url, media_kind,
                             messages_per_minute, base_url, api_key, instance)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        fields,
                    )?;
                    Registration::Inserted
                }
                Some(CampaignRuntimeStatus::Draft) => {
                    tx.execute(
                        "UPDATE campaigns
                         SET name = ?2, message_template = ?3, media_url = ?4, media_kind = ?5,
                             messages_per_minute = ?6, base_url = ?7, api_key = ?8,
                             instance = ?9, version = version + 1,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        fields,
                    )?;
                    tx.execute(
                        "DELETE FROM campaign_contacts WHERE campaign_id = ?1",
                        params![id],
                    )?;
                    Registration::Replaced
                }
                Some(status) => return Ok(Registration::Rejected(status)),
            };
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO campaign_contacts (campaign_id, position, number, name)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (position, contact) in contacts.iter().enumerate() {
                    stmt.execute(params![
                        id,
                        position as i64,
                        contact.number,
                        contact.name,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_definition(
    db: &Database,
    id: &CampaignId,
) -> Result<Option<CampaignDefinition>, VolleyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, message_template, media_url, media_kind, messages_per_minute,
                        base_url, api_key, instance
                 FROM campaigns WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let media_url: Option<String> = row.get(3)?;
                    let media_kind: Option<String> = row.get(4)?;
                    let kind = media_kind
                        .map(|k| MediaKind::from_str(&k).map_err(|e| text_conversion(4, e)))
                        .transpose()?;
                    let base_url: String = row.get(6)?;
                    let api_key: String = row.get(7)?;
                    let instance: String = row.get(8)?;
                    Ok(CampaignDefinition {
                        id: CampaignId(row.get(0)?),
                        name: row.get(1)?,
                        message_template: row.get(2)?,
                        media: media_url.map(|url| MediaReference { url, kind }),
                        messages_per_minute: row.get(5)?,
                        connection: ConnectionCredentials::new(base_url, api_key, instance),
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Contacts in list order.
pub async fn get_contacts(db: &Database, id: &CampaignId) -> Result<Vec<ContactRef>, VolleyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT number, name FROM campaign_contacts
                 WHERE campaign_id = ?1
                 ORDER BY position ASC",
            )?;
            let rows = stmt.query_map(params![id.as_str()], |row| {
                Ok(ContactRef {
                    number: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Current status and generation, or `None` for an unknown campaign.
pub async fn get_status(
    db: &Database,
    id: &CampaignId,
) -> Result<Option<(CampaignRuntimeStatus, u32)>, VolleyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT status, generation FROM campaigns WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let raw: String = row.get(0)?;
                    Ok((parse_runtime_status(0, &raw)?, row.get(1)?))
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Moves the status from `expected` to `new` only if it is still `expected`.
pub async fn compare_and_set_status(
    db: &Database,
    id: &CampaignId,
    expected: CampaignRuntimeStatus,
    new: CampaignRuntimeStatus,
) -> Result<StatusUpdate, VolleyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE campaigns
                 SET status = ?3, version = version + 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = ?2",
                params![id.as_str(), expected.to_string(), new.to_string()],
            )?;
            let outcome = if changed > 0 {
                StatusUpdate::Applied
            } else {
                let current: Option<String> = tx
                    .query_row(
                        "SELECT status FROM campaigns WHERE id = ?1",
                        params![id.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                match current {
                    Some(raw) => StatusUpdate::Conflict(parse_runtime_status(0, &raw)?),
                    None => StatusUpdate::Missing,
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Increments the generation and returns the new value.
pub async fn bump_generation(db: &Database, id: &CampaignId) -> Result<Option<u32>, VolleyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "UPDATE campaigns
                 SET generation = generation + 1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING generation",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
