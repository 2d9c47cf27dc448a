// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only operations over the `delivery_ledger` table.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use rusqlite::params;
use volley_core::{CampaignId, DeliveryStatus, LedgerEntry, NewLedgerEntry, VolleyError};

use crate::database::Database;

fn parse_status(idx: usize, raw: String) -> Result<DeliveryStatus, rusqlite::Error> {
    DeliveryStatus::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Appends one entry and returns its row id.
pub async fn insert_entry(db: &Database, entry: &NewLedgerEntry) -> Result<i64, VolleyError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO delivery_ledger
                    (campaign_id, contact_number, contact_name, status, error_message, idempotency_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.campaign_id.as_str(),
                    entry.contact_number,
                    entry.contact_name,
                    entry.status.to_string(),
                    entry.error_message,
                    entry.idempotency_key,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All entries for a campaign ordered by id.
pub async fn list_entries(
    db: &Database,
    campaign_id: &CampaignId,
) -> Result<Vec<LedgerEntry>, VolleyError> {
    let campaign_id = campaign_id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, contact_number, contact_name, status,
                        error_message, idempotency_key, created_at
                 FROM delivery_ledger
                 WHERE campaign_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![campaign_id.as_str()], |row| {
                Ok(LedgerEntry {
                    id: row.get(0)?,
                    campaign_id: CampaignId(row.get(1)?),
                    contact_number: row.get(2)?,
                    contact_name: row.get(3)?,
                    status: parse_status(4, row.get(4)?)?,
                    error_message: row.get(5)?,
                    idempotency_key: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Distinct contact numbers with any entry for the campaign.
pub async fn distinct_numbers(
    db: &Database,
    campaign_id: &CampaignId,
) -> Result<HashSet<String>, VolleyError> {
    let campaign_id = campaign_id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT contact_number FROM delivery_ledger WHERE campaign_id = ?1",
            )?;
            let rows = stmt.query_map(params![campaign_id.as_str()], |row| row.get(0))?;
            rows.collect::<Result<HashSet<String>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Row counts per status for the campaign. Statuses with no rows are absent.
pub async fn count_by_status(
    db: &Database,
    campaign_id: &CampaignId,
) -> Result<BTreeMap<DeliveryStatus, u64>, VolleyError> {
    let campaign_id = campaign_id.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM delivery_ledger
                 WHERE campaign_id = ?1
                 GROUP BY status",
            )?;
            let rows = stmt.query_map(params![campaign_id.as_str()], |row| {
                let status = parse_status(0, row.get(0)?)?;
                let count: i64 = row.get(1)?;
                Ok((status, count.max(0) as u64))
            })?;
            rows.collect::<Result<BTreeMap<_, _>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether any entry carries `key`.
pub async fn has_key(db: &Database, key: &str) -> Result<bool, VolleyError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM delivery_ledger WHERE idempotency_key = ?1)",
                params![key],
                |row| row.get(0),
            )?;
            Ok(found)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
