// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lease-based queue operations over the `dispatch_queue` table.
//!
//! A row is pending while `leased_until` is NULL or in the past, and leased
//! otherwise. Every claim bumps the row's `claims` counter; completing,
//! releasing, or renewing a row requires the counter value of the claim
//! being acted on, so a worker whose lease was taken over cannot touch the
//! row any more. Acknowledging a row deletes it.
//!
//! Statements that read before they write run in `IMMEDIATE` transactions:
//! under WAL a deferred transaction that read an older snapshot cannot be
//! upgraded to a writer once another connection has committed.

use rusqlite::types::Value;
use rusqlite::{TransactionBehavior, params};
use volley_core::VolleyError;

use crate::database::Database;

/// A claimed queue row before its payload is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub id: i64,
    pub campaign_id: String,
    pub payload: String,
    /// Delivery count including the claim that returned this row.
    pub deliveries: u32,
    /// Claim token for this hand-out of the row.
    pub claim: i64,
}

/// Inserts every `(campaign_id, payload)` pair in one transaction, in order.
pub async fn enqueue_batch(
    db: &Database,
    queue_name: &str,
    items: Vec<(String, String)>,
) -> Result<usize, VolleyError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO dispatch_queue (queue_name, campaign_id, payload)
                     VALUES (?1, ?2, ?3)",
                )?;
                for (campaign_id, payload) in &items {
                    stmt.execute(params![queue_name, campaign_id, payload])?;
                }
            }
            tx.commit()?;
            Ok(items.len())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claims up to `limit` of the oldest available rows, excluding `skip`
/// campaigns, and leases them until `now_ms + lease_ms`.
pub async fn claim(
    db: &Database,
    queue_name: &str,
    limit: usize,
    skip: Vec<String>,
    now_ms: i64,
    lease_ms: i64,
) -> Result<Vec<QueueRow>, VolleyError> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut sql = String::from(
                "SELECT id, campaign_id, payload, deliveries, claims FROM dispatch_queue
                 WHERE queue_name = ?1
                   AND (leased_until IS NULL OR leased_until <= ?2)",
            );
            if !skip.is_empty() {
                let placeholders: Vec<String> =
                    (0..skip.len()).map(|i| format!("?{}", i + 4)).collect();
                sql.push_str(&format!(
                    " AND campaign_id NOT IN ({})",
                    placeholders.join(", ")
                ));
            }
            sql.push_str(" ORDER BY id ASC LIMIT ?3");

            let mut values: Vec<Value> = vec![
                Value::Text(queue_name),
                Value::Integer(now_ms),
                Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)),
            ];
            values.extend(skip.into_iter().map(Value::Text));

            let rows = {
                let mut stmt = tx.prepare(&sql)?;
                let mapped = stmt.query_map(rusqlite::params_from_iter(values), |row| {
                    Ok(QueueRow {
                        id: row.get(0)?,
                        campaign_id: row.get(1)?,
                        payload: row.get(2)?,
                        deliveries: row.get(3)?,
                        claim: row.get(4)?,
                    })
                })?;
                mapped.collect::<Result<Vec<_>, _>>()?
            };

            let leased_until = now_ms.saturating_add(lease_ms);
            {
                let mut update = tx.prepare(
                    "UPDATE dispatch_queue
                     SET leased_until = ?1, deliveries = deliveries + 1, claims = claims + 1
                     WHERE id = ?2",
                )?;
                for row in &rows {
                    update.execute(params![leased_until, row.id])?;
                }
            }
            tx.commit()?;

            Ok(rows
                .into_iter()
                .map(|row| QueueRow {
                    deliveries: row.deliveries.saturating_add(1),
                    claim: row.claim + 1,
                    ..row
                })
                .collect())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes a row whatever its lease. Returns whether it still existed.
pub async fn delete(db: &Database, id: i64) -> Result<bool, VolleyError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM dispatch_queue WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes a row if `claim` is still its latest claim.
pub async fn complete(db: &Database, id: i64, claim: i64) -> Result<bool, VolleyError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM dispatch_queue WHERE id = ?1 AND claims = ?2",
                params![id, claim],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Clears the lease of a row still held under `claim` so it is immediately
/// claimable again. With `count_attempt` false the claim is not counted as a
/// delivery.
pub async fn release(
    db: &Database,
    id: i64,
    claim: i64,
    count_attempt: bool,
) -> Result<bool, VolleyError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE dispatch_queue
                 SET leased_until = NULL,
                     deliveries = CASE WHEN ?3 THEN deliveries ELSE MAX(deliveries - 1, 0) END
                 WHERE id = ?1 AND claims = ?2",
                params![id, claim, count_attempt],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Moves the lease of a row still held under `claim` to `leased_until`.
pub async fn renew(
    db: &Database,
    id: i64,
    claim: i64,
    leased_until: i64,
) -> Result<bool, VolleyError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE dispatch_queue SET leased_until = ?3 WHERE id = ?1 AND claims = ?2",
                params![id, claim, leased_until],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes the campaign's rows that are not under a live lease.
pub async fn purge_pending(
    db: &Database,
    queue_name: &str,
    campaign_id: &str,
    now_ms: i64,
) -> Result<usize, VolleyError> {
    let queue_name = queue_name.to_string();
    let campaign_id = campaign_id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM dispatch_queue
                 WHERE queue_name = ?1 AND campaign_id = ?2
                   AND (leased_until IS NULL OR leased_until <= ?3)",
                params![queue_name, campaign_id, now_ms],
            )?;
            Ok(removed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Returns `(pending, leased)` row counts for a queue at `now_ms`.
pub async fn depth(db: &Database, queue_name: &str, now_ms: i64) -> Result<(u64, u64), VolleyError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let (pending, leased): (i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN leased_until IS NULL OR leased_until <= ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN leased_until > ?2 THEN 1 ELSE 0 END), 0)
                 FROM dispatch_queue WHERE queue_name = ?1",
                params![queue_name, now_ms],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((pending.max(0) as u64, leased.max(0) as u64))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
