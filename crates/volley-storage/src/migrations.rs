// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! every time a [`Database`](crate::Database) is opened.

use volley_core::VolleyError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), VolleyError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| VolleyError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
