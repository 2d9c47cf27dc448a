// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Volley dispatch engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the three durable stores the
//! engine needs: the lease-based work queue, the append-only delivery ledger,
//! and the campaign registry.

pub mod database;
pub mod directory;
pub mod ledger;
pub mod migrations;
pub mod queries;
pub mod queue;

pub use database::Database;
pub use directory::SqliteCampaignDirectory;
pub use ledger::SqliteLedger;
pub use queue::SqliteWorkQueue;
