// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test utilities: a scripted dispatcher, fixtures, and a harness
//! that wires a full engine over a temp SQLite database.

pub mod fixtures;
pub mod harness;
pub mod mock_dispatcher;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_dispatcher::ScriptedDispatcher;
