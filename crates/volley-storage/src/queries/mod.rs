// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level query functions, one module per table group.

pub mod campaigns;
pub mod ledger;
pub mod queue;
