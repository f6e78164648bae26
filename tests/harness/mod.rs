// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for submission abuse simulation.
//!
//! Generates client identifiers and question variants used to drive the
//! pipeline the way a spammer or a misbehaving client would.

pub mod generators;
