// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Console subcommands

pub mod config;
pub mod metrics;
pub mod models;
pub mod predict;
pub mod review;
