// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the spam console workspace
//!
//! This crate provides the label enums and validated primitives that are shared
//! by the API contract layer, the workflows and the console binary, avoiding
//! circular dependencies between them.

pub mod error;
pub mod labels;
pub mod non_empty_string;
pub mod probability;

pub use error::SharedTypeError;
pub use labels::{ReviewLabel, SpamLabel};
pub use non_empty_string::NonEmptyString;
pub use probability::{Probability, Threshold};
