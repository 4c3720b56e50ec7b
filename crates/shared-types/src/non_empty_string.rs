// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Non-empty string validation utilities
//!
//! [`NonEmptyString`] guarantees at construction that a value contains at least
//! one non-whitespace character. Message text submitted for prediction and model
//! version identifiers are both carried in this type, so an empty value can never
//! reach the backend.
//!
//! # Examples
//!
//! ```rust
//! use shared_types::NonEmptyString;
//!
//! let version = NonEmptyString::new("v3").expect("valid version");
//! assert_eq!(version.as_str(), "v3");
//!
//! assert!(NonEmptyString::new("").is_err());
//! assert!(NonEmptyString::new("   \t\n  ").is_err());
//! ```

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::SharedTypeError;

/// A non-empty string wrapper that ensures validity at construction
///
/// Leading and trailing whitespace is preserved; only whitespace-only input is
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NonEmptyString(Box<str>);

impl NonEmptyString {
    /// Create a new `NonEmptyString` from any string-like input
    ///
    /// # Errors
    ///
    /// Returns [`SharedTypeError::EmptyString`] if the input is empty or
    /// whitespace-only
    pub fn new(s: impl Into<String>) -> Result<Self, SharedTypeError> {
        Self::named("value", s)
    }

    /// Same as [`NonEmptyString::new`], naming the field in the error
    ///
    /// # Errors
    ///
    /// Returns [`SharedTypeError::EmptyString`] carrying `field` if the input is
    /// empty or whitespace-only
    pub fn named(field: &'static str, s: impl Into<String>) -> Result<Self, SharedTypeError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(SharedTypeError::EmptyString { field })
        } else {
            Ok(NonEmptyString(s.into_boxed_str()))
        }
    }

    /// Get a string slice of the contained value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NonEmptyString {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for NonEmptyString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(|e| de::Error::custom(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_input() {
        assert!(NonEmptyString::new("").is_err());
        assert!(NonEmptyString::new("   ").is_err());
        assert!(NonEmptyString::new("\t\n").is_err());
    }

    #[test]
    fn preserves_surrounding_whitespace() {
        let s = NonEmptyString::new(" hello ").unwrap();
        assert_eq!(s.as_str(), " hello ");
        assert_eq!(s.to_string(), " hello ");
    }

    #[test]
    fn named_error_mentions_field() {
        let err = NonEmptyString::named("model version", " ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "model version cannot be empty or whitespace-only"
        );
    }

    #[test]
    fn deserialization_validates() {
        let ok: NonEmptyString = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(ok.as_str(), "v1");
        assert!(serde_json::from_str::<NonEmptyString>("\"  \"").is_err());
    }
}
