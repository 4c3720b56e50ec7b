// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Validated unit-interval scores
//!
//! [`Probability`] carries a model-estimated spam likelihood and [`Threshold`]
//! carries the cutoff at or above which a probability is labeled spam. Both are
//! closed over `[0.0, 1.0]` and reject NaN at construction.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{SpamLabel, error::SharedTypeError};

fn check_unit(field: &'static str, value: f64) -> Result<f64, SharedTypeError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(SharedTypeError::OutOfRange { field, value });
    }
    Ok(value)
}

/// Spam probability in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    /// Create a new probability with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the value is NaN or outside `[0.0, 1.0]`
    pub fn new(value: f64) -> Result<Self, SharedTypeError> {
        check_unit("spam probability", value).map(Self)
    }

    /// Get the value as f64
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Value expressed as a percentage
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent())
    }
}

impl<'de> Deserialize<'de> for Probability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Decision threshold in `[0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    /// Threshold applied when neither the request nor the model version sets one
    pub const DEFAULT: Threshold = Threshold(0.5);

    /// Create a new threshold with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the value is NaN or outside `[0.0, 1.0]`
    pub fn new(value: f64) -> Result<Self, SharedTypeError> {
        check_unit("threshold", value).map(Self)
    }

    /// Get the value as f64
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Label a probability against this cutoff
    pub fn label_for(self, probability: Probability) -> SpamLabel {
        if probability.as_f64() >= self.0 {
            SpamLabel::Spam
        } else {
            SpamLabel::Ham
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(|e| de::Error::custom(e.to_string()))
    }
}
