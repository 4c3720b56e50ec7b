// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Classification and review label types

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SharedTypeError;

/// Label produced by the classifier for a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamLabel {
    /// Unsolicited or malicious message
    Spam,
    /// Legitimate message
    Ham,
}

impl SpamLabel {
    /// Check if the label represents spam
    pub fn is_spam(self) -> bool {
        matches!(self, SpamLabel::Spam)
    }

    /// Wire spelling of the label
    pub fn as_str(self) -> &'static str {
        match self {
            SpamLabel::Spam => "spam",
            SpamLabel::Ham => "ham",
        }
    }
}

impl fmt::Display for SpamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpamLabel {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(SpamLabel::Spam),
            "ham" => Ok(SpamLabel::Ham),
            _ => Err(SharedTypeError::UnknownLabel {
                value: s.to_string(),
                expected: "spam, ham",
            }),
        }
    }
}

/// Terminal label an operator assigns to a review queue item
///
/// All three labels are equally terminal: the item leaves the working set once
/// the backend acknowledges any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewLabel {
    /// Operator confirms the message is spam
    Spam,
    /// Operator confirms the message is legitimate
    Ham,
    /// Operator declines to label the message
    Skip,
}

impl ReviewLabel {
    /// Classification label this review asserts, if any
    pub fn as_spam_label(self) -> Option<SpamLabel> {
        match self {
            ReviewLabel::Spam => Some(SpamLabel::Spam),
            ReviewLabel::Ham => Some(SpamLabel::Ham),
            ReviewLabel::Skip => None,
        }
    }

    /// Wire spelling of the label
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewLabel::Spam => "spam",
            ReviewLabel::Ham => "ham",
            ReviewLabel::Skip => "skip",
        }
    }
}

impl From<SpamLabel> for ReviewLabel {
    fn from(label: SpamLabel) -> Self {
        match label {
            SpamLabel::Spam => ReviewLabel::Spam,
            SpamLabel::Ham => ReviewLabel::Ham,
        }
    }
}

impl fmt::Display for ReviewLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewLabel {
    type Err = SharedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(ReviewLabel::Spam),
            "ham" => Ok(ReviewLabel::Ham),
            "skip" => Ok(ReviewLabel::Skip),
            _ => Err(SharedTypeError::UnknownLabel {
                value: s.to_string(),
                expected: "spam, ham, skip",
            }),
        }
    }
}
