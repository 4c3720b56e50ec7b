// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Wire types for the backend contract
//!
//! Response shapes the backend is allowed to vary (array or wrapped object,
//! bare number or structured count) are folded into one canonical shape here,
//! so nothing downstream branches on them.

use std::{fmt, hash::Hash};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{NonEmptyString, Probability, ReviewLabel, SpamLabel, Threshold};
use tracing::warn;

/// Body of a prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    /// Message to classify
    pub text: NonEmptyString,
    /// Optional override of the serving model's threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
}

impl PredictRequest {
    /// Create a request that uses the serving model's threshold
    pub fn new(text: NonEmptyString) -> Self {
        Self {
            text,
            threshold: None,
        }
    }

    /// Override the decision threshold for this request
    #[must_use]
    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Outcome of a single prediction
///
/// Every field is optional on the wire: a success response with an empty body
/// decodes to a result with nothing set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted label
    pub label: Option<SpamLabel>,
    /// Model-estimated spam probability
    pub spam_probability: Option<Probability>,
    /// Version of the model that produced the result
    pub model_version: Option<String>,
    /// Message text echoed back by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Per-feature contributions, when the backend chose to compute them
    #[serde(
        default,
        deserialize_with = "lenient_explanation",
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<Explanation>,
}

impl PredictionResult {
    /// Check if the result is labeled spam
    pub fn is_spam(&self) -> bool {
        self.label.is_some_and(SpamLabel::is_spam)
    }
}

/// Signed contribution of one feature toward the prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Token or feature label
    pub name: String,
    /// Positive values push toward spam, negative toward ham
    pub value: f64,
}

impl FeatureImportance {
    /// Label this feature pushes toward, `None` when it has no effect
    pub fn pushes_toward(&self) -> Option<SpamLabel> {
        if self.value > 0.0 {
            Some(SpamLabel::Spam)
        } else if self.value < 0.0 {
            Some(SpamLabel::Ham)
        } else {
            None
        }
    }

    /// Strength of the contribution regardless of direction
    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }
}

/// Model explanation attached to a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExplanation")]
pub struct Explanation {
    /// Feature contributions in backend order
    #[serde(rename = "feature_importances")]
    pub features: Vec<FeatureImportance>,
}

impl Explanation {
    /// Check if the explanation carries no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExplanation {
    Bare(Vec<serde_json::Value>),
    Keyed {
        #[serde(default, alias = "features")]
        feature_importances: Vec<serde_json::Value>,
    },
}

#[derive(Deserialize)]
struct RawFeature {
    name: String,
    #[serde(default)]
    value: Option<f64>,
}

impl From<RawExplanation> for Explanation {
    fn from(raw: RawExplanation) -> Self {
        let (RawExplanation::Bare(entries)
        | RawExplanation::Keyed {
            feature_importances: entries,
        }) = raw;

        // a missing or null contribution counts as no effect
        let features = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<RawFeature>(entry) {
                Ok(raw) => Some(FeatureImportance {
                    name: raw.name,
                    value: raw.value.filter(|v| v.is_finite()).unwrap_or(0.0),
                }),
                Err(e) => {
                    warn!(error = %e, "skipping malformed feature contribution");
                    None
                }
            })
            .collect();
        Self { features }
    }
}

/// Explanations are secondary: an unrecognized shape drops the explanation,
/// never the prediction
fn lenient_explanation<'de, D>(deserializer: D) -> Result<Option<Explanation>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value::<Explanation>(raw) {
        Ok(explanation) => Ok(Some(explanation)),
        Err(e) => {
            warn!(error = %e, "ignoring unrecognized explanation");
            Ok(None)
        }
    }
}

/// Identifier of a review queue item
///
/// Backends may key items by number or by string. The identifier compares by
/// its textual form and serializes back in the form it arrived in.
#[derive(Debug, Clone, Eq)]
pub struct ReviewId {
    value: String,
    numeric: bool,
}

impl ReviewId {
    /// Identifier in textual form
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Check if the identifier travels as a JSON number
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl PartialEq for ReviewId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Hash for ReviewId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<String> for ReviewId {
    fn from(value: String) -> Self {
        Self {
            value,
            numeric: false,
        }
    }
}

impl From<&str> for ReviewId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<u64> for ReviewId {
    fn from(value: u64) -> Self {
        Self {
            value: value.to_string(),
            numeric: true,
        }
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for ReviewId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value.parse::<u64>() {
            Ok(number) if self.numeric => serializer.serialize_u64(number),
            _ => serializer.serialize_str(&self.value),
        }
    }
}

impl<'de> Deserialize<'de> for ReviewId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => ReviewId::from(n),
            RawId::Text(s) => ReviewId::from(s),
        })
    }
}

/// Low-confidence prediction awaiting a human label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Stable identifier
    pub id: ReviewId,
    /// Original message text
    pub text: String,
    /// Spam probability at the time the item was queued
    #[serde(default)]
    pub score: Option<Probability>,
}

/// Review queue payload in either of its accepted shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReviewQueue {
    Bare(Vec<ReviewItem>),
    Wrapped {
        #[serde(default)]
        items: Vec<ReviewItem>,
    },
}

impl ReviewQueue {
    pub(crate) fn into_items(self) -> Vec<ReviewItem> {
        match self {
            ReviewQueue::Bare(items) | ReviewQueue::Wrapped { items } => items,
        }
    }
}

/// Terminal label submission for one review item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    /// Item being resolved
    pub id: ReviewId,
    /// Operator's label
    pub label: ReviewLabel,
}

/// A deployed or deployable model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Operator-chosen identifier, immutable once created
    pub version: String,
    /// Upload time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Serving threshold; 0.5 when the backend stores none
    #[serde(default, deserialize_with = "threshold_or_default")]
    pub threshold: Threshold,
    /// Artifact location on the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Training metrics recorded with the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
    /// Serving flag, for backends that report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Model listing in either of its accepted shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelListing {
    Bare(Vec<ModelVersion>),
    Wrapped {
        #[serde(default, alias = "items")]
        models: Vec<ModelVersion>,
    },
}

impl ModelListing {
    pub(crate) fn into_models(self) -> Vec<ModelVersion> {
        match self {
            ModelListing::Bare(models) | ModelListing::Wrapped { models } => models,
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Parse RFC 3339, or naive ISO-8601 read as UTC
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn threshold_or_default<'de, D>(deserializer: D) -> Result<Threshold, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Threshold>::deserialize(deserializer)?.unwrap_or_default())
}

/// Model artifact to upload
#[derive(Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    /// File name sent with the multipart part
    pub file_name: String,
    /// Artifact contents
    pub bytes: Vec<u8>,
}

impl ModelArtifact {
    /// Create an artifact from a file name and its contents
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Size of the artifact in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the artifact has no contents
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Upload of a new model version
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    /// Binary artifact
    pub artifact: ModelArtifact,
    /// Version the artifact is bound to
    pub version: NonEmptyString,
    /// Serving threshold; the backend applies its default when omitted
    pub threshold: Option<Threshold>,
}

/// Server-computed operational snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Messages scored per day
    pub messages_per_day: Option<f64>,
    /// Fraction of scored messages labeled spam
    pub spam_rate: Option<f64>,
    /// False positives per day
    pub false_positives: Option<f64>,
    /// Mean prediction latency in milliseconds
    pub avg_latency_ms: Option<f64>,
    /// Ordered confidence distribution
    #[serde(default, deserialize_with = "histogram_buckets")]
    pub confidence_histogram: Vec<HistogramBucket>,
}

/// One bucket of the confidence histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBucket {
    /// Lower bound of the bucket
    pub low: f64,
    /// Upper bound, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// Number of predictions in the bucket
    pub count: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBucket {
    Count(f64),
    Structured {
        low: Option<f64>,
        high: Option<f64>,
        #[serde(default)]
        count: Option<f64>,
    },
}

/// Counts may arrive as floats; negative or non-finite counts become zero
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bucket_count(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}

fn histogram_buckets<'de, D>(deserializer: D) -> Result<Vec<HistogramBucket>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawBucket>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, bucket)| {
            // buckets without a lower bound are taken to be tenths
            #[allow(clippy::cast_precision_loss)]
            let implied_low = index as f64 / 10.0;
            match bucket {
                RawBucket::Count(count) => HistogramBucket {
                    low: implied_low,
                    high: None,
                    count: bucket_count(count),
                },
                RawBucket::Structured { low, high, count } => HistogramBucket {
                    low: low.unwrap_or(implied_low),
                    high,
                    count: count.map_or(0, bucket_count),
                },
            }
        })
        .collect())
}

/// Acknowledgment returned by mutating operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Human-readable confirmation
    #[serde(default)]
    pub message: Option<String>,
    /// Version the operation applied to, when echoed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Request to schedule a retraining job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrainRequest {
    /// Dataset location on the backend; its default dataset when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<String>,
    /// Whether to augment the dataset before training
    #[serde(skip_serializing_if = "Option::is_none")]
    pub augment: Option<bool>,
}

/// Acknowledgment of a scheduled retraining job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrainAck {
    /// Human-readable confirmation
    #[serde(default)]
    pub message: Option<String>,
    /// Identifier of the queued job
    #[serde(default)]
    pub job_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prediction_result_from_empty_object() {
        let result: PredictionResult = serde_json::from_value(json!({})).unwrap();
        assert_eq!(result, PredictionResult::default());
        assert!(!result.is_spam());
    }

    #[test]
    fn prediction_result_rejects_out_of_range_probability() {
        let payload = json!({"label": "spam", "spam_probability": 1.7, "model_version": "v1"});
        assert!(serde_json::from_value::<PredictionResult>(payload).is_err());
    }

    #[test]
    fn explanation_accepts_all_shapes() {
        let keyed: Explanation =
            serde_json::from_value(json!({"feature_importances": [{"name": "free", "value": 0.4}]}))
                .unwrap();
        let aliased: Explanation =
            serde_json::from_value(json!({"features": [{"name": "free", "value": 0.4}]})).unwrap();
        let bare: Explanation =
            serde_json::from_value(json!([{"name": "free", "value": 0.4}])).unwrap();

        assert_eq!(keyed, aliased);
        assert_eq!(keyed, bare);
        assert_eq!(keyed.features[0].pushes_toward(), Some(SpamLabel::Spam));

        let empty: Explanation = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn malformed_explanation_keeps_prediction() {
        let result: PredictionResult = serde_json::from_value(json!({
            "label": "spam",
            "spam_probability": 0.93,
            "model_version": "v1",
            "explanation": {"feature_importances": [
                {"name": "free", "value": null},
                {"value": 0.3},
                {"name": "prize", "value": 0.6}
            ]}
        }))
        .unwrap();

        assert_eq!(result.label, Some(SpamLabel::Spam));
        assert_eq!(result.model_version.as_deref(), Some("v1"));
        let features = result.explanation.unwrap().features;
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "free");
        assert_eq!(features[0].value, 0.0);
        assert_eq!(features[1].name, "prize");

        let result: PredictionResult = serde_json::from_value(json!({
            "label": "ham",
            "spam_probability": 0.1,
            "explanation": "not computed"
        }))
        .unwrap();
        assert_eq!(result.label, Some(SpamLabel::Ham));
        assert!(result.explanation.is_none());
    }

    #[test]
    fn feature_direction_follows_sign() {
        let ham = FeatureImportance {
            name: "lunch".to_string(),
            value: -0.25,
        };
        assert_eq!(ham.pushes_toward(), Some(SpamLabel::Ham));
        assert_eq!(ham.magnitude(), 0.25);

        let neutral = FeatureImportance {
            name: "the".to_string(),
            value: 0.0,
        };
        assert_eq!(neutral.pushes_toward(), None);
    }

    #[test]
    fn review_queue_shapes_normalize() {
        let item = json!({"id": "a1", "text": "Hey are we still on for lunch?", "score": 0.12});

        let bare: ReviewQueue = serde_json::from_value(json!([item.clone()])).unwrap();
        let wrapped: ReviewQueue = serde_json::from_value(json!({"items": [item]})).unwrap();
        let empty: ReviewQueue = serde_json::from_value(json!({})).unwrap();

        let bare = bare.into_items();
        let wrapped = wrapped.into_items();
        let empty = empty.into_items();

        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].id.as_str(), "a1");
        assert!(empty.is_empty());
    }

    #[test]
    fn review_id_keeps_wire_form() {
        let item: ReviewItem =
            serde_json::from_value(json!({"id": 42, "text": "hi", "score": null})).unwrap();
        assert_eq!(item.id, ReviewId::from("42"));
        assert!(item.id.is_numeric());
        assert!(!ReviewId::from("42").is_numeric());
        assert!(item.score.is_none());

        let submission = ReviewSubmission {
            id: item.id,
            label: ReviewLabel::Ham,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({"id": 42, "label": "ham"})
        );

        let submission = ReviewSubmission {
            id: ReviewId::from("a1"),
            label: ReviewLabel::Skip,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({"id": "a1", "label": "skip"})
        );
    }

    #[test]
    fn model_version_defaults() {
        let model: ModelVersion = serde_json::from_value(json!({
            "version": "v1",
            "created_at": "2025-10-21T12:30:00.123456",
            "threshold": null,
            "path": "/app/models/v1/artifact.joblib"
        }))
        .unwrap();

        assert_eq!(model.threshold, Threshold::DEFAULT);
        assert!(model.created_at.is_some());
        assert_eq!(model.active, None);

        let bare: ModelVersion = serde_json::from_value(json!({"version": "v2"})).unwrap();
        assert_eq!(bare.threshold, Threshold::DEFAULT);
        assert!(bare.created_at.is_none());
    }

    #[test]
    fn timestamps_parse_with_and_without_offset() {
        assert!(parse_timestamp("2025-10-21T12:30:00Z").is_some());
        assert!(parse_timestamp("2025-10-21T12:30:00+02:00").is_some());
        assert!(parse_timestamp("2025-10-21T12:30:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn histogram_accepts_numbers_and_objects() {
        let snapshot: MetricsSnapshot = serde_json::from_value(json!({
            "messages_per_day": 1200,
            "spam_rate": 0.18,
            "confidence_histogram": [4, {"low": 0.1, "high": 0.2, "count": 6}, {"count": 10}]
        }))
        .unwrap();

        let buckets = &snapshot.confidence_histogram;
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 4);
        assert_eq!(buckets[0].low, 0.0);
        assert_eq!(buckets[1].high, Some(0.2));
        assert_eq!(buckets[2].low, 0.2);
        assert_eq!(snapshot.false_positives, None);
    }

    #[test]
    fn histogram_counts_may_be_floats() {
        let snapshot: MetricsSnapshot = serde_json::from_value(json!({
            "confidence_histogram": [4.0, {"low": 0.1, "count": 6.0}, 2.6, -3, {"count": -1.5}]
        }))
        .unwrap();

        let counts: Vec<u64> = snapshot
            .confidence_histogram
            .iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![4, 6, 3, 0, 0]);
        assert_eq!(snapshot.confidence_histogram[1].low, 0.1);
    }

    #[test]
    fn metrics_from_empty_object() {
        let snapshot: MetricsSnapshot = serde_json::from_value(json!({})).unwrap();
        assert_eq!(snapshot, MetricsSnapshot::default());

        let snapshot: MetricsSnapshot =
            serde_json::from_value(json!({"confidence_histogram": null})).unwrap();
        assert!(snapshot.confidence_histogram.is_empty());
    }

    #[test]
    fn predict_request_omits_missing_threshold() {
        let text = NonEmptyString::new("Free entry! Claim prize now").unwrap();
        let request = PredictRequest::new(text.clone());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"text": "Free entry! Claim prize now"})
        );

        let request = PredictRequest::new(text).with_threshold(Threshold::new(0.7).unwrap());
        assert_eq!(serde_json::to_value(&request).unwrap()["threshold"], 0.7);
    }
}
