// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `HttpBackend`
//!
//! Each test stands up a wiremock server playing the classification backend and
//! checks both the request the client sends and how the response is normalized.

use std::num::NonZeroU32;

use api_client::{
    ApiError, HttpBackend, ModelArtifact, PredictRequest, RetrainRequest, ReviewId,
    ReviewSubmission, SpamBackend, UploadRequest,
};
use serde_json::json;
use shared_types::{NonEmptyString, ReviewLabel, SpamLabel, Threshold};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, method, path, query_param},
};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(Url::parse(&server.uri()).unwrap()).unwrap()
}

fn text(s: &str) -> NonEmptyString {
    NonEmptyString::new(s).unwrap()
}

#[tokio::test]
async fn predict_returns_labeled_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict/"))
        .and(body_json(json!({"text": "Free entry! Claim prize now"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "spam",
            "spam_probability": 0.93,
            "model_version": "v1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .predict(PredictRequest::new(text("Free entry! Claim prize now")))
        .await
        .unwrap();

    assert_eq!(result.label, Some(SpamLabel::Spam));
    assert!((result.spam_probability.unwrap().as_f64() - 0.93).abs() < f64::EPSILON);
    assert_eq!(result.model_version.as_deref(), Some("v1"));
    assert!(result.explanation.is_none());
}

#[tokio::test]
async fn predict_sends_threshold_override() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict/"))
        .and(body_json(json!({"text": "hello", "threshold": 0.8})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "ham",
            "spam_probability": 0.7,
            "model_version": "v2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PredictRequest::new(text("hello")).with_threshold(Threshold::new(0.8).unwrap());
    let result = backend_for(&server).predict(request).await.unwrap();

    assert_eq!(result.label, Some(SpamLabel::Ham));
}

#[tokio::test]
async fn predict_parses_explanation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "spam",
            "spam_probability": 0.88,
            "model_version": "v1",
            "explanation": {"features": [
                {"name": "free", "value": 0.41},
                {"name": "meeting", "value": -0.12}
            ]}
        })))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .predict(PredictRequest::new(text("free meeting")))
        .await
        .unwrap();

    let explanation = result.explanation.unwrap();
    assert_eq!(explanation.features.len(), 2);
    assert_eq!(explanation.features[0].pushes_toward(), Some(SpamLabel::Spam));
    assert_eq!(explanation.features[1].pushes_toward(), Some(SpamLabel::Ham));
}

#[tokio::test]
async fn empty_success_body_is_unlabeled_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .predict(PredictRequest::new(text("anything")))
        .await
        .unwrap();

    assert_eq!(result.label, None);
    assert_eq!(result.spam_probability, None);
    assert_eq!(result.model_version, None);
}

#[tokio::test]
async fn out_of_range_probability_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "label": "spam",
            "spam_probability": 1.7
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .predict(PredictRequest::new(text("anything")))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::InvalidResponse {
            operation: "predict",
            ..
        }
    ));
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/activate/v9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Version not found"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .activate_model(text("v9"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Version not found".to_string()
        }
    );
}

#[tokio::test]
async fn error_field_is_used_without_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/metrics"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "metrics store offline"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).get_metrics().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "metrics store offline");
}

#[tokio::test]
async fn raw_text_is_used_for_non_json_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/models"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway from proxy"))
        .mount(&server)
        .await;

    let err = backend_for(&server).list_models().await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(err.message(), "Bad gateway from proxy");
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // nothing listens on port 1
    let backend = HttpBackend::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();

    let err = backend.list_models().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport { .. }));
    assert!(!err.message().is_empty());
}

#[tokio::test]
async fn review_queue_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/queue"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "text": "a", "score": 0.51},
            {"id": 2, "text": "b", "score": 0.48}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = backend_for(&server)
        .list_review_queue(NonZeroU32::new(50).unwrap())
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, ReviewId::from(1_u64));
    assert_eq!(items[1].text, "b");
}

#[tokio::test]
async fn review_queue_accepts_wrapped_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/queue"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "abc", "text": "c", "score": 0.5}]
        })))
        .mount(&server)
        .await;

    let items = backend_for(&server)
        .list_review_queue(api_client::DEFAULT_REVIEW_LIMIT)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id.as_str(), "abc");
}

#[tokio::test]
async fn empty_review_queue_object_is_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let items = backend_for(&server)
        .list_review_queue(api_client::DEFAULT_REVIEW_LIMIT)
        .await
        .unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn submit_review_posts_id_and_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/review/submit"))
        .and(body_json(json!({"id": 7, "label": "skip"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .submit_review(ReviewSubmission {
            id: ReviewId::from(7_u64),
            label: ReviewLabel::Skip,
        })
        .await
        .unwrap();

    assert_eq!(ack.message.as_deref(), Some("ok"));
}

#[tokio::test]
async fn metrics_normalize_histogram_buckets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages_per_day": 1200,
            "spam_rate": 0.12,
            "false_positives": 3,
            "avg_latency_ms": 14.5,
            "confidence_histogram": [5, {"count": 10}, {"low": 0.5, "high": 0.6, "count": 2}]
        })))
        .mount(&server)
        .await;

    let metrics = backend_for(&server).get_metrics().await.unwrap();

    assert_eq!(metrics.messages_per_day, Some(1200.0));
    let buckets = &metrics.confidence_histogram;
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0].count, 5);
    assert!((buckets[1].low - 0.1).abs() < f64::EPSILON);
    assert!((buckets[2].low - 0.5).abs() < f64::EPSILON);
    assert_eq!(buckets[2].high, Some(0.6));
}

#[tokio::test]
async fn list_models_defaults_missing_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"version": "v1", "path": "/models/v1.joblib", "created_at": "2024-05-01T12:00:00", "threshold": null},
            {"version": "v2", "path": "/models/v2.joblib", "created_at": "2024-06-01T08:30:00Z", "threshold": 0.65}
        ])))
        .mount(&server)
        .await;

    let models = backend_for(&server).list_models().await.unwrap();

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].threshold, Threshold::DEFAULT);
    assert!(models[0].created_at.is_some());
    assert_eq!(models[1].threshold, Threshold::new(0.65).unwrap());
}

#[tokio::test]
async fn upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/upload"))
        .and(body_string_contains("name=\"file\"; filename=\"model.joblib\""))
        .and(body_string_contains("name=\"version\""))
        .and(body_string_contains("v3"))
        .and(body_string_contains("name=\"threshold\""))
        .and(body_string_contains("0.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "v3",
            "message": "Model uploaded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .upload_model(UploadRequest {
            artifact: ModelArtifact::new("model.joblib", b"artifact-bytes".to_vec()),
            version: text("v3"),
            threshold: Some(Threshold::new(0.7).unwrap()),
        })
        .await
        .unwrap();

    assert_eq!(ack.version.as_deref(), Some("v3"));
    assert_eq!(ack.message.as_deref(), Some("Model uploaded"));
}

#[tokio::test]
async fn activate_encodes_version_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/activate/release%202"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "activated"})))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .activate_model(text("release 2"))
        .await
        .unwrap();

    assert_eq!(ack.message.as_deref(), Some("activated"));
}

#[tokio::test]
async fn retrain_posts_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/retrain"))
        .and(body_json(json!({"dataset_path": "data/new.csv", "augment": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Retraining scheduled",
            "job_id": "job-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server)
        .retrain(RetrainRequest {
            dataset_path: Some("data/new.csv".to_string()),
            augment: Some(false),
        })
        .await
        .unwrap();

    assert_eq!(ack.job_id.as_deref(), Some("job-42"));
}

#[tokio::test]
async fn base_path_prefix_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(Url::parse(&format!("{}/api", server.uri())).unwrap()).unwrap();
    let models = backend.list_models().await.unwrap();

    assert!(models.is_empty());
}
