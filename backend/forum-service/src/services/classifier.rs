//! Client for the external text-classification endpoint.
//!
//! The upstream answers with either a flat list of `{label, score}` objects
//! or the same list wrapped in one more array. Both are normalized into a
//! single `ClassifierVerdict` (highest score, first seen wins ties). Every
//! failure is reported as `ClassifierUnavailable`; deciding what to do about
//! it is the caller's job.

use crate::config::ClassifierConfig;
use crate::error::AppError;
use crate::metrics::CLASSIFIER_CALLS_TOTAL;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Top label reported by the classifier for one text body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierVerdict {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassifierUnavailable {
    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier returned HTTP {0}")]
    Status(u16),

    #[error("classifier payload not understood: {0}")]
    Malformed(String),
}

impl ClassifierUnavailable {
    fn metric_label(&self) -> &'static str {
        match self {
            ClassifierUnavailable::Transport(_) => "transport",
            ClassifierUnavailable::Status(_) => "status",
            ClassifierUnavailable::Malformed(_) => "malformed",
        }
    }
}

#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify one non-empty text body. Performs exactly one upstream call.
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierUnavailable>;
}

/// HTTP classifier (Hugging Face inference API compatible).
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build classifier client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn call_upstream(&self, text: &str) -> Result<ClassifierVerdict, ClassifierUnavailable> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierUnavailable::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierUnavailable::Status(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ClassifierUnavailable::Malformed(e.to_string()))?;

        select_verdict(&payload)
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierUnavailable> {
        let result = self.call_upstream(text).await;

        match &result {
            Ok(verdict) => {
                CLASSIFIER_CALLS_TOTAL.with_label_values(&["ok"]).inc();
                tracing::debug!(
                    label = %verdict.label,
                    confidence = verdict.confidence,
                    "classifier verdict"
                );
            }
            Err(err) => {
                CLASSIFIER_CALLS_TOTAL
                    .with_label_values(&[err.metric_label()])
                    .inc();
                tracing::warn!(endpoint = %self.endpoint, error = %err, "classifier unavailable");
            }
        }

        result
    }
}

/// Reduce an upstream payload to its highest-scoring label.
pub fn select_verdict(payload: &Value) -> Result<ClassifierVerdict, ClassifierUnavailable> {
    let outer = payload
        .as_array()
        .ok_or_else(|| ClassifierUnavailable::Malformed("expected a JSON array".to_string()))?;

    // `[[{...}, ...]]` -> `[{...}, ...]`, one level only.
    let entries: Vec<&Value> = if outer.first().map(Value::is_array).unwrap_or(false) {
        if outer.len() != 1 {
            return Err(ClassifierUnavailable::Malformed(
                "expected a single nested result list".to_string(),
            ));
        }
        outer[0].as_array().into_iter().flatten().collect()
    } else {
        outer.iter().collect()
    };

    let mut best: Option<ClassifierVerdict> = None;
    for entry in entries {
        let candidate = parse_entry(entry)?;
        let replace = match &best {
            None => true,
            Some(current) => candidate.confidence > current.confidence,
        };
        if replace {
            best = Some(candidate);
        }
    }

    best.ok_or_else(|| ClassifierUnavailable::Malformed("empty result list".to_string()))
}

fn parse_entry(entry: &Value) -> Result<ClassifierVerdict, ClassifierUnavailable> {
    let label = entry
        .get("label")
        .and_then(Value::as_str)
        .ok_or_else(|| ClassifierUnavailable::Malformed("entry without a string label".to_string()))?;

    let score = entry
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| ClassifierUnavailable::Malformed("entry without a numeric score".to_string()))?;

    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ClassifierUnavailable::Malformed(format!(
            "score {} outside [0, 1]",
            score
        )));
    }

    Ok(ClassifierVerdict {
        label: label.to_string(),
        confidence: score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, api_key: Option<&str>, timeout_ms: u64) -> ClassifierConfig {
        ClassifierConfig {
            endpoint: format!("{}/models/toxic-bert", server.uri()),
            api_key: api_key.map(str::to_string),
            timeout_ms,
        }
    }

    #[test]
    fn picks_highest_score_from_flat_list() {
        let payload = json!([
            {"label": "neutral", "score": 0.10},
            {"label": "toxic", "score": 0.95},
            {"label": "insult", "score": 0.40}
        ]);

        let verdict = select_verdict(&payload).unwrap();
        assert_eq!(verdict.label, "toxic");
        assert_eq!(verdict.confidence, 0.95);
    }

    #[test]
    fn unwraps_one_level_of_nesting() {
        let payload = json!([[
            {"label": "toxic", "score": 0.2},
            {"label": "neutral", "score": 0.7}
        ]]);

        let verdict = select_verdict(&payload).unwrap();
        assert_eq!(verdict.label, "neutral");
    }

    #[test]
    fn ties_keep_first_seen() {
        let payload = json!([
            {"label": "insult", "score": 0.5},
            {"label": "toxic", "score": 0.5}
        ]);

        assert_eq!(select_verdict(&payload).unwrap().label, "insult");
    }

    #[test]
    fn unrecognized_shapes_are_unavailable() {
        let cases = vec![
            json!({"label": "toxic", "score": 0.9}),
            json!({"error": "Model is loading"}),
            json!([]),
            json!([[]]),
            json!([[[{"label": "toxic", "score": 0.9}]]]),
            json!([{"label": "toxic"}]),
            json!([{"score": 0.9}]),
            json!([{"label": 3, "score": 0.9}]),
            json!([{"label": "toxic", "score": "high"}]),
            json!([{"label": "toxic", "score": 1.7}]),
            json!("toxic"),
        ];

        for payload in cases {
            assert!(
                matches!(select_verdict(&payload), Err(ClassifierUnavailable::Malformed(_))),
                "payload should be rejected: {}",
                payload
            );
        }
    }

    #[tokio::test]
    async fn posts_inputs_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/toxic-bert"))
            .and(header("authorization", "Bearer hf_test_key"))
            .and(body_json(json!({"inputs": "You're stupid!"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([[{"label": "toxic", "score": 0.95}]])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let classifier = HttpClassifier::new(&config_for(&server, Some("hf_test_key"), 2_000)).unwrap();
        let verdict = classifier.classify("You're stupid!").await.unwrap();

        assert_eq!(
            verdict,
            ClassifierVerdict {
                label: "toxic".into(),
                confidence: 0.95
            }
        );
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
            .mount(&server)
            .await;

        let classifier = HttpClassifier::new(&config_for(&server, None, 2_000)).unwrap();
        assert_eq!(
            classifier.classify("hello").await,
            Err(ClassifierUnavailable::Status(503))
        );
    }

    #[tokio::test]
    async fn non_json_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let classifier = HttpClassifier::new(&config_for(&server, None, 2_000)).unwrap();
        assert!(matches!(
            classifier.classify("hello").await,
            Err(ClassifierUnavailable::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"label": "neutral", "score": 0.9}]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let classifier = HttpClassifier::new(&config_for(&server, None, 50)).unwrap();
        assert!(matches!(
            classifier.classify("hello").await,
            Err(ClassifierUnavailable::Transport(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let config = ClassifierConfig {
            endpoint: "http://127.0.0.1:9/classify".into(),
            api_key: None,
            timeout_ms: 500,
        };

        let classifier = HttpClassifier::new(&config).unwrap();
        assert!(matches!(
            classifier.classify("hello").await,
            Err(ClassifierUnavailable::Transport(_))
        ));
    }
}
