//! Moderation gate applied to every text-bearing write.
//!
//! Policy: reject only when the classifier's top label is in the harmful set
//! and its confidence is above the threshold. When the classifier cannot be
//! reached the gate lets the write through (fail-open) so discussions stay
//! available during upstream outages.

use crate::config::ModerationConfig;
use crate::error::AppError;
use crate::metrics::MODERATION_DECISIONS_TOTAL;
use crate::services::classifier::{ClassifierVerdict, TextClassifier};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of a single check, kept separate from `AppError` so callers and
/// tests can tell a skip or a fail-open from a real approval.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationDecision {
    /// Empty text, nothing sent upstream
    Skipped,
    Approved(ClassifierVerdict),
    /// Classifier unavailable, write allowed
    FailOpen,
    Rejected(ClassifierVerdict),
}

impl ModerationDecision {
    fn outcome(&self) -> &'static str {
        match self {
            ModerationDecision::Skipped => "skipped",
            ModerationDecision::Approved(_) => "approved",
            ModerationDecision::FailOpen => "fail_open",
            ModerationDecision::Rejected(_) => "rejected",
        }
    }
}

pub struct ModerationGate {
    classifier: Arc<dyn TextClassifier>,
    harmful_labels: HashSet<String>,
    threshold: f64,
}

impl ModerationGate {
    pub fn new(classifier: Arc<dyn TextClassifier>, config: &ModerationConfig) -> Self {
        Self {
            classifier,
            harmful_labels: config.harmful_labels.iter().cloned().collect(),
            threshold: config.threshold,
        }
    }

    pub fn is_harmful(&self, verdict: &ClassifierVerdict) -> bool {
        self.harmful_labels.contains(&verdict.label) && verdict.confidence > self.threshold
    }

    /// Run the policy for one text body.
    pub async fn evaluate(&self, text: &str) -> ModerationDecision {
        let decision = if text.trim().is_empty() {
            ModerationDecision::Skipped
        } else {
            match self.classifier.classify(text).await {
                Ok(verdict) if self.is_harmful(&verdict) => ModerationDecision::Rejected(verdict),
                Ok(verdict) => ModerationDecision::Approved(verdict),
                Err(err) => {
                    tracing::warn!(error = %err, "moderation failing open");
                    ModerationDecision::FailOpen
                }
            }
        };

        MODERATION_DECISIONS_TOTAL
            .with_label_values(&[decision.outcome()])
            .inc();

        decision
    }

    /// `Ok` unless the text is flagged; the error embeds the offending label.
    pub async fn assert_clean(&self, text: &str) -> Result<(), AppError> {
        match self.evaluate(text).await {
            ModerationDecision::Rejected(verdict) => {
                tracing::info!(
                    label = %verdict.label,
                    confidence = verdict.confidence,
                    "content rejected by moderation"
                );
                Err(AppError::ModerationRejected {
                    label: verdict.label,
                })
            }
            _ => Ok(()),
        }
    }

    /// Check several bodies in order, stopping at the first rejection.
    pub async fn assert_all_clean(&self, texts: &[&str]) -> Result<(), AppError> {
        for text in texts {
            self.assert_clean(text).await?;
        }
        Ok(())
    }
}
