//! Prometheus metrics for forum-service.
//!
//! Exposes moderation and vote collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Upstream classifier calls segmented by result (ok, transport, status, malformed).
    pub static ref CLASSIFIER_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_classifier_calls_total",
        "Classifier calls segmented by result",
        &["result"]
    )
    .expect("failed to register forum_classifier_calls_total");

    /// Moderation gate decisions (skipped, approved, rejected, fail_open).
    pub static ref MODERATION_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_moderation_decisions_total",
        "Moderation gate decisions segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register forum_moderation_decisions_total");

    /// Vote ledger mutations by action (created, updated, removed).
    pub static ref VOTE_ACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_vote_actions_total",
        "Vote casts segmented by resulting action",
        &["action"]
    )
    .expect("failed to register forum_vote_actions_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
