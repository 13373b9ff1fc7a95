// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers for intent handling.
//!
//! Uses the metrics-rs facade; without an installed recorder these are no-ops.

use metrics::{describe_counter, describe_histogram};

/// Register intent metric descriptions.
///
/// Called once at startup.
pub fn register_metrics() {
    describe_counter!(
        "plantcare_intents_total",
        "Inbound intents handled, by kind and outcome"
    );
    describe_histogram!(
        "plantcare_intent_duration_seconds",
        "Time spent handling one intent"
    );
}

/// Record a handled intent.
pub fn record_intent(kind: &'static str, outcome: &'static str) {
    metrics::counter!("plantcare_intents_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

/// Record intent handling latency.
pub fn record_intent_duration(seconds: f64) {
    metrics::histogram!("plantcare_intent_duration_seconds").record(seconds);
}
