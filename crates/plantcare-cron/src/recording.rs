// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder delivery counters.
//!
//! Call [`register_metrics`] once at startup so the descriptions are attached
//! before the first increment.

use metrics::{counter, describe_counter};

pub fn register_metrics() {
    describe_counter!(
        "plantcare_notifications_sent_total",
        "Watering reminders delivered and recorded"
    );
    describe_counter!(
        "plantcare_notifications_failed_total",
        "Watering reminders that could not be delivered or recorded"
    );
}

pub fn record_notification_sent() {
    counter!("plantcare_notifications_sent_total").increment(1);
}

pub fn record_notification_failed(reason: &'static str) {
    counter!("plantcare_notifications_failed_total", "reason" => reason).increment(1);
}
