//! Metrics collection for the bot using Prometheus
//!
//! Tracks how users move through the funnel (triggers by kind), broadcast delivery
//! outcomes and handler failures. Exposed by [`crate::core::metrics_server`].

// registration fails only on duplicate metric names
#![allow(clippy::expect_used)]

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

/// Routed triggers by kind
/// Labels: trigger (start/menu/contact/text/stats/...)
pub static TRIGGERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assistbot_triggers_total",
        "Total number of routed triggers by kind",
        &["trigger"]
    )
    .expect("register assistbot_triggers_total")
});

/// Tariff selections
/// Labels: tariff (basic/assistant)
pub static TARIFF_SELECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assistbot_tariff_selections_total",
        "Total number of tariff selections",
        &["tariff"]
    )
    .expect("register assistbot_tariff_selections_total")
});

/// Broadcast deliveries by outcome
/// Labels: outcome (success/failure)
pub static BROADCAST_DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assistbot_broadcast_deliveries_total",
        "Total number of broadcast delivery attempts by outcome",
        &["outcome"]
    )
    .expect("register assistbot_broadcast_deliveries_total")
});

/// Handler failures answered with the generic apology
/// Labels: kind (persistence/telegram/other)
pub static HANDLER_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "assistbot_handler_errors_total",
        "Total number of failed trigger handlers",
        &["kind"]
    )
    .expect("register assistbot_handler_errors_total")
});

/// Users currently inside a multi-step conversation
pub static ACTIVE_CONVERSATIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "assistbot_active_conversations",
        "Number of users with a pending conversation state"
    )
    .expect("register assistbot_active_conversations")
});

/// Touches every metric so they show up in /metrics with zero values
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    for trigger in ["start", "menu", "contact", "text", "cancel"] {
        TRIGGERS_TOTAL.with_label_values(&[trigger]);
    }
    for tariff in ["basic", "assistant"] {
        TARIFF_SELECTIONS_TOTAL.with_label_values(&[tariff]);
    }
    for outcome in ["success", "failure"] {
        BROADCAST_DELIVERIES_TOTAL.with_label_values(&[outcome]);
    }
    for kind in ["persistence", "telegram", "other"] {
        HANDLER_ERRORS_TOTAL.with_label_values(&[kind]);
    }
    let _ = &*ACTIVE_CONVERSATIONS;

    log::info!("Metrics registry initialized");
}

pub fn record_trigger(trigger: &str) {
    TRIGGERS_TOTAL.with_label_values(&[trigger]).inc();
}

pub fn record_tariff_selection(tariff: &str) {
    TARIFF_SELECTIONS_TOTAL.with_label_values(&[tariff]).inc();
}

pub fn record_delivery(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    BROADCAST_DELIVERIES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_handler_error(kind: &str) {
    HANDLER_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn set_active_conversations(count: u64) {
    ACTIVE_CONVERSATIONS.set(i64::try_from(count).unwrap_or(i64::MAX));
}
