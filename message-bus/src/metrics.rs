//! Prometheus metrics for message bus

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge,
};

lazy_static! {
    /// Total messages received, by server and disposition
    pub static ref MESSAGE_RECEIVE_TOTAL: CounterVec = register_counter_vec!(
        "message_bus_receive_total",
        "Total messages received",
        &["server", "status"]
    )
    .unwrap();

    /// Message processing duration
    pub static ref MESSAGE_PROCESS_DURATION: HistogramVec = register_histogram_vec!(
        "message_bus_process_duration_seconds",
        "Message processing duration in seconds",
        &["server"]
    )
    .unwrap();

    /// Subscription lifecycle transitions
    pub static ref SUBSCRIPTION_STATUS: CounterVec = register_counter_vec!(
        "message_bus_subscription_status",
        "Subscription state transitions (subscribed/failed/disconnected)",
        &["server", "status"]
    )
    .unwrap();

    /// Subscriptions currently consuming
    pub static ref ACTIVE_SUBSCRIPTIONS: IntGauge = register_int_gauge!(
        "message_bus_active_subscriptions",
        "Subscriptions currently consuming"
    )
    .unwrap();
}
