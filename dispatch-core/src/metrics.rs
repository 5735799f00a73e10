//! Prometheus metrics for ledger submissions

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total transactions submitted, by operation and outcome
    pub static ref TRANSACTIONS_TOTAL: CounterVec = register_counter_vec!(
        "dispatch_transactions_total",
        "Total ledger transactions submitted",
        &["operation", "outcome"]
    )
    .unwrap();

    /// Submission latency
    pub static ref TRANSACTION_DURATION: HistogramVec = register_histogram_vec!(
        "dispatch_transaction_duration_seconds",
        "Ledger transaction round-trip in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();
}
