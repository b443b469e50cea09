//! Metric helpers for `someip-wire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking wire units handled by the pipeline.
pub const UNITS_PROCESSED: &str = "someip_units_processed_total";
/// Name of the counter tracking rejected headers and corrupt stream data.
pub const FRAMING_ERRORS: &str = "someip_framing_errors_total";
/// Name of the counter tracking TP messages reassembled in full.
pub const MESSAGES_REASSEMBLED: &str = "someip_messages_reassembled_total";
/// Name of the counter tracking partial messages discarded on timeout.
pub const REASSEMBLY_EVICTIONS: &str = "someip_reassembly_evictions_total";
/// Name of the counter tracking payloads that failed E2E verification.
pub const E2E_FAILURES: &str = "someip_e2e_failures_total";

/// Direction of unit processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Units received from a peer.
    Inbound,
    /// Units prepared for sending.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only read by counters"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record `count` wire units for the given direction.
#[cfg(feature = "metrics")]
pub fn inc_units(direction: Direction, count: u64) {
    counter!(UNITS_PROCESSED, "direction" => direction.as_str()).increment(count);
}

/// Record a framing error.
#[cfg(feature = "metrics")]
pub fn inc_framing_errors() { counter!(FRAMING_ERRORS).increment(1); }

/// Record a completed reassembly.
#[cfg(feature = "metrics")]
pub fn inc_reassembled() { counter!(MESSAGES_REASSEMBLED).increment(1); }

/// Record a reassembly entry discarded on timeout.
#[cfg(feature = "metrics")]
pub fn inc_evicted() { counter!(REASSEMBLY_EVICTIONS).increment(1); }

/// Record a payload whose E2E check failed.
#[cfg(feature = "metrics")]
pub fn inc_e2e_failures() { counter!(E2E_FAILURES).increment(1); }

#[cfg(not(feature = "metrics"))]
pub fn inc_units(_direction: Direction, _count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_framing_errors() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_reassembled() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_evicted() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_e2e_failures() {}
