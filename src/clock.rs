//! Clock source shared by timeout bookkeeping.

use std::time::Instant;

/// Read the current instant from the tokio clock.
///
/// Outside a runtime this is the system monotonic clock; inside a runtime with
/// paused time it follows the paused clock, which keeps timeout sweeps
/// deterministic under test.
pub(crate) fn now() -> Instant { tokio::time::Instant::now().into_std() }
