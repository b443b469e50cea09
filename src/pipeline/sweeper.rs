//! Background eviction of stale reassembly entries.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Pipeline;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Run [`Pipeline::sweep`] every `period` until `shutdown` is cancelled.
///
/// The first sweep happens immediately. Periods below one millisecond are
/// raised to one millisecond.
///
/// # Examples
///
/// ```
/// use std::{sync::Arc, time::Duration};
///
/// use someip_wire::pipeline::{Pipeline, spawn_reassembly_sweeper};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pipeline = Arc::new(Pipeline::default());
/// let shutdown = CancellationToken::new();
/// let handle = spawn_reassembly_sweeper(Arc::clone(&pipeline), Duration::from_secs(1), shutdown.clone());
/// shutdown.cancel();
/// handle.await.expect("sweeper exits cleanly");
/// # }
/// ```
#[must_use = "dropping the handle detaches the sweeper"]
pub fn spawn_reassembly_sweeper(
    pipeline: Arc<Pipeline>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => break,

                _ = ticker.tick() => {
                    let evicted = pipeline.sweep();
                    if !evicted.is_empty() {
                        debug!(count = evicted.len(), "reassembly sweep evicted partial messages");
                    }
                }
            }
        }
        debug!("reassembly sweeper stopped");
    })
}
