use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::SpawnError;
use crate::limits;
use crate::pool::{Slot, SlotPool};
use crate::report::{Report, Sample};

#[derive(Debug, Clone)]
pub struct Config {
    pub capacity: usize,
    pub hold: Duration,
    /// Stop after admitting this many tasks. `None` runs until cancelled.
    pub limit: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: limits::DEFAULT_CAPACITY,
            hold: Duration::from_millis(limits::DEFAULT_HOLD_MS),
            limit: None,
        }
    }
}

pub fn config(capacity: usize, hold_ms: u64, limit: Option<u64>) -> Result<Config, SpawnError> {
    let capacity = limits::validate_capacity(capacity)?;
    Ok(Config {
        capacity,
        hold: Duration::from_millis(hold_ms),
        limit,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    LimitReached,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub capacity: usize,
    pub admitted: u64,
    pub released: u64,
    pub peak_in_flight: usize,
    pub elapsed: Duration,
    pub reason: StopReason,
}

/// Admit tasks into `pool` until `stop` fires or the limit is reached,
/// then wait for every admitted task to release its slot.
pub async fn run(
    config: &Config,
    pool: SlotPool,
    reporter: Arc<dyn Report>,
    stop: CancellationToken,
) -> Result<RunSummary, SpawnError> {
    if config.capacity != pool.capacity() {
        return Err(SpawnError::CapacityMismatch {
            config: config.capacity,
            pool: pool.capacity(),
        });
    }

    let cpus = limits::processor_count();
    info!(
        capacity = pool.capacity(),
        hold_ms = config.hold.as_millis() as u64,
        limit = ?config.limit,
        cpus,
        "spawner started"
    );

    let now = Instant::now();
    let tracker = TaskTracker::new();
    let mut seq: u64 = 0;

    let outcome = loop {
        if config.limit.is_some_and(|limit| seq >= limit) {
            break Ok(StopReason::LimitReached);
        }

        let slot = tokio::select! {
            biased;
            _ = stop.cancelled() => break Ok(StopReason::Cancelled),
            slot = pool.acquire() => match slot {
                Ok(slot) => slot,
                Err(e) => break Err(e),
            },
        };

        seq += 1;

        tracker.spawn(task_body(
            pool.clone(),
            slot,
            Arc::clone(&reporter),
            config.hold,
            seq,
        ));
    };

    match &outcome {
        Ok(reason) => info!(?reason, in_flight = pool.in_flight(), "admission stopped"),
        Err(e) => warn!(error = %e, in_flight = pool.in_flight(), "admission failed"),
    }

    // In-flight tasks always run to release, whatever ended admission.
    pool.close();
    tracker.close();
    tracker.wait().await;
    reporter.finish();

    let reason = outcome?;

    let summary = RunSummary {
        capacity: pool.capacity(),
        admitted: pool.admitted(),
        released: pool.released(),
        peak_in_flight: pool.peak(),
        elapsed: now.elapsed(),
        reason,
    };
    info!(
        admitted = summary.admitted,
        released = summary.released,
        peak = summary.peak_in_flight,
        "spawner finished"
    );
    Ok(summary)
}

/// Body of every admitted task: report, hold, give the slot back.
pub async fn task_body(
    pool: SlotPool,
    slot: Slot,
    reporter: Arc<dyn Report>,
    hold: Duration,
    seq: u64,
) {
    let sample = Sample {
        seq,
        in_flight: pool.in_flight(),
        cpus: limits::processor_count(),
    };
    debug!(seq = sample.seq, in_flight = sample.in_flight, "task admitted");
    reporter.report(sample);

    sleep(hold).await;
    slot.release();
}
