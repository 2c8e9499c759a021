use crate::cache::ResultCache;
use chrono::{DateTime, Days, Local, TimeZone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Duration;

/// Fires at the next local midnight, invalidates the result cache, then
/// reschedules itself. The delay is recomputed from the wall clock on
/// every iteration, so process sleep/wake cannot cause double fires or
/// drift.
#[derive(Clone)]
pub struct MidnightScheduler {
    cache: Arc<ResultCache>,
    shutdown: Arc<Notify>,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl MidnightScheduler {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self {
            cache,
            shutdown: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self) {
        // Withdraw any stop that predates this start; a loop still
        // draining its shutdown permit keeps running instead of exiting.
        self.stop_requested.store(false, Ordering::Release);
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_loop().await;
        });
    }

    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    async fn run_loop(self) {
        loop {
            let delay = duration_until_next_midnight(Local::now());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let epoch = self.cache.invalidate();
                    tracing::info!(epoch, "day rollover; result cache invalidated");
                }
                _ = self.shutdown.notified() => {
                    if self.stop_requested.load(Ordering::Acquire) {
                        break;
                    }
                    // Stale permit from a stop() that predates this run.
                }
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

/// Wall-clock delay until the next midnight in `now`'s timezone. Falls
/// back to an hourly retry when the local midnight cannot be resolved
/// (DST gaps).
pub fn duration_until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0));
    let Some(tomorrow) = tomorrow else {
        return Duration::from_secs(3_600);
    };
    let Some(next_midnight) = now.timezone().from_local_datetime(&tomorrow).earliest() else {
        return Duration::from_secs(3_600);
    };
    let millis = next_midnight
        .signed_duration_since(now.clone())
        .num_milliseconds();
    if millis <= 0 {
        // Clock moved past the computed boundary; fire on the next tick.
        return Duration::from_millis(0);
    }
    Duration::from_millis(millis as u64)
}
