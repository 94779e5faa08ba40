use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{clamp_interval, CancelHandle, Scheduler, TickCallback};

/// Timers spawned as tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, mut callback: TickCallback) -> CancelHandle {
        let period = clamp_interval(interval);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let task = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                if let ControlFlow::Break(()) = callback() {
                    flag.store(true, Ordering::Release);
                    break;
                }
            }
        });

        CancelHandle::new(cancelled, Some(task.abort_handle()))
    }
}
