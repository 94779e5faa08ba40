use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{clamp_interval, CancelHandle, Scheduler, TickCallback};

/// Deterministic scheduler driven by [`VirtualScheduler::advance`].
///
/// Timers fire in due-time order; timers due at the same instant fire in
/// the order they were scheduled. Callbacks run without the internal lock
/// held, so a callback may schedule or cancel other timers.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    state: Arc<Mutex<VirtualState>>,
}

#[derive(Default)]
struct VirtualState {
    now: Duration,
    next_seq: u64,
    timers: Vec<VirtualTimer>,
}

struct VirtualTimer {
    seq: u64,
    interval: Duration,
    due: Duration,
    cancelled: Arc<AtomicBool>,
    callback: Option<TickCallback>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    pub fn active_timers(&self) -> usize {
        self.lock()
            .timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Moves the clock forward, firing every timer that falls due on the way.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;

        loop {
            let (seq, mut callback) = {
                let mut state = self.lock();
                state.timers.retain(|t| !t.cancelled.load(Ordering::Acquire));

                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target && t.callback.is_some())
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                let Some(i) = next else {
                    state.now = target;
                    return;
                };

                let timer = &mut state.timers[i];
                let due = timer.due;
                timer.due += timer.interval;
                let seq = timer.seq;
                let callback = timer.callback.take();
                state.now = due;
                match callback {
                    Some(cb) => (seq, cb),
                    None => continue,
                }
            };

            let flow = callback();

            let mut state = self.lock();
            if let Some(timer) = state.timers.iter_mut().find(|t| t.seq == seq) {
                match flow {
                    ControlFlow::Continue(()) => timer.callback = Some(callback),
                    ControlFlow::Break(()) => timer.cancelled.store(true, Ordering::Release),
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> CancelHandle {
        let interval = clamp_interval(interval);
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.now + interval;
        state.timers.push(VirtualTimer {
            seq,
            interval,
            due,
            cancelled: cancelled.clone(),
            callback: Some(callback),
        });

        CancelHandle::new(cancelled, None)
    }
}
