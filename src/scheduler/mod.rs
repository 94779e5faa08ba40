//! Repeating timers behind a trait so the feed poller and the replay ticker
//! can run on tokio in production and on a virtual clock in tests.

mod tokio_timer;
mod virtual_clock;

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use tokio_timer::TokioScheduler;
pub use virtual_clock::VirtualScheduler;

/// Smallest period a timer will run at. A zero interval would spin.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Invoked once per period. Returning `Break` ends the timer.
pub type TickCallback = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Runs `callback` every `interval`, first call one interval from now.
    fn schedule_repeating(&self, interval: Duration, callback: TickCallback) -> CancelHandle;
}

/// Owner of a running timer. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<tokio::task::AbortHandle>,
}

impl CancelHandle {
    pub(crate) fn new(cancelled: Arc<AtomicBool>, abort: Option<tokio::task::AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// True once cancelled or once the callback asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_INTERVAL)
}
