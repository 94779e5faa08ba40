use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

const HOUR: Duration = Duration::from_secs(3600);

/// Wall-clock time of a full replay versus the part already played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub played_ms: u64,
    pub total_ms: u64,
    pub played: String,
    pub total: String,
}

/// Period between replay ticks at the given speed, or `None` when the
/// speed is not positive or the period does not fit a `Duration`.
pub fn checked_tick_interval(base: Duration, speed: f64) -> Option<Duration> {
    if !speed.is_finite() || speed <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() / speed).ok()
}

/// Period between replay ticks at the given speed. Saturates at
/// `Duration::MAX` instead of failing.
pub fn tick_interval(base: Duration, speed: f64) -> Duration {
    checked_tick_interval(base, speed).unwrap_or(Duration::MAX)
}

pub fn progress(total_samples: usize, current_index: Option<usize>, base: Duration, speed: f64) -> Progress {
    let step = tick_interval(base, speed);
    let total = step.saturating_mul(total_samples as u32);
    let played = current_index
        .map(|i| step.saturating_mul((i + 1) as u32))
        .unwrap_or_default();
    let with_hours = total >= HOUR;

    Progress {
        played_ms: u64::try_from(played.as_millis()).unwrap_or(u64::MAX),
        total_ms: u64::try_from(total.as_millis()).unwrap_or(u64::MAX),
        played: format_clock(played, with_hours),
        total: format_clock(total, with_hours),
    }
}

/// `mm:ss`, or `hh:mm:ss` when `with_hours` is set.
pub fn format_clock(elapsed: Duration, with_hours: bool) -> String {
    let secs = elapsed.as_secs();
    if with_hours {
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
