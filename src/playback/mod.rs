//! Historical replay: a time-indexed animation over one entity's samples.

mod engine;
mod error;
mod markers;
mod progress;
mod session;
mod state;

pub use engine::{PlaybackEngine, PlaybackSettings, DEFAULT_BASE_INTERVAL};
pub use error::PlaybackError;
pub use markers::thinned_indices;
pub use progress::{format_clock, progress, tick_interval, Progress};
pub use session::{PlaybackFrame, PlaybackSession, StaticMarker, Tick, TrailOnSeek};
pub use state::{PlaybackState, PlaybackStatus};
