use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::PlaybackError;
use super::markers::thinned_indices;
use super::progress::{checked_tick_interval, progress, Progress};
use super::state::{PlaybackState, PlaybackStatus};
use crate::model::{format_captured_at, LatLng, LocationSample};

/// What a seek does to the already-drawn trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrailOnSeek {
    /// Redraw the trail up to and including the seek target.
    #[default]
    Rebuild,
    /// Leave the trail as it was; it may disagree with the marker until the
    /// next play from idle.
    Preserve,
}

/// Result of one replay tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// New camera target when the index moved.
    pub moved_to: Option<LatLng>,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticMarker {
    pub index: usize,
    pub position: LatLng,
    pub captured_at: String,
}

/// Everything the map needs to draw the replay at one instant.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackFrame {
    pub session_id: Uuid,
    pub status: PlaybackStatus,
    pub current_index: Option<usize>,
    pub current: Option<LocationSample>,
    pub trail: Vec<LatLng>,
    /// Thinned marker set; empty while playing.
    pub markers: Vec<StaticMarker>,
    pub speed: f64,
    pub total_samples: usize,
    pub progress: Progress,
}

/// State of one replay: the loaded samples, the position within them and
/// the trail drawn so far. Holds no timers.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: Uuid,
    samples: Vec<LocationSample>,
    state: PlaybackState,
    trail: Vec<LatLng>,
    speed: f64,
    /// Identifies the ticker allowed to advance this session.
    pub(super) run: u64,
}

impl PlaybackSession {
    pub fn new(samples: Vec<LocationSample>) -> Self {
        Self {
            id: Uuid::new_v4(),
            samples,
            state: PlaybackState::Idle,
            trail: Vec::new(),
            speed: 1.0,
            run: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn samples(&self) -> &[LocationSample] {
        &self.samples
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index()
    }

    pub fn trail(&self) -> &[LatLng] {
        &self.trail
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn first_position(&self) -> Option<LatLng> {
        self.samples.first().map(LocationSample::position)
    }

    /// Starts from the beginning when idle, resumes when paused. Returns the
    /// camera target when starting over.
    pub fn play(&mut self) -> Result<Option<LatLng>, PlaybackError> {
        if self.samples.is_empty() {
            return Err(PlaybackError::NoSamples);
        }
        match self.state {
            PlaybackState::Idle => {
                self.trail.clear();
                self.state = PlaybackState::Playing { index: 0 };
                Ok(self.first_position())
            }
            PlaybackState::Paused { index } => {
                self.state = PlaybackState::Playing { index };
                Ok(None)
            }
            other => Err(PlaybackError::InvalidTransition {
                action: "play",
                status: other.status(),
            }),
        }
    }

    /// Advances one sample. Reaching the last sample completes the replay.
    pub fn tick(&mut self) -> Tick {
        let PlaybackState::Playing { index } = self.state else {
            return Tick {
                moved_to: None,
                finished: true,
            };
        };
        let last = self.samples.len().saturating_sub(1);

        if index >= last {
            self.state = PlaybackState::Completed { index };
            return Tick {
                moved_to: None,
                finished: true,
            };
        }

        let next = index + 1;
        let position = self.samples[next].position();
        if next == 1 {
            self.trail = vec![self.samples[0].position(), position];
        } else {
            self.trail.push(position);
        }

        let finished = next == last;
        self.state = if finished {
            PlaybackState::Completed { index: next }
        } else {
            PlaybackState::Playing { index: next }
        };

        Tick {
            moved_to: Some(position),
            finished,
        }
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::Playing { index } => {
                self.state = PlaybackState::Paused { index };
                Ok(())
            }
            other => Err(PlaybackError::InvalidTransition {
                action: "pause",
                status: other.status(),
            }),
        }
    }

    /// Jumps to `index` and pauses there. Returns the camera target.
    pub fn seek(&mut self, index: usize, trail_policy: TrailOnSeek) -> Result<LatLng, PlaybackError> {
        let len = self.samples.len();
        if len == 0 {
            return Err(PlaybackError::NoSamples);
        }
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        self.state = PlaybackState::Paused { index };
        if trail_policy == TrailOnSeek::Rebuild {
            self.trail = if index == 0 {
                Vec::new()
            } else {
                self.samples[..=index]
                    .iter()
                    .map(LocationSample::position)
                    .collect()
            };
        }
        Ok(self.samples[index].position())
    }

    /// Back to idle with an empty trail. Returns the camera target.
    pub fn reset(&mut self) -> Result<LatLng, PlaybackError> {
        let first = self.first_position().ok_or(PlaybackError::NoSamples)?;
        self.state = PlaybackState::Idle;
        self.trail.clear();
        Ok(first)
    }

    /// Accepts positive finite multipliers whose tick period at
    /// `base_interval` is representable.
    pub fn set_speed(&mut self, multiplier: f64, base_interval: Duration) -> Result<(), PlaybackError> {
        if checked_tick_interval(base_interval, multiplier).is_none() {
            return Err(PlaybackError::InvalidSpeed(multiplier));
        }
        self.speed = multiplier;
        Ok(())
    }

    /// Marker indices to draw besides the current one.
    pub fn static_marker_indices(&self) -> Vec<usize> {
        match self.state {
            PlaybackState::Playing { .. } => Vec::new(),
            _ => thinned_indices(&self.samples),
        }
    }

    pub fn frame(&self, base_interval: Duration) -> PlaybackFrame {
        let current_index = self.current_index();
        let markers = self
            .static_marker_indices()
            .into_iter()
            .map(|index| {
                let sample = &self.samples[index];
                StaticMarker {
                    index,
                    position: sample.position(),
                    captured_at: format_captured_at(&sample.captured_at),
                }
            })
            .collect();

        PlaybackFrame {
            session_id: self.id,
            status: self.status(),
            current_index,
            current: current_index.map(|i| self.samples[i].clone()),
            trail: self.trail.clone(),
            markers,
            speed: self.speed,
            total_samples: self.samples.len(),
            progress: progress(self.samples.len(), current_index, base_interval, self.speed),
        }
    }
}
