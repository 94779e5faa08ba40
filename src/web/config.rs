use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::camera::CameraState;
use crate::feed::DEFAULT_POLL_INTERVAL;
use crate::icons::DEFAULT_ICON_SIZE;
use crate::model::LatLng;
use crate::playback::{PlaybackSettings, TrailOnSeek, DEFAULT_BASE_INTERVAL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub icons: IconsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout", deserialize_with = "human_duration")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_poll_interval", deserialize_with = "human_duration")]
    pub poll_interval: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_base_interval", deserialize_with = "human_duration")]
    pub base_interval: Duration,
    #[serde(default)]
    pub trail_on_seek: TrailOnSeek,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval: DEFAULT_BASE_INTERVAL,
            trail_on_seek: TrailOnSeek::default(),
        }
    }
}

fn default_base_interval() -> Duration {
    DEFAULT_BASE_INTERVAL
}

impl PlaybackConfig {
    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            base_interval: self.base_interval,
            trail_on_seek: self.trail_on_seek,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// `"lat,lng"`
    #[serde(default = "default_center")]
    pub center: String,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
        }
    }
}

fn default_center() -> String {
    "20.5937,78.9629".to_string()
}

fn default_zoom() -> f64 {
    5.0
}

impl CameraConfig {
    pub fn initial_state(&self) -> Option<CameraState> {
        let parts: Vec<_> = self.center.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lng: f64 = parts[1].parse().ok()?;
        Some(CameraState {
            center: LatLng::new(lat, lng),
            zoom: self.zoom,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IconsConfig {
    #[serde(default = "default_icon_size")]
    pub size: u32,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            size: default_icon_size(),
        }
    }
}

fn default_icon_size() -> u32 {
    DEFAULT_ICON_SIZE
}

fn human_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(d)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if self.live.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("live.poll_interval must be positive".into()));
        }
        if self.playback.base_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "playback.base_interval must be positive".into(),
            ));
        }
        if self.icons.size == 0 {
            return Err(ConfigError::Invalid("icons.size must be positive".into()));
        }
        if self.camera.initial_state().is_none() {
            return Err(ConfigError::Invalid(format!(
                "camera.center '{}' is not 'lat,lng'",
                self.camera.center
            )));
        }
        Ok(())
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.initial_state().unwrap_or(CameraState {
            center: LatLng::new(0.0, 0.0),
            zoom: default_zoom(),
        })
    }
}
