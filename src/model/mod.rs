mod entity;
mod parsing;
mod sample;

pub use entity::TrackedEntity;
pub use parsing::{format_captured_at, parse_captured_at, CAPTURED_AT_FORMAT};
pub use sample::{LatLng, LocationSample};
