//! Live tracking and historical replay engine behind the field-staff map.

pub mod backend;
pub mod camera;
pub mod feed;
pub mod history;
pub mod icons;
pub mod model;
pub mod playback;
pub mod scheduler;
pub mod web;
