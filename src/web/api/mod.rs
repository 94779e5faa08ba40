pub mod camera;
pub mod error;
pub mod live;
pub mod replay;
