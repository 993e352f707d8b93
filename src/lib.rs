pub mod backend_config;
pub mod frame_rate;
pub mod geometry_utils;
pub mod systems;
pub mod tracking;

pub type Point2D = (f32, f32);
