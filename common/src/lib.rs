//! Shared window, GPU and camera plumbing for the simulation viewers

pub mod camera;
pub mod graphics;

pub use camera::*;
pub use graphics::*;
