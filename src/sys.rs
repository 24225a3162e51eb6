pub mod geometry;
pub mod window_system;
