//! Tree tiling layout engine.
//!
//! Windows are organized into a hierarchy of workspaces, monitors and
//! containers. The engine computes a rectangle for every tiled window
//! from that hierarchy and supports directional navigation, swapping,
//! splitting and moving within it. Talking to the real display system is
//! left to the host through [`sys::window_system::WindowSystem`].

pub mod actor;
pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
