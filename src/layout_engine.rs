pub mod compute;
pub mod engine;
mod error;
pub(crate) mod graph;
mod layout_tree;
mod mutation;
mod navigation;
pub mod node;
pub mod render;
mod workspaces;

pub use engine::{EventResponse, HostEvent, LayoutCommand, LayoutEngine};
pub use error::TreeError;
pub use graph::{Direction, LayoutKind, Orientation, Position};
pub use layout_tree::{LayoutTree, NodeRef};
pub use mutation::{MAX_SHARE, MIN_SHARE};
pub use node::{NodeInfo, NodeKind, NodeValue, WindowMode, WindowState};
pub use render::RenderOutcome;

#[cfg(test)]
mod tests;
