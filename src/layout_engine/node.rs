use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::layout_engine::LayoutKind;
use crate::model::tree::{self, NodeId, NodeMap};
use crate::sys::geometry::{Point, Rect};
use crate::sys::window_system::WindowId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Workspace,
    Monitor,
    Container,
    Window,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceKey {
    pub index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorKey {
    pub monitor: u32,
    pub workspace: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

/// Payload of a node. The variant determines the node's kind.
///
/// `Display` produces the identifiers hosts use as lookup keys (`ws0`,
/// `mo1ws0`, ...); they stay stable for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeValue {
    Root,
    Workspace(WorkspaceKey),
    Monitor(MonitorKey),
    Container(ContainerId),
    Window(WindowId),
}

impl NodeValue {
    pub fn workspace(index: u32) -> Self { NodeValue::Workspace(WorkspaceKey { index }) }

    pub fn monitor(monitor: u32, workspace: u32) -> Self {
        NodeValue::Monitor(MonitorKey { monitor, workspace })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeValue::Root => NodeKind::Root,
            NodeValue::Workspace(_) => NodeKind::Workspace,
            NodeValue::Monitor(_) => NodeKind::Monitor,
            NodeValue::Container(_) => NodeKind::Container,
            NodeValue::Window(_) => NodeKind::Window,
        }
    }

    pub fn window(&self) -> Option<WindowId> {
        match *self {
            NodeValue::Window(wid) => Some(wid),
            _ => None,
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Root => f.write_str("root"),
            NodeValue::Workspace(ws) => write!(f, "ws{}", ws.index),
            NodeValue::Monitor(mo) => write!(f, "mo{}ws{}", mo.monitor, mo.workspace),
            NodeValue::Container(con) => write!(f, "con{}", con.0),
            NodeValue::Window(wid) => write!(f, "win{}", wid.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid node identifier: {0:?}")]
pub struct ParseNodeValueError(pub String);

impl FromStr for NodeValue {
    type Err = ParseNodeValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNodeValueError(s.to_owned());
        if s == "root" {
            return Ok(NodeValue::Root);
        }
        if let Some(rest) = s.strip_prefix("mo") {
            let (monitor, workspace) = rest.split_once("ws").ok_or_else(err)?;
            return Ok(NodeValue::monitor(
                monitor.parse().map_err(|_| err())?,
                workspace.parse().map_err(|_| err())?,
            ));
        }
        if let Some(rest) = s.strip_prefix("ws") {
            return Ok(NodeValue::workspace(rest.parse().map_err(|_| err())?));
        }
        if let Some(rest) = s.strip_prefix("con") {
            return Ok(NodeValue::Container(ContainerId(rest.parse().map_err(|_| err())?)));
        }
        if let Some(rest) = s.strip_prefix("win") {
            return Ok(NodeValue::Window(WindowId(rest.parse().map_err(|_| err())?)));
        }
        Err(err())
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    #[default]
    Tile,
    Float,
    /// Held while the window is being dragged or resized interactively.
    GrabTile,
}

/// State only window nodes carry.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub mode: WindowMode,
    /// Pointer offset relative to the window's rect.
    pub pointer_last_position: Option<Point>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub value: NodeValue,
    pub layout: LayoutKind,
    /// Share of the parent's extent. 0.0 means unset.
    pub percent: f64,
    pub rect: Option<Rect>,
    pub window: Option<WindowState>,
}

impl NodeInfo {
    pub fn new(value: NodeValue, layout: LayoutKind) -> Self {
        NodeInfo {
            value,
            layout,
            percent: 0.0,
            rect: None,
            window: value.window().map(|_| WindowState::default()),
        }
    }

    pub fn kind(&self) -> NodeKind { self.value.kind() }

    pub fn mode(&self) -> Option<WindowMode> { self.window.map(|w| w.mode) }
}

/// Per-node data kept alongside the tree structure.
#[derive(Default, Serialize, Deserialize)]
pub(crate) struct Components {
    pub(crate) info: slotmap::SecondaryMap<NodeId, NodeInfo>,
}

impl tree::Observer for Components {
    fn added_to_forest(&mut self, _map: &NodeMap, node: NodeId) {
        trace!(?node, "created");
    }

    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId) {
        debug_assert!(
            node.parent(map)
                .and_then(|parent| self.info.get(parent))
                .is_none_or(|info| info.kind() != NodeKind::Window),
            "Window nodes are not allowed to have children: {node:?}"
        );
    }

    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
        trace!(?node, parent = ?node.parent(map), "detaching");
    }

    fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
        if let Some(info) = self.info.remove(node) {
            trace!(?node, value = %info.value, "destroyed");
        }
    }
}
