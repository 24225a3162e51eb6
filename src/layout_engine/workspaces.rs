use tracing::{debug, info, instrument, warn};

use crate::layout_engine::node::NodeInfo;
use crate::layout_engine::{LayoutKind, LayoutTree, NodeKind, NodeValue, WindowMode};
use crate::model::tree::NodeId;
use crate::sys::window_system::{WindowId, WindowSystem};

impl LayoutTree {
    /// Ensures workspace `index` exists with one node per monitor.
    pub fn add_workspace(&mut self, index: u32, monitor_count: u32) -> Option<NodeId> {
        let value = NodeValue::workspace(index);
        let workspace = match self.find_node(&value) {
            Some(existing) => existing,
            None => self.create_node(&NodeValue::Root, value)?,
        };
        for monitor in 0..monitor_count {
            let monitor_value = NodeValue::monitor(monitor, index);
            if self.find_by_value(workspace, &monitor_value).is_none() {
                self.create_node(&value, monitor_value);
            }
        }
        Some(workspace)
    }

    /// Drops workspace `index` along with everything tiled on it.
    pub fn remove_workspace(&mut self, index: u32) -> bool {
        let Some(workspace) = self.find_node(&NodeValue::workspace(index)) else {
            return false;
        };
        let root = self.root();
        self.remove_child(root, workspace).is_ok()
    }

    /// Rebuilds the workspace and monitor levels after the host's monitor or
    /// workspace set changed, then re-tracks every window.
    ///
    /// Window modes survive; container structure does not.
    #[instrument(level = "info", skip(self, host))]
    pub fn monitors_changed<H: WindowSystem + ?Sized>(
        &mut self,
        workspace_count: u32,
        monitor_count: u32,
        host: &H,
    ) {
        let windows: Vec<(WindowId, WindowMode)> = self
            .all_window_nodes()
            .into_iter()
            .filter_map(|n| Some((self.window(n)?, self.mode(n)?)))
            .collect();
        for workspace in self.all_workspace_nodes() {
            let root = self.root();
            _ = self.remove_child(root, workspace);
        }
        self.attach_point = None;
        for index in 0..workspace_count {
            self.add_workspace(index, monitor_count);
        }
        let mut lost = 0;
        for (wid, mode) in windows {
            match self.track_window(wid, host) {
                Some(node) => {
                    if mode != WindowMode::Tile {
                        self.set_window_mode(node, mode);
                    }
                }
                None => lost += 1,
            }
        }
        info!(workspace_count, monitor_count, lost, "rebuilt workspaces");
    }

    /// Adds `window` to the tree, under the attach point when that is on the
    /// window's monitor, otherwise at the end of the monitor node.
    ///
    /// Returns the existing node for already tracked windows, and `None`
    /// when the window's monitor node does not exist.
    #[instrument(level = "debug", skip(self, host))]
    pub fn track_window<H: WindowSystem + ?Sized>(&mut self, window: WindowId, host: &H) -> Option<NodeId> {
        if let Some(existing) = self.find_node_by_handle(window) {
            return Some(existing);
        }
        let (Some(monitor), Some(workspace)) =
            (host.monitor_index_of(window), host.workspace_index_of(window))
        else {
            debug!("window has no single monitor or workspace");
            return None;
        };
        let Some(monitor_node) = self.find_node(&NodeValue::monitor(monitor, workspace)) else {
            warn!(monitor, workspace, "no monitor node for window");
            return None;
        };
        let parent = self
            .attach_point()
            .filter(|&a| a == monitor_node || monitor_node.is_ancestor_of(a, self.map()))
            .unwrap_or(monitor_node);

        let mut info = NodeInfo::new(NodeValue::Window(window), LayoutKind::HSplit);
        if host.is_floating_policy(window) {
            if let Some(state) = info.window.as_mut() {
                state.mode = WindowMode::Float;
            }
        }
        let node = self.spawn(info);
        match self.append_child(parent, node) {
            Ok(node) => {
                self.reset_sibling_percent(parent);
                Some(node)
            }
            Err(err) => {
                warn!(%err, "could not attach window");
                node.detach(&mut self.tree).remove();
                None
            }
        }
    }

    pub fn untrack_window(&mut self, window: WindowId) -> bool {
        let Some(node) = self.find_node_by_handle(window) else { return false };
        debug_assert_eq!(Some(NodeKind::Window), self.kind(node));
        self.remove_node(node).is_ok()
    }
}
