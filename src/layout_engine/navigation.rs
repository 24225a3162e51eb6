use tracing::{debug, instrument, trace};

use crate::layout_engine::{Direction, LayoutTree, NodeKind, NodeValue};
use crate::model::tree::NodeId;
use crate::sys::window_system::WindowSystem;

impl LayoutTree {
    /// The node one step from `node` in `direction`.
    ///
    /// Climbs from `node` until an ancestor lays its children out along the
    /// direction's axis and has a sibling on that side. Running off the edge
    /// of a monitor continues on the neighboring monitor, same workspace.
    #[instrument(level = "trace", skip(self, host))]
    pub fn next<H: WindowSystem + ?Sized>(
        &self,
        node: NodeId,
        direction: Direction,
        host: &H,
    ) -> Option<NodeId> {
        match self.kind(node)? {
            NodeKind::Root | NodeKind::Workspace | NodeKind::Monitor => return None,
            NodeKind::Container | NodeKind::Window => {}
        }
        let orientation = direction.orientation();
        let mut cur = node;
        loop {
            let parent = self.parent(cur)?;
            let count = parent.child_count(self.map());
            if self.layout(parent).orientation() == Some(orientation) && count > 1 {
                let index = cur.index_in_parent(self.map())?;
                if let Some(next) = direction.step(index, count) {
                    return parent.child_at(self.map(), next);
                }
            }
            cur = parent;
            if self.kind(cur) == Some(NodeKind::Monitor) {
                return self.neighbor_monitor(node, cur, direction, host);
            }
        }
    }

    fn neighbor_monitor<H: WindowSystem + ?Sized>(
        &self,
        origin: NodeId,
        monitor: NodeId,
        direction: Direction,
        host: &H,
    ) -> Option<NodeId> {
        let NodeValue::Monitor(key) = self.value(monitor)? else { return None };
        let workspace = self
            .window(origin)
            .and_then(|w| host.workspace_index_of(w))
            .unwrap_or(key.workspace);
        let Some(neighbor) = host.monitor_neighbor(key.monitor, direction) else {
            trace!(monitor = key.monitor, ?direction, "no monitor in that direction");
            return None;
        };
        let target = self.find_node(&NodeValue::monitor(neighbor, workspace));
        debug!(from = key.monitor, to = neighbor, workspace, found = target.is_some(), "crossing monitors");
        target
    }

    /// Like [`Self::next`], but passes over minimized windows.
    pub fn next_visible<H: WindowSystem + ?Sized>(
        &self,
        node: NodeId,
        direction: Direction,
        host: &H,
    ) -> Option<NodeId> {
        let mut cur = node;
        loop {
            let next = self.next(cur, direction, host)?;
            match self.window(next) {
                Some(wid) if host.is_minimized(wid) => cur = next,
                _ => return Some(next),
            }
        }
    }

    /// Focuses the window one step from `node` in `direction`, descending
    /// into containers and monitors as needed. The pointer follows when
    /// configured to.
    #[instrument(level = "debug", skip(self, host))]
    pub fn focus<H: WindowSystem + ?Sized>(
        &self,
        node: NodeId,
        direction: Direction,
        host: &H,
    ) -> Option<NodeId> {
        let next = self.next_visible(node, direction, host)?;
        let target = self.first_tiled_window(next, host).or_else(|| {
            // Floating windows are only reachable as direct neighbors.
            self.window(next).is_some().then_some(next)
        })?;
        let wid = self.window(target)?;
        host.raise(wid);
        host.focus(wid, host.current_time());
        if self.settings.focus.move_pointer {
            // Floating windows are never laid out, so they may have no rect yet.
            let point = self
                .pointer_target(target)
                .unwrap_or_else(|| host.frame_rect(wid).center());
            host.move_pointer_to(wid, point);
        }
        Some(target)
    }

    /// First tiled window reached by descending from `node`. Stacked
    /// containers are searched from their last child, the one drawn on top.
    pub fn first_tiled_window<H: WindowSystem + ?Sized>(&self, node: NodeId, host: &H) -> Option<NodeId> {
        match self.kind(node)? {
            NodeKind::Window => self.is_tiled(node, host).then_some(node),
            NodeKind::Root | NodeKind::Workspace => None,
            NodeKind::Container | NodeKind::Monitor => {
                let children: Vec<_> = self.children(node).collect();
                let search = |c: &NodeId| self.first_tiled_window(*c, host);
                if self.layout(node).is_stacked() {
                    children.iter().rev().find_map(search)
                } else {
                    children.iter().find_map(search)
                }
            }
        }
    }

    /// Whether both nodes sit on the same monitor node and, for windows, the
    /// host agrees.
    pub fn same_monitor<H: WindowSystem + ?Sized>(&self, a: NodeId, b: NodeId, host: &H) -> bool {
        let (Some(ma), Some(mb)) = (self.monitor_of(a), self.monitor_of(b)) else {
            return false;
        };
        if ma != mb {
            return false;
        }
        match (self.window(a), self.window(b)) {
            (Some(wa), Some(wb)) => host.same_monitor(wa, wb),
            _ => true,
        }
    }
}
