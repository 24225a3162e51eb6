use tracing::{debug, instrument, warn};

use crate::layout_engine::{
    Direction, LayoutKind, LayoutTree, NodeKind, Orientation, Position, TreeError, WindowMode,
};
use crate::model::tree::NodeId;
use crate::sys::geometry::Point;
use crate::sys::window_system::WindowSystem;

/// Smallest share a resize may leave a node with.
pub const MIN_SHARE: f64 = 0.05;
pub const MAX_SHARE: f64 = 0.95;

impl LayoutTree {
    /// Splits `node` along `orientation`.
    ///
    /// If `node` is alone in a split parent the parent's layout is switched
    /// instead, unless `force` is set. Otherwise `node` is wrapped in a new
    /// container, which takes over its position, rect and share. Either way
    /// the resulting container becomes the attach point and is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn split(&mut self, node: NodeId, orientation: Orientation, force: bool) -> Option<NodeId> {
        match self.kind(node)? {
            NodeKind::Window if self.mode(node) == Some(WindowMode::Float) => {
                debug!("not splitting a floating window");
                return None;
            }
            NodeKind::Window | NodeKind::Container => {}
            kind => {
                debug!(?kind, "not splittable");
                return None;
            }
        }
        let parent = self.parent(node)?;
        let layout = LayoutKind::from_orientation(orientation);
        if !force && parent.child_count(self.map()) == 1 && self.layout(parent).is_split() {
            if let Some(info) = self.info_mut(parent) {
                info.layout = layout;
            }
            self.set_attach_point(Some(parent));
            return Some(parent);
        }

        let index = node.index_in_parent(self.map())?;
        let rect = self.rect(node);
        let percent = self.percent(node);
        let container = self.spawn_container(layout);
        if let Some(info) = self.info_mut(container) {
            info.rect = rect;
            info.percent = percent;
        }
        if let Err(err) = self
            .insert_at(parent, container, index)
            .and_then(|_| self.append_child(container, node))
        {
            warn!(%err, "split failed");
            container.detach(&mut self.tree).remove();
            return None;
        }
        self.set_percent(node, 0.0);
        self.set_attach_point(Some(container));
        Some(container)
    }

    fn swappable(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Window) && self.mode(node) != Some(WindowMode::Float)
    }

    /// Exchanges the tree positions of two windows along with their shares
    /// and modes. With `focus`, `a` is raised and focused afterwards.
    #[instrument(level = "debug", skip(self, host))]
    pub fn swap_pairs<H: WindowSystem + ?Sized>(
        &mut self,
        a: NodeId,
        b: NodeId,
        focus: bool,
        host: &H,
    ) -> bool {
        if a == b || !self.swappable(a) || !self.swappable(b) {
            return false;
        }
        if !self.tree.map.exchange(a, b) {
            return false;
        }
        let (Some(ia), Some(ib)) = (self.info(a).cloned(), self.info(b).cloned()) else {
            return false;
        };
        if let Some(info) = self.info_mut(a) {
            info.percent = ib.percent;
            info.window = info.window.map(|mut w| {
                w.mode = ib.mode().unwrap_or(w.mode);
                w
            });
        }
        if let Some(info) = self.info_mut(b) {
            info.percent = ia.percent;
            info.window = info.window.map(|mut w| {
                w.mode = ia.mode().unwrap_or(w.mode);
                w
            });
        }
        if focus {
            if let Some(wid) = self.window(a) {
                host.raise(wid);
                host.focus(wid, host.current_time());
            }
        }
        true
    }

    /// Swaps `node` with the first tiled window in `direction`, staying on
    /// the same monitor.
    #[instrument(level = "debug", skip(self, host))]
    pub fn swap<H: WindowSystem + ?Sized>(&mut self, node: NodeId, direction: Direction, host: &H) -> bool {
        let Some(next) = self.next(node, direction, host) else { return false };
        let Some(target) = self.first_tiled_window(next, host) else {
            debug!(?next, "nothing to swap with");
            return false;
        };
        if !self.same_monitor(node, target, host) {
            debug!(?target, "refusing to swap across monitors");
            return false;
        }
        self.swap_pairs(node, target, true, host)
    }

    /// Moves `node` one step in `direction`, entering containers and
    /// monitors on the way.
    #[instrument(level = "debug", skip(self, host))]
    pub fn move_node<H: WindowSystem + ?Sized>(
        &mut self,
        node: NodeId,
        direction: Direction,
        host: &H,
    ) -> bool {
        if !matches!(self.kind(node), Some(NodeKind::Window | NodeKind::Container)) {
            return false;
        }
        let Some(target) = self.next(node, direction, host) else { return false };
        let Some(old_parent) = self.parent(node) else { return false };
        let target_parent = self.parent(target);

        let result = match self.kind(target) {
            Some(NodeKind::Window) if target_parent == Some(old_parent) => {
                if self.swappable(node) && self.swappable(target) {
                    return self.swap_pairs(node, target, false, host);
                }
                self.tree.map.exchange(node, target);
                Ok(node)
            }
            Some(NodeKind::Window) => match direction.position() {
                Position::After => target_parent
                    .ok_or(TreeError::UnknownNode(target))
                    .and_then(|parent| self.insert_before(parent, node, Some(target))),
                Position::Before => self.insert_after(target, node),
            },
            Some(NodeKind::Container) => self.insert_at(target, node, 0),
            Some(NodeKind::Monitor) => match direction.position() {
                Position::After => self.insert_at(target, node, 0),
                Position::Before => self.append_child(target, node),
            },
            _ => return false,
        };
        if let Err(err) = result {
            warn!(%err, "move failed");
            return false;
        }
        self.reset_sibling_percent(old_parent);
        if let Some(new_parent) = self.parent(node) {
            self.reset_sibling_percent(new_parent);
        }
        true
    }

    /// Removes `node` from the tree.
    ///
    /// A container left with only `node` is removed with it. Siblings lose
    /// their stored shares, as do emptied containers and their siblings.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), TreeError> {
        if !self.contains_node(node) {
            return Err(TreeError::UnknownNode(node));
        }
        let Some(parent) = self.parent(node) else {
            return Err(TreeError::IllegalKind {
                kind: NodeKind::Root,
                operation: "be removed",
            });
        };
        if parent.child_count(self.map()) == 1 && self.kind(parent) == Some(NodeKind::Container) {
            return self.remove_node(parent);
        }
        self.remove_child(parent, node)?;
        self.reset_sibling_percent(parent);
        let emptied: Vec<_> = parent
            .ancestors(self.map())
            .take_while(|&n| self.kind(n) == Some(NodeKind::Container))
            .filter(|&n| !self.is_tileable(n))
            .collect();
        for container in emptied {
            if let Some(grandparent) = self.parent(container) {
                self.reset_sibling_percent(grandparent);
            }
        }
        Ok(())
    }

    /// Grows `node` by `amount` (a fraction of its parent) toward
    /// `direction`, taking the space from the neighbor on that side.
    /// Negative amounts shrink.
    #[instrument(level = "debug", skip(self, host))]
    pub fn resize<H: WindowSystem + ?Sized>(
        &mut self,
        node: NodeId,
        direction: Direction,
        amount: f64,
        host: &H,
    ) -> bool {
        let orientation = direction.orientation();
        let resizable = |&n: &NodeId| -> Option<(Vec<NodeId>, usize, usize)> {
            let parent = self.parent(n)?;
            let layout = self.layout(parent);
            if layout.is_group() || layout.orientation() != Some(orientation) {
                return None;
            }
            let siblings: Vec<_> = self.children(parent).collect();
            let tiled = self.tiled_children(&siblings, host);
            let pos = tiled.iter().position(|&s| s == n)?;
            let other = direction.step(pos, tiled.len())?;
            Some((tiled, pos, other))
        };
        let Some((tiled, pos, other)) = node
            .ancestors(self.map())
            .take_while(|&n| matches!(self.kind(n), Some(NodeKind::Window | NodeKind::Container)))
            .find_map(|n| resizable(&n))
        else {
            return false;
        };

        let even = 1.0 / tiled.len() as f64;
        let mut shares: Vec<f64> =
            tiled.iter().map(|&n| Some(self.percent(n)).filter(|&p| p > 0.0).unwrap_or(even)).collect();
        take_share(&mut shares, pos, other, amount);
        for (&n, share) in tiled.iter().zip(shares) {
            self.set_percent(n, share);
        }
        true
    }

    /// Sets the layout of the container holding `node` (or of `node`, if it
    /// is not a window).
    pub fn set_layout(&mut self, node: NodeId, layout: LayoutKind) -> bool {
        let Some(target) = self.layout_target(node) else { return false };
        if layout == LayoutKind::Root {
            return false;
        }
        if let Some(info) = self.info_mut(target) {
            info.layout = layout;
        }
        true
    }

    /// Switches to `layout`, or back to a horizontal split if already there.
    pub fn toggle_layout(&mut self, node: NodeId, layout: LayoutKind) -> bool {
        let Some(target) = self.layout_target(node) else { return false };
        let next = if self.layout(target) == layout { LayoutKind::HSplit } else { layout };
        self.set_layout(target, next)
    }

    /// Flips a split container between horizontal and vertical.
    pub fn toggle_orientation(&mut self, node: NodeId) -> bool {
        let Some(target) = self.layout_target(node) else { return false };
        let current = self.layout(target);
        if !current.is_split() {
            return false;
        }
        let Some(orientation) = current.orientation() else { return false };
        self.set_layout(target, LayoutKind::from_orientation(orientation.toggle()))
    }

    fn layout_target(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(node)? {
            NodeKind::Window => self.parent(node),
            NodeKind::Container | NodeKind::Monitor => Some(node),
            NodeKind::Root | NodeKind::Workspace => None,
        }
    }

    pub fn set_window_mode(&mut self, node: NodeId, mode: WindowMode) -> bool {
        let Some(state) = self.info_mut(node).and_then(|i| i.window.as_mut()) else {
            return false;
        };
        if state.mode == mode {
            return false;
        }
        state.mode = mode;
        self.set_percent(node, 0.0);
        if let Some(parent) = self.parent(node) {
            self.reset_sibling_percent(parent);
        }
        true
    }

    /// Floats a tiled window or tiles a floating one.
    pub fn toggle_float(&mut self, node: NodeId) -> bool {
        match self.mode(node) {
            Some(WindowMode::Float) => self.set_window_mode(node, WindowMode::Tile),
            Some(_) => self.set_window_mode(node, WindowMode::Float),
            None => false,
        }
    }

    pub fn begin_grab(&mut self, node: NodeId) -> bool {
        self.mode(node) == Some(WindowMode::Tile) && self.set_window_mode(node, WindowMode::GrabTile)
    }

    pub fn end_grab(&mut self, node: NodeId) -> bool {
        self.mode(node) == Some(WindowMode::GrabTile) && self.set_window_mode(node, WindowMode::Tile)
    }

    /// Stores where the pointer was inside `node`, for restoring it when
    /// the window regains focus.
    pub fn remember_pointer(&mut self, node: NodeId, pointer: Point) -> bool {
        let Some(rect) = self.rect(node) else { return false };
        let Some(state) = self.info_mut(node).and_then(|i| i.window.as_mut()) else {
            return false;
        };
        state.pointer_last_position = Some(rect.relative(pointer));
        true
    }

    /// Where the pointer should land when focus moves to `node`.
    pub fn pointer_target(&self, node: NodeId) -> Option<Point> {
        let info = self.info(node)?;
        let rect = info.rect?;
        Some(match info.window?.pointer_last_position {
            Some(offset) => rect.absolute_clamped(offset),
            None => rect.center(),
        })
    }
}

/// Moves `amount` of share from `from` to `to`, keeping both within
/// [`MIN_SHARE`, `MAX_SHARE`] and their sum unchanged.
fn take_share(shares: &mut [f64], to: usize, from: usize, amount: f64) {
    let total = shares[to] + shares[from];
    let lo = MIN_SHARE.max(total - MAX_SHARE);
    let hi = MAX_SHARE.min(total - MIN_SHARE);
    if lo > hi {
        return;
    }
    let grown = (shares[to] + amount).clamp(lo, hi);
    shares[to] = grown;
    shares[from] = total - grown;
}
