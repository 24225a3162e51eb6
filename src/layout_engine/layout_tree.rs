use tracing::{debug, warn};

use crate::actor::move_queue;
use crate::common::config::Settings;
use crate::layout_engine::node::{Components, ContainerId, NodeInfo};
use crate::layout_engine::{LayoutKind, NodeKind, NodeValue, TreeError, WindowMode};
use crate::model::tree::{NodeId, NodeMap, Tree};
use crate::sys::geometry::Rect;
use crate::sys::window_system::{WindowId, WindowSystem};

/// The single layout tree of a session.
///
/// The root owns one node per workspace, each workspace one node per
/// monitor, and monitors hold the containers and windows that are tiled on
/// them.
pub struct LayoutTree {
    pub(crate) tree: Tree<Components>,
    root: NodeId,
    next_container: u64,
    pub(crate) attach_point: Option<NodeId>,
    pub(crate) settings: Settings,
    pub(crate) moves: move_queue::Sender,
}

impl LayoutTree {
    pub fn new(settings: Settings, moves: move_queue::Sender) -> LayoutTree {
        let mut tree = Tree::with_observer(Components::default());
        let root = tree.mk_node().into_root();
        tree.data.info.insert(root, NodeInfo::new(NodeValue::Root, LayoutKind::Root));
        LayoutTree {
            tree,
            root,
            next_container: 0,
            attach_point: None,
            settings,
            moves,
        }
    }

    pub fn root(&self) -> NodeId { self.root }

    pub fn map(&self) -> &NodeMap { &self.tree.map }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn set_settings(&mut self, settings: Settings) { self.settings = settings; }

    /// Where newly tracked windows are attached, if it is still in the tree.
    pub fn attach_point(&self) -> Option<NodeId> {
        self.attach_point.filter(|&n| self.tree.map.contains(n))
    }

    pub fn set_attach_point(&mut self, node: Option<NodeId>) {
        self.attach_point = node.filter(|&n| {
            matches!(self.kind(n), Some(NodeKind::Container | NodeKind::Monitor))
        });
    }

    pub fn info(&self, node: NodeId) -> Option<&NodeInfo> { self.tree.data.info.get(node) }

    pub(crate) fn info_mut(&mut self, node: NodeId) -> Option<&mut NodeInfo> {
        self.tree.data.info.get_mut(node)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.map.contains(id).then_some(NodeRef { tree: self, id })
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> { self.info(node).map(NodeInfo::kind) }

    pub fn value(&self, node: NodeId) -> Option<NodeValue> { self.info(node).map(|i| i.value) }

    pub fn window(&self, node: NodeId) -> Option<WindowId> {
        self.info(node).and_then(|i| i.value.window())
    }

    pub fn layout(&self, node: NodeId) -> LayoutKind {
        self.info(node).map(|i| i.layout).unwrap_or_default()
    }

    pub fn percent(&self, node: NodeId) -> f64 { self.info(node).map_or(0.0, |i| i.percent) }

    pub fn rect(&self, node: NodeId) -> Option<Rect> { self.info(node).and_then(|i| i.rect) }

    pub fn mode(&self, node: NodeId) -> Option<WindowMode> { self.info(node).and_then(NodeInfo::mode) }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> { node.parent(&self.tree.map) }

    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        node.children(&self.tree.map)
    }

    pub fn contains_node(&self, node: NodeId) -> bool { self.tree.map.contains(node) }

    pub(crate) fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(info) = self.info_mut(node) {
            info.rect = Some(rect);
        }
    }

    pub(crate) fn set_percent(&mut self, node: NodeId, percent: f64) {
        if let Some(info) = self.info_mut(node) {
            info.percent = percent.clamp(0.0, 1.0);
        }
    }

    fn next_container_value(&mut self) -> NodeValue {
        self.next_container += 1;
        NodeValue::Container(ContainerId(self.next_container))
    }

    /// Allocates a parentless node carrying `info`.
    pub(crate) fn spawn(&mut self, info: NodeInfo) -> NodeId {
        let node = self.tree.mk_node().into_root();
        self.tree.data.info.insert(node, info);
        node
    }

    pub(crate) fn spawn_container(&mut self, layout: LayoutKind) -> NodeId {
        let value = self.next_container_value();
        self.spawn(NodeInfo::new(value, layout))
    }

    fn default_layout_for(&self, kind: NodeKind) -> LayoutKind {
        match kind {
            NodeKind::Root | NodeKind::Workspace => LayoutKind::Root,
            NodeKind::Monitor => self.settings.layout.default_layout,
            NodeKind::Container | NodeKind::Window => LayoutKind::HSplit,
        }
    }

    /// Creates a node for `value` as the last child of the node whose value
    /// is `parent`.
    ///
    /// Returns `None` when the parent does not exist, is a window, or a node
    /// with `value` is already present.
    pub fn create_node(&mut self, parent: &NodeValue, value: NodeValue) -> Option<NodeId> {
        let Some(parent_id) = self.find_node(parent) else {
            debug!(%parent, %value, "parent not found");
            return None;
        };
        if self.kind(parent_id) == Some(NodeKind::Window) {
            warn!(%parent, %value, "refusing to create a child of a window");
            return None;
        }
        if value.kind() == NodeKind::Root || self.find_node(&value).is_some() {
            warn!(%value, "node already exists");
            return None;
        }
        let layout = self.default_layout_for(value.kind());
        let node = self.spawn(NodeInfo::new(value, layout));
        self.append_child(parent_id, node).ok()
    }

    /// Creates a fresh container under `parent`.
    pub fn create_container(&mut self, parent: NodeId, layout: LayoutKind) -> Result<NodeId, TreeError> {
        self.check_parent(parent)?;
        let node = self.spawn_container(layout);
        self.append_child(parent, node)
    }

    fn check_parent(&self, parent: NodeId) -> Result<(), TreeError> {
        match self.kind(parent) {
            None => Err(TreeError::UnknownNode(parent)),
            Some(NodeKind::Window) => Err(TreeError::IllegalKind {
                kind: NodeKind::Window,
                operation: "have children",
            }),
            Some(_) => Ok(()),
        }
    }

    fn check_attachable(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_parent(parent)?;
        if !self.contains_node(node) {
            return Err(TreeError::UnknownNode(node));
        }
        if node == parent || node.is_ancestor_of(parent, &self.tree.map) {
            return Err(TreeError::WouldCreateCycle { node, parent });
        }
        Ok(())
    }

    /// Moves `node` to the end of `parent`'s children, detaching it from
    /// wherever it was.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, TreeError> {
        self.check_attachable(parent, node)?;
        Ok(node.detach(&mut self.tree).push_back(parent))
    }

    /// Inserts `node` directly before `reference` under `parent`.
    ///
    /// A missing or vanished reference appends. Inserting a node before
    /// itself does nothing.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let Some(reference) = reference.filter(|&r| self.contains_node(r)) else {
            return self.append_child(parent, node);
        };
        if node == reference {
            return Ok(node);
        }
        self.check_attachable(parent, node)?;
        if self.parent(reference) != Some(parent) {
            return Err(TreeError::NotAChild { reference, parent });
        }
        Ok(node.detach(&mut self.tree).insert_before(reference))
    }

    pub(crate) fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<NodeId, TreeError> {
        let parent = self.parent(reference).ok_or(TreeError::UnknownNode(reference))?;
        self.check_attachable(parent, node)?;
        if node == reference {
            return Ok(node);
        }
        Ok(node.detach(&mut self.tree).insert_after(reference))
    }

    pub(crate) fn insert_at(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<NodeId, TreeError> {
        self.check_attachable(parent, node)?;
        Ok(node.detach(&mut self.tree).insert_at(parent, index))
    }

    /// Deletes `node` and its subtree, provided it lies below `parent`.
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        if !self.contains_node(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        if !parent.is_ancestor_of(node, &self.tree.map) {
            return Err(TreeError::NotADescendant { node, ancestor: parent });
        }
        node.detach(&mut self.tree).remove();
        Ok(())
    }

    /// Whether any strict descendant of `ancestor` carries the same value
    /// as `node`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let Some(value) = self.value(node) else { return false };
        self.find_by_value(ancestor, &value).is_some_and(|found| found != ancestor)
    }

    /// Breadth-first search below (and including) `start`.
    pub fn find_by_value(&self, start: NodeId, value: &NodeValue) -> Option<NodeId> {
        start
            .traverse_breadth_first(&self.tree.map)
            .find(|&n| self.value(n).as_ref() == Some(value))
    }

    pub fn find_node(&self, value: &NodeValue) -> Option<NodeId> { self.find_by_value(self.root, value) }

    /// Depth-first search for the node holding `window`.
    pub fn find_node_by_handle(&self, window: WindowId) -> Option<NodeId> {
        self.root
            .traverse_postorder(&self.tree.map)
            .find(|&n| self.window(n) == Some(window))
    }

    /// Every node of `kind` below (and including) `start`, breadth first.
    pub fn find_all_by_kind(&self, start: NodeId, kind: NodeKind) -> Vec<NodeId> {
        start
            .traverse_breadth_first(&self.tree.map)
            .filter(|&n| self.kind(n) == Some(kind))
            .collect()
    }

    pub fn all_window_nodes(&self) -> Vec<NodeId> {
        self.root
            .traverse_preorder(&self.tree.map)
            .filter(|&n| self.kind(n) == Some(NodeKind::Window))
            .collect()
    }

    pub fn all_workspace_nodes(&self) -> Vec<NodeId> {
        self.children(self.root)
            .filter(|&n| self.kind(n) == Some(NodeKind::Workspace))
            .collect()
    }

    pub fn monitor_of(&self, node: NodeId) -> Option<NodeId> {
        node.ancestors(&self.tree.map).find(|&n| self.kind(n) == Some(NodeKind::Monitor))
    }

    /// Whether `node` takes part in tiling: a non-minimized window in tile
    /// mode, or a container holding at least one.
    pub fn is_tiled<H: WindowSystem + ?Sized>(&self, node: NodeId, host: &H) -> bool {
        match self.kind(node) {
            Some(NodeKind::Window) => {
                self.mode(node) == Some(WindowMode::Tile)
                    && self.window(node).is_some_and(|w| !host.is_minimized(w))
            }
            Some(NodeKind::Container) => {
                node.traverse_preorder(&self.tree.map).skip(1).any(|n| {
                    self.kind(n) == Some(NodeKind::Window) && self.is_tiled(n, host)
                })
            }
            _ => false,
        }
    }

    /// Like [`Self::is_tiled`] but ignores minimization.
    pub fn is_tileable(&self, node: NodeId) -> bool {
        match self.kind(node) {
            Some(NodeKind::Window) => self.mode(node) == Some(WindowMode::Tile),
            Some(NodeKind::Container) => node
                .traverse_preorder(&self.tree.map)
                .any(|n| self.mode(n) == Some(WindowMode::Tile)),
            _ => false,
        }
    }

    pub fn tiled_children<H: WindowSystem + ?Sized>(&self, nodes: &[NodeId], host: &H) -> Vec<NodeId> {
        nodes.iter().copied().filter(|&n| self.is_tiled(n, host)).collect()
    }

    /// Clears the stored share of every child of `parent` so the next render
    /// divides it evenly.
    pub fn reset_sibling_percent(&mut self, parent: NodeId) {
        let children: Vec<_> = self.children(parent).collect();
        for child in children {
            self.set_percent(child, 0.0);
        }
    }

    pub fn draw_tree(&self) -> String {
        let tree = self.get_ascii_tree(self.root);
        let mut out = String::new();
        _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn get_ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let marker = if self.attach_point() == Some(node) { "☒ " } else { "" };
        let desc = match self.info(node) {
            Some(info) => {
                let mut desc = format!("{marker}{} {:?}", info.value, info.layout);
                if let Some(mode) = info.mode() {
                    desc = format!("{marker}{} {mode:?}", info.value);
                }
                if info.percent > 0.0 {
                    desc.push_str(&format!(" {:.0}%", info.percent * 100.0));
                }
                if let Some(r) = info.rect {
                    desc.push_str(&format!(" [{} {} {}x{}]", r.x, r.y, r.width, r.height));
                }
                desc
            }
            None => format!("{node:?}"),
        };
        let children: Vec<_> = self.children(node).map(|c| self.get_ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }
}

/// Read-only view of a node, handed to host callbacks.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a LayoutTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId { self.id }

    pub fn info(&self) -> Option<&'a NodeInfo> { self.tree.info(self.id) }

    pub fn value(&self) -> Option<NodeValue> { self.tree.value(self.id) }

    pub fn kind(&self) -> Option<NodeKind> { self.tree.kind(self.id) }

    pub fn window(&self) -> Option<WindowId> { self.tree.window(self.id) }

    pub fn mode(&self) -> Option<WindowMode> { self.tree.mode(self.id) }

    pub fn rect(&self) -> Option<Rect> { self.tree.rect(self.id) }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.tree.parent(self.id).and_then(|p| self.tree.node(p))
    }

    pub fn monitor(&self) -> Option<NodeRef<'a>> {
        self.tree.monitor_of(self.id).and_then(|m| self.tree.node(m))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id).map(move |id| NodeRef { tree, id })
    }

    /// Tiled windows sharing this node's monitor, the node itself included.
    pub fn monitor_tiled_window_count<H: WindowSystem + ?Sized>(&self, host: &H) -> usize {
        let Some(monitor) = self.tree.monitor_of(self.id) else { return 0 };
        self.tree
            .find_all_by_kind(monitor, NodeKind::Window)
            .into_iter()
            .filter(|&w| self.tree.is_tiled(w, host))
            .count()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value() {
            Some(value) => write!(f, "NodeRef({value})"),
            None => write!(f, "NodeRef({:?})", self.id),
        }
    }
}
