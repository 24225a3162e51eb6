use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// N-ary tree stored in an arena.
///
/// Parent links are plain keys, so the only ownership edge is the
/// parent's `children` list.
#[derive(Serialize, Deserialize)]
pub struct Tree<O> {
    pub map: NodeMap,
    pub data: O,
}

impl<O: Observer> Tree<O> {
    pub fn with_observer(data: O) -> Self { Tree { map: NodeMap::new(), data } }

    pub fn mk_node(&mut self) -> UnattachedNode<'_, O> {
        let id = self.map.map.insert(Node::default());
        self.data.added_to_forest(&self.map, id);
        UnattachedNode { id, tree: self }
    }
}

/// Map that holds the structure of the tree.
#[derive(Serialize, Deserialize)]
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

impl NodeMap {
    fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    /// Exchanges the tree positions of `a` and `b`.
    ///
    /// Each node ends up in the slot (parent and index) the other one held.
    /// Both nodes stay attached for the whole operation; neither is ever
    /// listed under two parents. Returns false if either node is a root or
    /// one contains the other.
    pub fn exchange(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let (Some(pa), Some(pb)) = (a.parent(self), b.parent(self)) else {
            return false;
        };
        if a.is_ancestor_of(b, self) || b.is_ancestor_of(a, self) {
            return false;
        }
        let (Some(ia), Some(ib)) = (a.index_in_parent(self), b.index_in_parent(self)) else {
            return false;
        };
        if pa == pb {
            self.map[pa].children.swap(ia, ib);
        } else {
            self.map[pa].children[ia] = b;
            self.map[pb].children[ib] = a;
            self.map[a].parent = Some(pb);
            self.map[b].parent = Some(pa);
        }
        true
    }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl IndexMut<NodeId> for NodeMap {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.map[index] }
}

slotmap::new_key_type! {
    /// Represents a node somewhere in the tree.
    pub struct NodeId;
}

impl NodeId {
    #[track_caller]
    pub fn detach<'a, O: Observer>(self, tree: &'a mut Tree<O>) -> DetachedNode<'a, O> {
        DetachedNode { id: self, tree }
    }

    pub fn parent(self, map: &NodeMap) -> Option<NodeId> { map.map.get(self).and_then(|n| n.parent) }

    pub fn children(self, map: &NodeMap) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        map.map.get(self).map(|n| n.children.as_slice()).unwrap_or(&[]).iter().copied()
    }

    pub fn child_count(self, map: &NodeMap) -> usize {
        map.map.get(self).map(|n| n.children.len()).unwrap_or(0)
    }

    pub fn child_at(self, map: &NodeMap, index: usize) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.children.get(index).copied())
    }

    /// Position of this node in its parent's child list.
    pub fn index_in_parent(self, map: &NodeMap) -> Option<usize> {
        let parent = self.parent(map)?;
        map.map[parent].children.iter().position(|&c| c == self)
    }

    pub fn traverse_postorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PostorderTraversal::new(map, self)
    }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal::new(map, self)
    }

    /// Level by level, siblings in order. Shallow nodes come first.
    pub fn traverse_breadth_first(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        BreadthFirstTraversal::new(map, self)
    }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(self, other: NodeId, map: &NodeMap) -> bool {
        other.ancestors(map).skip(1).any(|a| a == self)
    }

    pub fn is_empty(self, map: &NodeMap) -> bool {
        map.map.get(self).map(|n| n.children.is_empty()).unwrap_or(true)
    }
}

pub trait Observer
where Self: Sized {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId);
    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId);
}

#[must_use = "Unattached nodes should be inserted into the tree or kept as a root"]
pub struct UnattachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> UnattachedNode<'a, O> {
    /// Keeps the node as a parentless root.
    pub fn into_root(self) -> NodeId { self.id }

    pub fn push_back(self, parent: NodeId) -> NodeId {
        let index = parent.child_count(&self.tree.map);
        self.insert_at(parent, index)
    }

    pub fn insert_at(self, parent: NodeId, index: usize) -> NodeId {
        self.id.detach(self.tree).insert_at(parent, index)
    }

    pub fn insert_before(self, sibling: NodeId) -> NodeId {
        self.id.detach(self.tree).insert_before(sibling)
    }
}

#[must_use = "Detached nodes should be reattached to the tree or removed"]
pub struct DetachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> DetachedNode<'a, O> {
    pub fn push_back(self, parent: NodeId) -> NodeId {
        let mut index = parent.child_count(&self.tree.map);
        if self.id.parent(&self.tree.map) == Some(parent) {
            index -= 1;
        }
        self.insert_at(parent, index)
    }

    /// Inserts under `parent` so that the node ends up at `index` in the
    /// final child list. Indices past the end append.
    ///
    /// Linking a node under itself or one of its descendants is ignored.
    pub fn insert_at(self, parent: NodeId, index: usize) -> NodeId {
        let map = &self.tree.map;
        if !map.contains(self.id) || !map.contains(parent) {
            return self.id;
        }
        if parent == self.id || self.id.is_ancestor_of(parent, map) {
            return self.id;
        }
        let old_parent = self.id.parent(map);
        let moved = old_parent != Some(parent);
        if old_parent.is_some() && moved {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
        }
        self.tree.map.unlink(self.id);
        self.tree.map.link_at(self.id, parent, index);
        if moved {
            self.tree.data.added_to_parent(&self.tree.map, self.id);
        }
        self.id
    }

    #[track_caller]
    pub fn insert_before(self, sibling: NodeId) -> NodeId {
        let parent = sibling
            .parent(&self.tree.map)
            .expect("cannot make a sibling of a root node or invalid sibling");
        let index = self.target_index(sibling, 0);
        self.insert_at(parent, index)
    }

    #[track_caller]
    pub fn insert_after(self, sibling: NodeId) -> NodeId {
        let parent = sibling
            .parent(&self.tree.map)
            .expect("cannot make a sibling of a root node or invalid sibling");
        let index = self.target_index(sibling, 1);
        self.insert_at(parent, index)
    }

    /// Index next to `sibling` once this node is out of the way.
    fn target_index(&self, sibling: NodeId, offset: usize) -> usize {
        let map = &self.tree.map;
        let sibling_index = sibling.index_in_parent(map).unwrap_or(0);
        let same_parent = self.id.parent(map).is_some() && self.id.parent(map) == sibling.parent(map);
        match self.id.index_in_parent(map) {
            Some(own) if same_parent && own < sibling_index => sibling_index - 1 + offset,
            _ => sibling_index + offset,
        }
    }

    pub fn remove(self) {
        if self.id.parent(&self.tree.map).is_some() {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
            self.tree.map.unlink(self.id);
        }
        if let Some(node) = self.tree.map.map.remove(self.id) {
            node.delete_recursive(self.tree, self.id);
        }
    }
}

#[derive(Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeMap {
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.map.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.map.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.map.get_mut(id) {
            node.parent = None;
        }
    }

    fn link_at(&mut self, id: NodeId, parent: NodeId, index: usize) {
        debug_assert!(self.map[id].parent.is_none());
        let Some(parent_node) = self.map.get_mut(parent) else {
            return;
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, id);
        self.map[id].parent = Some(parent);
    }
}

impl Node {
    fn delete_recursive(&self, cx: &mut Tree<impl Observer>, id: NodeId) {
        cx.data.removed_from_forest(&cx.map, id);
        for &child in &self.children {
            if let Some(node) = cx.map.map.remove(child) {
                node.delete_recursive(cx, child);
            }
        }
    }
}

struct PostorderTraversal<'a> {
    stack: Vec<(NodeId, usize)>,
    map: &'a NodeMap,
}

impl<'a> PostorderTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self {
        let stack = if map.contains(root) { vec![(root, 0)] } else { vec![] };
        Self { stack, map }
    }
}

impl<'a> Iterator for PostorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, next_child) = *self.stack.last()?;
            match node.child_at(self.map, next_child) {
                Some(child) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.1 += 1;
                    }
                    self.stack.push((child, 0));
                }
                None => {
                    self.stack.pop();
                    return Some(node);
                }
            }
        }
    }
}

struct PreorderTraversal<'a> {
    stack: Vec<NodeId>,
    map: &'a NodeMap,
}

impl<'a> PreorderTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self {
        let stack = if map.contains(root) { vec![root] } else { vec![] };
        Self { stack, map }
    }
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children(self.map).rev());
        Some(node)
    }
}

struct BreadthFirstTraversal<'a> {
    queue: VecDeque<NodeId>,
    map: &'a NodeMap,
}

impl<'a> BreadthFirstTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self {
        let mut queue = VecDeque::new();
        if map.contains(root) {
            queue.push_back(root);
        }
        Self { queue, map }
    }
}

impl<'a> Iterator for BreadthFirstTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.children(self.map));
        Some(node)
    }
}
