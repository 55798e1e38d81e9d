//! Node arena and traversal helpers.

use crate::animation::Animation;
use crate::geometry::StyleCollection;
use crate::key::NodeKey;
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use serde_json::{Map, Value};

/// Index of a node inside its [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The ingested object, without its children field.
    pub origin: Map<String, Value>,
    pub key: NodeKey,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub expanded: bool,
    pub visible: bool,
    pub pre_visible: bool,
    pub level: usize,
    pub relative: Option<f64>,
    pub modifier: Option<f64>,
    pub absolute: Option<f64>,
    pub final_position: Option<f64>,
    pub style: Option<StyleCollection>,
    pub pre_style: Option<StyleCollection>,
    pub animation: Option<Animation>,
}

impl Node {
    pub(crate) fn new(
        origin: Map<String, Value>,
        key: NodeKey,
        parent: Option<NodeId>,
        level: usize,
    ) -> Self {
        Self {
            origin,
            key,
            parent,
            children: Vec::new(),
            expanded: false,
            visible: false,
            pre_visible: false,
            level,
            relative: None,
            modifier: None,
            absolute: None,
            final_position: None,
            style: None,
            pre_style: None,
            animation: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Expanded and actually has children to show.
    pub fn shows_children(&self) -> bool {
        self.expanded && !self.children.is_empty()
    }
}

/// Arena of nodes plus an identifier index. Arena order is breadth-first ingestion order, so the
/// root is always the first node.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    index: HashMap<NodeKey, NodeId, FxBuildHasher>,
}

#[allow(clippy::len_without_is_empty)]
impl Tree {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Appends `node` unless its key is taken; returns `None` for duplicates.
    pub(crate) fn push(&mut self, node: Node) -> Option<NodeId> {
        if self.index.contains_key(&node.key) {
            return None;
        }
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.index.insert(node.key.clone(), id);
        self.nodes.push(node);
        Some(id)
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Number of nodes. A tree always holds at least its root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn id_of(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.id_of(key).map(|id| &self.nodes[id.0])
    }

    pub(crate) fn node_mut(&mut self, key: &NodeKey) -> Option<&mut Node> {
        let id = self.id_of(key)?;
        Some(&mut self.nodes[id.0])
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Position of `id` among its parent's children.
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id).parent?;
        self.get(parent).children.iter().position(|c| *c == id)
    }

    pub fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get(id).parent?;
        let siblings = &self.get(parent).children;
        let idx = siblings.iter().position(|c| *c == id)?;
        idx.checked_sub(1).map(|i| siblings[i])
    }

    /// Walks up from `id` (exclusive) and returns the first ancestor that satisfies `stop`, or the
    /// topmost ancestor reached. `id` itself when it has no parent.
    pub(crate) fn ancestor_until(&self, id: NodeId, stop: impl Fn(&Node) -> bool) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.get(cur).parent {
            if stop(self.get(parent)) {
                return parent;
            }
            cur = parent;
        }
        cur
    }

    /// Breadth-first ids reachable from `from` through expanded nodes, grouped by level.
    /// When `only_children` is set, `from`'s own children are replaced by that slice.
    pub(crate) fn visible_levels(&self, from: NodeId, only_children: Option<&[NodeId]>) -> LevelArray {
        let base = self.get(from).level;
        let mut rows: Vec<Vec<NodeId>> = vec![vec![from]];

        let first: Vec<NodeId> = match only_children {
            Some(children) => children.to_vec(),
            None if self.get(from).expanded => self.get(from).children.clone(),
            None => Vec::new(),
        };
        let mut frontier = first;
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in &frontier {
                let node = self.get(*id);
                if node.expanded {
                    next.extend_from_slice(&node.children);
                }
            }
            rows.push(frontier);
            frontier = next;
        }
        LevelArray { base, rows }
    }
}

/// Ids grouped by absolute level, starting at `base`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LevelArray {
    base: usize,
    rows: Vec<Vec<NodeId>>,
}

impl LevelArray {
    pub(crate) fn row(&self, level: usize) -> &[NodeId] {
        level
            .checked_sub(self.base)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn flatten(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rows.iter().flatten().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    Enter(NodeId),
    Leave(NodeId),
}

/// Depth-first walk with its own frame stack, yielding enter/leave events.
///
/// Children are only descended into when the filter passed to [`DepthFirst::new`] allows it.
/// [`DepthFirst::prune`] drops the node just entered without a leave event.
pub(crate) struct DepthFirst {
    stack: Vec<(NodeId, usize)>,
    pending: Option<NodeId>,
    descend: fn(&Node) -> bool,
}

impl DepthFirst {
    pub(crate) fn new(root: NodeId, descend: fn(&Node) -> bool) -> Self {
        Self {
            stack: Vec::new(),
            pending: Some(root),
            descend,
        }
    }

    pub(crate) fn all(root: NodeId) -> Self {
        Self::new(root, |_| true)
    }

    pub(crate) fn next(&mut self, tree: &Tree) -> Option<Visit> {
        if let Some(id) = self.pending.take() {
            self.stack.push((id, 0));
            return Some(Visit::Enter(id));
        }

        let (id, cursor) = self.stack.last_mut()?;
        let node = tree.get(*id);
        if (self.descend)(node) && *cursor < node.children.len() {
            let child = node.children[*cursor];
            *cursor += 1;
            self.stack.push((child, 0));
            return Some(Visit::Enter(child));
        }

        let id = *id;
        self.stack.pop();
        Some(Visit::Leave(id))
    }

    pub(crate) fn prune(&mut self) {
        self.stack.pop();
    }
}
