//! The [`TreeLayout`] facade: ingestion, expansion changes, layout passes and the viewport.

use crate::animation;
use crate::config::{LayoutConfig, TreeOptions};
use crate::error::{Result, Warning};
use crate::geometry::StyleCollection;
use crate::ingest::ingest;
use crate::key::NodeKey;
use crate::position;
use crate::tree::{Node, NodeId, Tree};
use crate::viewport::{CanvasPoint, Element, ScrollTarget, Size, Viewport};
use serde_json::Value;

/// A laid-out tree together with its viewport.
///
/// Every mutating operation recomputes positions, style collections and transition snapshots
/// before returning, so readers always see a consistent layout.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    config: LayoutConfig,
    tree: Option<Tree>,
    visible: Vec<NodeId>,
    viewport: Viewport,
    warnings: Vec<Warning>,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self::new(TreeOptions::default())
    }
}

impl TreeLayout {
    pub fn new(options: TreeOptions) -> Self {
        let config = LayoutConfig::from_options(&options);
        let viewport = Viewport::new(config.initial_scale_ratio);
        Self {
            config,
            tree: None,
            visible: Vec::new(),
            viewport,
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Loads (or reloads) the data source and lays it out.
    ///
    /// On reload, nodes keep their expansion, visibility and geometry by identifier, so the next
    /// frames animate from the previous layout. On error the current tree is kept as is.
    pub fn initialize(&mut self, data: &Value) -> Result<()> {
        let ingested = ingest(data, &self.config, self.tree.as_ref())?;
        self.warnings = ingested.warnings;
        self.tree = Some(ingested.tree);
        self.update();
        Ok(())
    }

    /// Non-fatal problems found by the last successful [`TreeLayout::initialize`].
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<&Node> {
        self.tree.as_ref().map(Tree::root)
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.tree.as_ref()?.node(key)
    }

    /// Recomputes the layout from the current expansion state.
    pub fn update(&mut self) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        self.visible = position::layout(tree, &self.config);
        animation::generate(tree, &self.config);
        tracing::debug!(
            nodes = tree.len(),
            visible = self.visible.len(),
            animating = tree.iter().filter(|(_, n)| n.animation.is_some()).count(),
            "layout updated"
        );
    }

    /// Visible nodes in breadth-first order. With `animating`, every node that takes part in the
    /// current transition instead, including the ones that are on their way out.
    pub fn visible_nodes(&self, animating: bool) -> Vec<&Node> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        if animating {
            tree.iter()
                .map(|(_, n)| n)
                .filter(|n| n.animation.is_some())
                .collect()
        } else {
            self.visible.iter().map(|id| tree.get(*id)).collect()
        }
    }

    /// Flips a node's expansion. Returns `false` for unknown keys and leaves.
    pub fn toggle_expanded(&mut self, key: &NodeKey) -> bool {
        let Some(node) = self.tree.as_mut().and_then(|t| t.node_mut(key)) else {
            return false;
        };
        if node.is_leaf() {
            return false;
        }
        node.expanded = !node.expanded;
        self.update();
        true
    }

    /// Sets the expansion of several nodes and lays out once. Unknown keys and leaves are ignored;
    /// returns `false` when nothing applied.
    pub fn set_expanded_bulk<I>(&mut self, changes: I) -> bool
    where
        I: IntoIterator<Item = (NodeKey, bool)>,
    {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        let mut applied = false;
        for (key, expanded) in changes {
            if let Some(node) = tree.node_mut(&key) {
                if !node.is_leaf() {
                    node.expanded = expanded;
                    applied = true;
                }
            }
        }
        if applied {
            self.update();
        }
        applied
    }

    /// Keys of expanded nodes: visible ones in breadth-first order, or every expanded node in the
    /// tree when `include_invisible` is set.
    pub fn expanded_keys(&self, include_invisible: bool) -> Vec<NodeKey> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        if include_invisible {
            tree.iter()
                .filter(|(_, n)| n.expanded)
                .map(|(_, n)| n.key.clone())
                .collect()
        } else {
            self.visible
                .iter()
                .map(|id| tree.get(*id))
                .filter(|n| n.expanded)
                .map(|n| n.key.clone())
                .collect()
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, size: Size) {
        self.viewport.size = Some(size);
    }

    pub fn clear_viewport(&mut self) {
        self.viewport.size = None;
    }

    pub fn anchor(&self) -> CanvasPoint {
        self.viewport.anchor
    }

    pub fn set_anchor(&mut self, anchor: CanvasPoint) {
        self.viewport.anchor = anchor;
    }

    pub fn scale_ratio(&self) -> f64 {
        self.viewport.scale_ratio
    }

    pub fn rescale(&mut self, ratio: f64) -> bool {
        self.viewport.rescale(ratio)
    }

    pub fn begin_drag(&mut self) {
        self.viewport.begin_drag();
    }

    pub fn continue_drag(&mut self, dx: f64, dy: f64) {
        self.viewport.continue_drag(dx, dy);
    }

    /// Moves the anchor so the target node's box lands at the requested canvas position.
    ///
    /// Fails for unknown or hidden nodes and while the viewport size is unknown.
    pub fn scroll_into_view(&mut self, target: &ScrollTarget) -> bool {
        let Some(node) = self.node(&target.key) else {
            tracing::trace!(key = %target.key, "scroll ignored: unknown node");
            return false;
        };
        let node_box = match (&node.style, node.visible) {
            (Some(style), true) => style.node.clone().unwrap_or_default(),
            _ => {
                tracing::trace!(key = %target.key, "scroll ignored: node is not visible");
                return false;
            }
        };
        self.viewport.scroll_to(
            &self.config,
            &node_box,
            target.top.as_ref(),
            target.left.as_ref(),
        )
    }

    pub fn top_left_in_canvas(
        &self,
        element: Element,
        collection: &StyleCollection,
    ) -> CanvasPoint {
        self.viewport
            .top_left_in_canvas(&self.config, element, collection)
    }

    pub fn virtual_render(&self, collection: &StyleCollection) -> StyleCollection {
        self.viewport.virtual_render(&self.config, collection)
    }

    /// Geometry of `key` at `percent` (0 to 1) through the current transition, culled to the
    /// viewport. Empty when the node does not animate.
    pub fn animation_render(&self, key: &NodeKey, percent: f64) -> StyleCollection {
        let Some(tree) = &self.tree else {
            return StyleCollection::default();
        };
        let Some(node) = tree.node(key) else {
            return StyleCollection::default();
        };
        let Some(anim) = &node.animation else {
            return StyleCollection::default();
        };

        let begin = self.virtual_render(&anim.begin);
        let end = self.virtual_render(&anim.end);
        let parent = node
            .parent
            .and_then(|p| tree.get(p).animation.as_ref());
        animation::frame(&self.config, &begin, &end, parent, percent)
    }
}
