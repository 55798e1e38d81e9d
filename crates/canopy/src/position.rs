//! Node placement.
//!
//! Placement runs in two passes over the arena. The first pass walks the visible part of the tree
//! in post-order and assigns every node a `relative` offset from its left sibling (plus, for
//! centered trees, a `modifier` that shifts its whole subtree), pushing subtrees apart whenever a
//! later sibling's descendants would overlap an earlier sibling's. The second pass turns those
//! offsets into `absolute` and `final` coordinates and rebuilds every node's
//! [`StyleCollection`].
//!
//! The centered variant follows Walker's node-positioning algorithm for general trees; the aside
//! variant only ever moves a node to the right of its earlier siblings.

use crate::config::{LayoutConfig, TreeKind};
use crate::geometry::{self, StyleCollection};
use crate::tree::{DepthFirst, NodeId, Tree, Visit};
use std::collections::VecDeque;

/// Recomputes coordinates and style collections for the whole tree.
///
/// Returns the visible nodes, breadth-first.
pub fn layout(tree: &mut Tree, cfg: &LayoutConfig) -> Vec<NodeId> {
    for node in tree.iter_mut() {
        node.relative = None;
        node.modifier = None;
    }

    let root = tree.root_id();
    let visible: Vec<NodeId> = tree.visible_levels(root, None).flatten().collect();
    let mut mask = vec![false; tree.len()];
    for id in &visible {
        mask[id.index()] = true;
    }

    place(tree, cfg);
    finalize(tree, cfg, &mask);
    visible
}

fn place(tree: &mut Tree, cfg: &LayoutConfig) {
    let mut walk = DepthFirst::new(tree.root_id(), |n| n.expanded);
    while let Some(visit) = walk.next(tree) {
        if let Visit::Leave(id) = visit {
            match cfg.kind {
                TreeKind::Centered => place_centered(tree, cfg, id),
                TreeKind::Aside => place_aside(tree, cfg, id),
            }
        }
    }
}

fn relative_of(tree: &Tree, id: NodeId) -> f64 {
    tree.get(id).relative.unwrap_or(0.0)
}

fn children_midpoint(tree: &Tree, id: NodeId) -> Option<f64> {
    let node = tree.get(id);
    if !node.shows_children() {
        return None;
    }
    let first = *node.children.first()?;
    let last = *node.children.last()?;
    Some((relative_of(tree, first) + relative_of(tree, last)) / 2.0)
}

fn place_centered(tree: &mut Tree, cfg: &LayoutConfig, id: NodeId) {
    let midpoint = children_midpoint(tree, id);

    let Some(left) = tree.left_sibling(id) else {
        let node = tree.get_mut(id);
        node.modifier = Some(0.0);
        node.relative = Some(midpoint.unwrap_or(0.0));
        return;
    };

    let relative = relative_of(tree, left) + cfg.sibling_step();
    let node = tree.get_mut(id);
    node.relative = Some(relative);
    match midpoint {
        None => node.modifier = Some(0.0),
        Some(midpoint) => {
            node.modifier = Some(relative - midpoint);
            resolve_overlap(tree, cfg, id);
        }
    }
}

fn place_aside(tree: &mut Tree, cfg: &LayoutConfig, id: NodeId) {
    let Some(left) = tree.left_sibling(id) else {
        tree.get_mut(id).relative = Some(0.0);
        return;
    };

    let relative = relative_of(tree, left) + cfg.sibling_step();
    tree.get_mut(id).relative = Some(relative);
    if tree.get(id).shows_children() {
        resolve_overlap(tree, cfg, id);
    }
}

/// Sum of the modifiers of `id`'s ancestors, stopping at the first ancestor that has none yet.
pub fn modifier_distance(tree: &Tree, id: NodeId) -> f64 {
    let mut total = 0.0;
    let mut cur = id;
    while let Some(parent) = tree.get(cur).parent {
        let Some(modifier) = tree.get(parent).modifier else {
            break;
        };
        total += modifier;
        cur = parent;
    }
    total
}

/// `id`'s relative plus its ancestors', stopping at the first ancestor that has none yet.
pub fn accumulated_relative(tree: &Tree, id: NodeId) -> f64 {
    let mut total = relative_of(tree, id);
    let mut cur = id;
    while let Some(parent) = tree.get(cur).parent {
        let Some(relative) = tree.get(parent).relative else {
            break;
        };
        total += relative;
        cur = parent;
    }
    total
}

/// Pushes `id` (and its subtree) right until none of its descendants overlaps a node of an
/// earlier sibling's subtree on the same level.
///
/// Only the parent's children up to `id` take part. In centered trees the shift is also spread
/// evenly over the siblings between the colliding subtree and `id`.
fn resolve_overlap(tree: &mut Tree, cfg: &LayoutConfig, id: NodeId) {
    let Some(parent) = tree.get(id).parent else {
        return;
    };
    let Some(index) = tree.sibling_index(id) else {
        return;
    };
    let earlier = tree.get(parent).children[..=index].to_vec();
    let levels = tree.visible_levels(parent, Some(&earlier));
    let level = tree.get(id).level;

    let mut queue = VecDeque::from([id]);
    while let Some(item) = queue.pop_front() {
        let node = tree.get(item);
        if !node.shows_children() {
            continue;
        }
        queue.extend(node.children.iter().copied());

        let leftmost = node.children[0];
        let row = levels.row(tree.get(leftmost).level);
        let Some(neighbour) = row
            .iter()
            .position(|x| *x == leftmost)
            .and_then(|pos| pos.checked_sub(1))
            .map(|pos| row[pos])
        else {
            continue;
        };

        match cfg.kind {
            TreeKind::Centered => {
                let overlap = relative_of(tree, neighbour)
                    + cfg.sibling_step()
                    + modifier_distance(tree, neighbour)
                    - relative_of(tree, leftmost)
                    - modifier_distance(tree, leftmost);
                if overlap <= 0.0 {
                    continue;
                }

                shift(tree, id, overlap);

                let mut start = neighbour;
                while tree.get(start).level > level {
                    match tree.get(start).parent {
                        Some(p) => start = p,
                        None => break,
                    }
                }

                let siblings = levels.row(level);
                let from = siblings
                    .iter()
                    .position(|x| *x == start)
                    .map_or(0, |p| p + 1);
                let to = siblings.len().saturating_sub(1);
                if from >= to {
                    continue;
                }
                let between = &siblings[from..to];
                let share = overlap / (between.len() + 1) as f64;
                for sibling in between {
                    shift(tree, *sibling, share);
                }
            }
            TreeKind::Aside => {
                let overlap = accumulated_relative(tree, neighbour) + cfg.sibling_step()
                    - accumulated_relative(tree, leftmost);
                if overlap > 0.0 {
                    let node = tree.get_mut(id);
                    node.relative = Some(node.relative.unwrap_or(0.0) + overlap);
                }
            }
        }
    }
}

fn shift(tree: &mut Tree, id: NodeId, by: f64) {
    let node = tree.get_mut(id);
    node.relative = Some(node.relative.unwrap_or(0.0) + by);
    node.modifier = Some(node.modifier.unwrap_or(0.0) + by);
}

fn finalize(tree: &mut Tree, cfg: &LayoutConfig, mask: &[bool]) {
    let root = tree.root_id();
    let mut walk = DepthFirst::all(root);
    while let Some(visit) = walk.next(tree) {
        match visit {
            Visit::Enter(id) => {
                let visible = mask[id.index()];
                let absolute = visible.then(|| match cfg.kind {
                    TreeKind::Centered => relative_of(tree, id) + modifier_distance(tree, id),
                    TreeKind::Aside => accumulated_relative(tree, id),
                });

                let node = tree.get_mut(id);
                node.pre_visible = node.visible;
                node.visible = visible;
                node.absolute = absolute;
                if !visible {
                    node.relative = None;
                    node.modifier = None;
                    node.final_position = None;
                }
            }
            Visit::Leave(id) => {
                let root_absolute = tree.get(root).absolute.unwrap_or(0.0);
                let node = tree.get_mut(id);
                if id == root {
                    node.final_position = Some(-cfg.final_size / 2.0);
                } else if node.visible {
                    node.final_position = Some(
                        node.absolute.unwrap_or(0.0) - root_absolute - cfg.final_size / 2.0,
                    );
                }
                rebuild_style(tree, cfg, id);
            }
        }
    }
}

/// Moves the current collection to `pre_style` and builds a new one for visible nodes. Children
/// are already done (post-order), so their custom connectors can be filled in here.
fn rebuild_style(tree: &mut Tree, cfg: &LayoutConfig, id: NodeId) {
    let node = tree.get_mut(id);
    node.pre_style = node.style.take();
    if !node.visible {
        if !node.pre_visible {
            node.animation = None;
        }
        return;
    }

    let final_position = node.final_position.unwrap_or(0.0);
    let (node_style, head, tail) = geometry::node_box(cfg, node.level, final_position);
    let mut collection = StyleCollection {
        head_point: Some(head),
        tail_point: Some(tail),
        ..Default::default()
    };
    if node.level > 0 {
        collection.head_line = cfg.head_line.clone();
    }

    let children = if node.shows_children() {
        node.children.clone()
    } else {
        Vec::new()
    };

    if let (Some(first), Some(last)) = (children.first(), children.last()) {
        if cfg.straight_lines() {
            collection.tail_line = cfg.tail_line.clone();
            collection.junction_line = Some(geometry::junction_line(
                cfg,
                &node_style,
                tree.get(*first).final_position.unwrap_or(0.0),
                tree.get(*last).final_position.unwrap_or(0.0),
            ));
        }

        for child in &children {
            let Some(child_style) = tree.get_mut(*child).style.as_mut() else {
                continue;
            };
            let Some(child_head) = child_style.head_point else {
                continue;
            };
            let line = geometry::custom_line(cfg, &tail, &child_head);
            let (start, stop) = geometry::path_endpoints(cfg.strategy, &tail, &child_head, &line);
            child_style.custom_line = Some(line);
            child_style.start_point = Some(start);
            child_style.stop_point = Some(stop);
        }
    }

    collection.node = Some(node_style);
    tree.get_mut(id).style = Some(collection);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutStrategy, TreeOptions};
    use crate::ingest::ingest;
    use crate::key::NodeKey;
    use serde_json::json;

    fn laid_out(strategy: LayoutStrategy) -> Tree {
        let cfg = LayoutConfig::from_options(&TreeOptions {
            layout_strategy: strategy,
            default_expand_all: true,
            ..Default::default()
        });
        let data = json!({ "key": "r", "children": [
            { "key": "a", "children": [{ "key": "a1" }, { "key": "a2" }, { "key": "a3" }] },
            { "key": "b", "children": [{ "key": "b1" }, { "key": "b2" }, { "key": "b3" }] }
        ]});
        let mut tree = ingest(&data, &cfg, None).unwrap().tree;
        layout(&mut tree, &cfg);
        tree
    }

    fn final_of(tree: &Tree, key: &str) -> f64 {
        tree.node(&NodeKey::from(key))
            .and_then(|n| n.final_position)
            .unwrap()
    }

    #[test]
    fn centered_parent_sits_over_its_children() {
        let tree = laid_out(LayoutStrategy::TopCenter);
        assert_eq!(final_of(&tree, "r"), -30.0);
        let a = final_of(&tree, "a");
        assert_eq!(a, (final_of(&tree, "a1") + final_of(&tree, "a3")) / 2.0);
        let b = final_of(&tree, "b");
        assert_eq!(b, (final_of(&tree, "b1") + final_of(&tree, "b3")) / 2.0);
        // b's children were pushed right of a3.
        assert!(final_of(&tree, "b1") - final_of(&tree, "a3") >= 90.0);
        // and the root stays centered over both subtrees.
        assert!((final_of(&tree, "r") - (a + b) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn aside_children_start_at_their_parent() {
        let tree = laid_out(LayoutStrategy::TopLeftAlignLeft);
        assert_eq!(final_of(&tree, "r"), -30.0);
        assert_eq!(final_of(&tree, "a"), -30.0);
        assert_eq!(final_of(&tree, "a1"), -30.0);
        assert_eq!(final_of(&tree, "a3"), 150.0);
        assert_eq!(final_of(&tree, "b"), final_of(&tree, "b1"));
        assert!(final_of(&tree, "b1") - final_of(&tree, "a3") >= 90.0);
    }

    #[test]
    fn every_visible_node_gets_a_collection() {
        let tree = laid_out(LayoutStrategy::CenterRight);
        for (_, node) in tree.iter() {
            let style = node.style.as_ref().unwrap();
            assert!(style.node.is_some());
            assert_eq!(style.head_line.is_some(), node.level > 0);
            assert_eq!(style.junction_line.is_some(), node.shows_children());
            assert_eq!(style.custom_line.is_some(), node.level > 0);
        }
    }
}
