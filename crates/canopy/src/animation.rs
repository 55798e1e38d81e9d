//! Transition snapshots between two consecutive layouts, and per-frame interpolation.

use crate::config::LayoutConfig;
use crate::geometry::{self, PointPosition, Side, Style, StyleCollection};
use crate::tree::{DepthFirst, NodeId, Tree, Visit};
use serde::{Deserialize, Serialize};

/// Begin and end geometry of one node's transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Animation {
    pub begin: StyleCollection,
    pub end: StyleCollection,
}

/// Assigns an [`Animation`] to every node that is visible now or was visible before the last
/// layout. Nodes that are neither are skipped together with their subtrees.
pub fn generate(tree: &mut Tree, cfg: &LayoutConfig) {
    let mut walk = DepthFirst::all(tree.root_id());
    while let Some(visit) = walk.next(tree) {
        let Visit::Enter(id) = visit else {
            continue;
        };
        let node = tree.get(id);
        let animation = match (node.visible, node.pre_visible) {
            (true, false) => appear(tree, cfg, id),
            (true, true) => settle(tree, cfg, id),
            (false, true) => disappear(tree, cfg, id),
            (false, false) => {
                walk.prune();
                continue;
            }
        };
        tree.get_mut(id).animation = Some(animation);
    }
}

fn zero_head_line(cfg: &LayoutConfig) -> Option<Style> {
    cfg.head_line
        .clone()
        .map(|line| line.with(cfg.head_line_level_side, 0.0).collapsed())
}

fn zero_tail_line(cfg: &LayoutConfig) -> Option<Style> {
    cfg.tail_line.clone().map(Style::collapsed)
}

/// Grows out of the nearest ancestor that was already on screen.
fn appear(tree: &Tree, cfg: &LayoutConfig, id: NodeId) -> Animation {
    let node = tree.get(id);
    let anchor = tree.get(tree.ancestor_until(id, |n| n.pre_visible));
    let reference = anchor
        .pre_style
        .as_ref()
        .or(anchor.style.as_ref())
        .cloned()
        .unwrap_or_default();
    let end = node.style.clone().unwrap_or_default();

    let mut begin = StyleCollection {
        node: reference.node.clone(),
        head_point: reference.tail_point,
        tail_point: reference.tail_point,
        custom_line: Some(geometry::collapsed_custom_line(
            cfg,
            reference.head_point.as_ref(),
        )),
        ..Default::default()
    };

    if cfg.straight_lines() {
        begin.head_line = zero_head_line(cfg);
        begin.tail_line = end.tail_line.as_ref().and_then(|_| zero_tail_line(cfg));
        begin.junction_line = node
            .expanded
            .then(|| geometry::empty_junction_line(cfg, reference.node.as_ref()));
    }

    Animation { begin, end }
}

/// Moves from the previous geometry to the current one. Tail and junction lines that exist on
/// only one side collapse into the node box.
fn settle(tree: &mut Tree, cfg: &LayoutConfig, id: NodeId) -> Animation {
    let node = tree.get_mut(id);
    if node.parent.is_none() && node.pre_style.is_none() {
        let current = node.style.clone().unwrap_or_default();
        node.pre_style = Some(StyleCollection {
            node: current.node,
            head_point: current.head_point,
            tail_point: current.tail_point,
            ..Default::default()
        });
    }

    let pre = node.pre_style.clone().unwrap_or_default();
    let cur = node.style.clone().unwrap_or_default();

    let (begin_lines, end_lines) = if cfg.straight_lines() {
        match (&pre.tail_line, &cur.tail_line) {
            (Some(_), Some(_)) => (
                (pre.tail_line.clone(), pre.junction_line.clone()),
                (cur.tail_line.clone(), cur.junction_line.clone()),
            ),
            (Some(_), None) => (
                (pre.tail_line.clone(), pre.junction_line.clone()),
                (
                    zero_tail_line(cfg),
                    Some(geometry::empty_junction_line(cfg, cur.node.as_ref())),
                ),
            ),
            (None, Some(_)) => (
                (
                    zero_tail_line(cfg),
                    Some(geometry::empty_junction_line(cfg, pre.node.as_ref())),
                ),
                (cur.tail_line.clone(), cur.junction_line.clone()),
            ),
            (None, None) => ((None, None), (None, None)),
        }
    } else {
        ((None, None), (None, None))
    };

    let begin = StyleCollection {
        node: pre.node,
        head_line: pre.head_line,
        tail_line: begin_lines.0,
        junction_line: begin_lines.1,
        custom_line: pre.custom_line,
        head_point: pre.head_point,
        tail_point: pre.tail_point,
        start_point: None,
        stop_point: None,
    };
    let end = StyleCollection {
        tail_line: end_lines.0,
        junction_line: end_lines.1,
        ..cur
    };
    Animation { begin, end }
}

/// Shrinks into the nearest ancestor that is still on screen.
fn disappear(tree: &Tree, cfg: &LayoutConfig, id: NodeId) -> Animation {
    let node = tree.get(id);
    let pre = node.pre_style.clone().unwrap_or_default();
    let anchor = tree.get(tree.ancestor_until(id, |n| n.visible));
    let target = anchor.style.clone().unwrap_or_default();

    let end = StyleCollection {
        node: target.node.clone(),
        head_line: pre.head_line.as_ref().and_then(|_| zero_head_line(cfg)),
        tail_line: pre.tail_line.as_ref().and_then(|_| zero_tail_line(cfg)),
        junction_line: pre
            .junction_line
            .as_ref()
            .map(|_| geometry::empty_junction_line(cfg, target.node.as_ref())),
        custom_line: Some(geometry::collapsed_custom_line(
            cfg,
            target.head_point.as_ref(),
        )),
        head_point: target.tail_point,
        tail_point: target.tail_point,
        start_point: None,
        stop_point: None,
    };
    let begin = StyleCollection {
        start_point: None,
        stop_point: None,
        ..pre
    };
    Animation { begin, end }
}

/// Linear interpolation that returns `begin` unchanged when nothing moves.
pub fn lerp(begin: f64, end: f64, percent: f64) -> f64 {
    if begin == end {
        begin
    } else {
        begin + (end - begin) * percent
    }
}

/// Interpolates size and the two given sides; everything else is taken from `begin`.
pub fn interpolate_style(begin: &Style, end: &Style, a: Side, b: Side, percent: f64) -> Style {
    let mut style = begin.clone();
    style.width = lerp(begin.width, end.width, percent);
    style.height = lerp(begin.height, end.height, percent);
    for side in [a, b] {
        style.set(
            side,
            lerp(
                begin.get(side).unwrap_or(0.0),
                end.get(side).unwrap_or(0.0),
                percent,
            ),
        );
    }
    style
}

pub fn interpolate_point(
    begin: &PointPosition,
    end: &PointPosition,
    a: Side,
    b: Side,
    percent: f64,
) -> PointPosition {
    let at = |side| {
        lerp(
            begin.get(side).unwrap_or(0.0),
            end.get(side).unwrap_or(0.0),
            percent,
        )
    };
    PointPosition::at(a, at(a), b, at(b))
}

/// One frame of a transition.
///
/// Only elements present on both sides are emitted. `parent` is the parent's transition; custom
/// connector endpoints are recomputed from it and left out when it is missing.
pub fn frame(
    cfg: &LayoutConfig,
    begin: &StyleCollection,
    end: &StyleCollection,
    parent: Option<&Animation>,
    percent: f64,
) -> StyleCollection {
    let (f, l) = (cfg.final_side, cfg.level_side);
    let both = |b: &Option<Style>, e: &Option<Style>, second: Side| match (b, e) {
        (Some(b), Some(e)) => Some(interpolate_style(b, e, f, second, percent)),
        _ => None,
    };

    let mut out = StyleCollection {
        node: both(&begin.node, &end.node, l),
        head_line: both(&begin.head_line, &end.head_line, cfg.head_line_level_side),
        tail_line: both(&begin.tail_line, &end.tail_line, l),
        junction_line: both(&begin.junction_line, &end.junction_line, l),
        custom_line: both(&begin.custom_line, &end.custom_line, l),
        ..Default::default()
    };

    let endpoints = match (&out.custom_line, parent) {
        (Some(custom), Some(parent)) => {
            let start = interpolate_point(
                &parent.begin.tail_point.unwrap_or_default(),
                &parent.end.tail_point.unwrap_or_default(),
                f,
                l,
                percent,
            );
            let stop = interpolate_point(
                &begin.head_point.unwrap_or_default(),
                &end.head_point.unwrap_or_default(),
                f,
                l,
                percent,
            );
            Some(geometry::path_endpoints(cfg.strategy, &start, &stop, custom))
        }
        _ => None,
    };
    if let Some((start, stop)) = endpoints {
        out.start_point = Some(start);
        out.stop_point = Some(stop);
    }
    out
}
