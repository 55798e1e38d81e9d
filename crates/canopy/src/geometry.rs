//! Box and connector geometry.
//!
//! Every box is expressed the way a renderer positions an absolutely placed element inside a
//! zero-sized anchor: a `width`/`height` plus offsets from two of the four sides. Which two sides
//! are authoritative depends on the [`LayoutStrategy`](crate::LayoutStrategy); the
//! [`LayoutConfig`] carries that mapping (`final_side`, `level_side`, `x_side`, `y_side`).
//!
//! Node boxes, junction lines and custom lines live in anchor space. Head and tail lines are
//! node-local: they are offsets from the node box they hang off.

use crate::config::{LayoutConfig, LayoutStrategy, TreeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// `true` for sides that measure along the vertical canvas axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// Render hint for connector boxes: the box is centered on its cross axis around the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centering {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
}

impl PointPosition {
    pub fn at(a: Side, a_value: f64, b: Side, b_value: f64) -> Self {
        let mut p = Self::default();
        p.set(a, a_value);
        p.set(b, b_value);
        p
    }

    pub fn get(&self, side: Side) -> Option<f64> {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: f64) {
        *side_slot(&mut self.top, &mut self.bottom, &mut self.left, &mut self.right, side) =
            Some(value);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centering: Option<Centering>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Style {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn get(&self, side: Side) -> Option<f64> {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set(&mut self, side: Side, value: f64) {
        *side_slot(&mut self.top, &mut self.bottom, &mut self.left, &mut self.right, side) =
            Some(value);
    }

    /// Builder-style [`Style::set`].
    pub fn with(mut self, side: Side, value: f64) -> Self {
        self.set(side, value);
        self
    }

    /// Same box collapsed to zero size (offsets and hints are kept).
    pub fn collapsed(mut self) -> Self {
        self.width = 0.0;
        self.height = 0.0;
        self
    }
}

fn side_slot<'a>(
    top: &'a mut Option<f64>,
    bottom: &'a mut Option<f64>,
    left: &'a mut Option<f64>,
    right: &'a mut Option<f64>,
    side: Side,
) -> &'a mut Option<f64> {
    match side {
        Side::Top => top,
        Side::Bottom => bottom,
        Side::Left => left,
        Side::Right => right,
    }
}

/// All geometry a renderer needs for one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_line: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_line: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction_line: Option<Style>,
    /// Free-form connector from the parent's tail point to this node's head point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_line: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_point: Option<PointPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail_point: Option<PointPosition>,
    /// Path start inside `custom_line`, in the custom line's local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_point: Option<[f64; 2]>,
    /// Path stop inside `custom_line`, in the custom line's local coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_point: Option<[f64; 2]>,
}

/// Node-local connector template used for head lines (`level_side` = head-line level side) and
/// tail lines (`level_side` = the strategy's level side).
pub(crate) fn connector_template(cfg: &LayoutConfig, level_side: Side) -> Style {
    let mut style = Style {
        color: Some(cfg.line_color.clone()),
        ..Default::default()
    };
    style.set(cfg.final_side, cfg.final_size / 2.0);
    style.set(level_side, cfg.level_size);

    if cfg.level_side.is_vertical() {
        style.width = cfg.line_size;
        style.height = cfg.level_interval / 2.0;
        style.centering = Some(Centering::Horizontal);
    } else {
        style.width = cfg.level_interval / 2.0;
        style.height = cfg.line_size;
        style.centering = Some(Centering::Vertical);
    }
    style
}

/// Node box plus its head and tail connector points.
pub(crate) fn node_box(
    cfg: &LayoutConfig,
    level: usize,
    final_position: f64,
) -> (Style, PointPosition, PointPosition) {
    let level_offset =
        level as f64 * (cfg.level_size + cfg.level_interval) - cfg.level_size / 2.0;
    let style = Style::sized(cfg.node_width, cfg.node_height)
        .with(cfg.final_side, final_position)
        .with(cfg.level_side, level_offset);

    let (x, y) = (cfg.x_side, cfg.y_side);
    let x0 = style.get(x).unwrap_or(0.0);
    let y0 = style.get(y).unwrap_or(0.0);
    let (w, h) = (cfg.node_width, cfg.node_height);

    let (head, tail) = if x == cfg.final_side {
        (
            PointPosition::at(x, x0 + w / 2.0, y, y0),
            PointPosition::at(x, x0 + w / 2.0, y, y0 + h),
        )
    } else {
        (
            PointPosition::at(x, x0, y, y0 + h / 2.0),
            PointPosition::at(x, x0 + w, y, y0 + h / 2.0),
        )
    };
    (style, head, tail)
}

/// Line spanning the children of an expanded node, from the first child to the last.
pub(crate) fn junction_line(
    cfg: &LayoutConfig,
    node_style: &Style,
    first_child_final: f64,
    last_child_final: f64,
) -> Style {
    let length = last_child_final - first_child_final;
    let node_final = node_style.get(cfg.final_side).unwrap_or(0.0);
    let node_level = node_style.get(cfg.level_side).unwrap_or(0.0);

    let final_offset = match cfg.kind {
        TreeKind::Centered => node_final + cfg.final_size / 2.0 - length / 2.0,
        TreeKind::Aside => node_final + cfg.final_size / 2.0,
    };
    let (width, height) = if cfg.level_side.is_vertical() {
        (length, cfg.line_size)
    } else {
        (cfg.line_size, length)
    };

    Style {
        color: Some(cfg.line_color.clone()),
        ..Style::sized(width, height)
    }
    .with(cfg.final_side, final_offset)
    .with(
        cfg.level_side,
        node_level + cfg.level_size + cfg.level_interval / 2.0,
    )
}

/// Zero-sized junction line sitting at the tail of `node_style`.
pub(crate) fn empty_junction_line(cfg: &LayoutConfig, node_style: Option<&Style>) -> Style {
    let node_final = node_style
        .and_then(|s| s.get(cfg.final_side))
        .unwrap_or(0.0);
    let node_level = node_style
        .and_then(|s| s.get(cfg.level_side))
        .unwrap_or(0.0);
    Style::sized(0.0, 0.0)
        .with(cfg.final_side, node_final + cfg.final_size / 2.0)
        .with(cfg.level_side, node_level + cfg.level_size)
}

/// Bounding box of a custom connector between two anchor-space points.
pub(crate) fn custom_line(
    cfg: &LayoutConfig,
    start: &PointPosition,
    stop: &PointPosition,
) -> Style {
    let (x, y) = (cfg.x_side, cfg.y_side);
    let (sx, sy) = (start.get(x).unwrap_or(0.0), start.get(y).unwrap_or(0.0));
    let (ex, ey) = (stop.get(x).unwrap_or(0.0), stop.get(y).unwrap_or(0.0));
    Style::sized((sx - ex).abs(), (sy - ey).abs())
        .with(x, sx.min(ex))
        .with(y, sy.min(ey))
}

/// Zero-sized custom connector at `point` (or at the anchor origin when there is no point).
pub(crate) fn collapsed_custom_line(cfg: &LayoutConfig, point: Option<&PointPosition>) -> Style {
    let at = |side| point.and_then(|p| p.get(side)).unwrap_or(0.0);
    Style::sized(0.0, 0.0)
        .with(cfg.x_side, at(cfg.x_side))
        .with(cfg.y_side, at(cfg.y_side))
}

/// Path endpoints of a custom connector, local to its bounding box.
pub(crate) fn path_endpoints(
    strategy: LayoutStrategy,
    start: &PointPosition,
    stop: &PointPosition,
    custom: &Style,
) -> ([f64; 2], [f64; 2]) {
    let (w, h) = (custom.width, custom.height);
    let left_to_right = start.left.unwrap_or(0.0) < stop.left.unwrap_or(0.0);
    let top_to_bottom = start.top.unwrap_or(0.0) < stop.top.unwrap_or(0.0);

    match strategy {
        LayoutStrategy::TopCenter | LayoutStrategy::TopLeftAlignLeft => {
            let sx = if left_to_right { 0.0 } else { w };
            ([sx, 0.0], [w - sx, h])
        }
        LayoutStrategy::BottomCenter => {
            let sx = if left_to_right { 0.0 } else { w };
            ([sx, h], [w - sx, 0.0])
        }
        LayoutStrategy::CenterLeft | LayoutStrategy::TopLeftAlignTop => {
            let sy = if top_to_bottom { 0.0 } else { h };
            ([0.0, sy], [w, h - sy])
        }
        LayoutStrategy::CenterRight => {
            let sy = if top_to_bottom { 0.0 } else { h };
            ([w, sy], [0.0, h - sy])
        }
    }
}
