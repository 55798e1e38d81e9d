//! Canvas placement: where the layout's origin sits on screen and how large it is drawn.
//!
//! All layout geometry is expressed relative to a zero-sized anchor. The [`Viewport`] keeps the
//! anchor's position in canvas pixels together with the current scale ratio, and converts boxes
//! between the two spaces.

use crate::config::LayoutConfig;
use crate::geometry::{Style, StyleCollection};
use crate::key::NodeKey;
use serde::{Deserialize, Serialize};

/// Extra margin, in layout units, before an element counts as off screen.
const CULL_BUFFER: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub top: f64,
    pub left: f64,
}

impl CanvasPoint {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// A distance along one canvas dimension: either pixels, or an expression such as `"50%"`,
/// `"25% + 10"` or `"-10 + 100%"`. Percentages refer to the viewport extent on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distance {
    Px(f64),
    Expr(String),
}

impl Distance {
    pub fn resolve(&self, extent: f64) -> f64 {
        match self {
            Self::Px(px) => *px,
            Self::Expr(expr) => resolve_expression(expr, extent),
        }
    }
}

impl From<f64> for Distance {
    fn from(value: f64) -> Self {
        Self::Px(value)
    }
}

impl From<&str> for Distance {
    fn from(value: &str) -> Self {
        Self::Expr(value.to_string())
    }
}

impl From<String> for Distance {
    fn from(value: String) -> Self {
        Self::Expr(value)
    }
}

/// Terms are separated by `+`/`-`; a term that does not parse counts as zero.
fn resolve_expression(expr: &str, extent: f64) -> f64 {
    let mut total = 0.0;
    let mut sign = 1.0;
    let mut rest = expr;
    loop {
        let split = rest.find(['+', '-']);
        let term = match split {
            Some(i) => &rest[..i],
            None => rest,
        };
        total += sign * term_value(term, extent);
        let Some(i) = split else {
            break;
        };
        sign = if rest.as_bytes()[i] == b'-' { -1.0 } else { 1.0 };
        rest = &rest[i + 1..];
    }
    total
}

fn term_value(term: &str, extent: f64) -> f64 {
    if term.trim().is_empty() {
        return 0.0;
    }
    let number = leading_number(term);
    if term.contains('%') {
        extent * number / 100.0
    } else {
        number
    }
}

/// Longest numeric prefix of `term`, or 0.
fn leading_number(term: &str) -> f64 {
    let term = term.trim_start();
    let end = term
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E')))
        .unwrap_or(term.len());
    let candidate = &term[..end];
    (1..=candidate.len())
        .rev()
        .find_map(|n| candidate[..n].parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Where a node should land on the canvas after
/// [`TreeLayout::scroll_into_view`](crate::TreeLayout::scroll_into_view). Missing coordinates
/// center the node on that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollTarget {
    pub key: NodeKey,
    #[serde(default)]
    pub top: Option<Distance>,
    #[serde(default)]
    pub left: Option<Distance>,
}

impl ScrollTarget {
    pub fn new(key: impl Into<NodeKey>) -> Self {
        Self {
            key: key.into(),
            top: None,
            left: None,
        }
    }

    pub fn top(mut self, top: impl Into<Distance>) -> Self {
        self.top = Some(top.into());
        self
    }

    pub fn left(mut self, left: impl Into<Distance>) -> Self {
        self.left = Some(left.into());
        self
    }
}

/// Anchor-space boxes of a [`StyleCollection`] that can be placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Node,
    JunctionLine,
    CustomLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Canvas position of the layout origin.
    pub anchor: CanvasPoint,
    pub scale_ratio: f64,
    /// Canvas size; unknown until the host reports it.
    pub size: Option<Size>,
    drag_origin: CanvasPoint,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Viewport {
    pub fn new(scale_ratio: f64) -> Self {
        Self {
            anchor: CanvasPoint::default(),
            scale_ratio,
            size: None,
            drag_origin: CanvasPoint::default(),
        }
    }

    /// Changes the scale while keeping the layout point under the viewport center in place.
    pub fn rescale(&mut self, ratio: f64) -> bool {
        let Some(size) = self.size else {
            tracing::trace!(ratio, "rescale ignored: viewport size unknown");
            return false;
        };
        if !ratio.is_finite() || ratio == 0.0 {
            tracing::trace!(ratio, "rescale ignored: unusable ratio");
            return false;
        }

        let factor = ratio / self.scale_ratio;
        let (center_top, center_left) = (size.height / 2.0, size.width / 2.0);
        self.anchor.top = center_top - (center_top - self.anchor.top) * factor;
        self.anchor.left = center_left - (center_left - self.anchor.left) * factor;
        self.scale_ratio = ratio;
        true
    }

    pub fn begin_drag(&mut self) {
        self.drag_origin = self.anchor;
    }

    /// Moves the anchor by the total pointer offset since [`Viewport::begin_drag`].
    pub fn continue_drag(&mut self, dx: f64, dy: f64) {
        self.anchor = CanvasPoint::new(self.drag_origin.top + dy, self.drag_origin.left + dx);
    }

    fn box_top_left(&self, style: &Style, width: f64, height: f64) -> CanvasPoint {
        let r = self.scale_ratio;
        let top = match style.top {
            Some(top) => self.anchor.top + top * r,
            None => self.anchor.top - (height + style.bottom.unwrap_or(0.0)) * r,
        };
        let left = match style.left {
            Some(left) => self.anchor.left + left * r,
            None => self.anchor.left - (width + style.right.unwrap_or(0.0)) * r,
        };
        CanvasPoint { top, left }
    }

    /// Canvas position of an element's top-left corner. Missing elements sit on the anchor.
    pub fn top_left_in_canvas(
        &self,
        cfg: &LayoutConfig,
        element: Element,
        collection: &StyleCollection,
    ) -> CanvasPoint {
        match element {
            Element::Node => collection
                .node
                .as_ref()
                .map(|s| self.box_top_left(s, cfg.node_width, cfg.node_height)),
            Element::JunctionLine => collection
                .junction_line
                .as_ref()
                .map(|s| self.box_top_left(s, s.width, s.height)),
            Element::CustomLine => collection
                .custom_line
                .as_ref()
                .map(|s| self.box_top_left(s, s.width, s.height)),
        }
        .unwrap_or(self.anchor)
    }

    /// Anchor position that puts `node_box`'s top-left corner at `target`.
    pub fn anchor_for(
        &self,
        cfg: &LayoutConfig,
        node_box: &Style,
        target: CanvasPoint,
    ) -> CanvasPoint {
        let r = self.scale_ratio;
        let top = match node_box.top {
            Some(top) => target.top - top * r,
            None => target.top + (cfg.node_height + node_box.bottom.unwrap_or(0.0)) * r,
        };
        let left = match node_box.left {
            Some(left) => target.left - left * r,
            None => target.left + (cfg.node_width + node_box.right.unwrap_or(0.0)) * r,
        };
        CanvasPoint { top, left }
    }

    /// Moves the anchor so the node box lands at the requested canvas position.
    pub fn scroll_to(
        &mut self,
        cfg: &LayoutConfig,
        node_box: &Style,
        top: Option<&Distance>,
        left: Option<&Distance>,
    ) -> bool {
        let Some(size) = self.size else {
            tracing::trace!("scroll ignored: viewport size unknown");
            return false;
        };
        let r = self.scale_ratio;
        let target = CanvasPoint {
            top: top.map_or(size.height / 2.0 - cfg.node_height * r / 2.0, |d| {
                d.resolve(size.height)
            }),
            left: left.map_or(size.width / 2.0 - cfg.node_width * r / 2.0, |d| {
                d.resolve(size.width)
            }),
        };
        self.anchor = self.anchor_for(cfg, node_box, target);
        true
    }

    fn off_screen(&self, size: Size, at: CanvasPoint, width: f64, height: f64) -> bool {
        let r = self.scale_ratio;
        at.top + height * r <= 0.0
            || at.left + width * r <= 0.0
            || at.top - (size.height + height * r) >= 0.0
            || at.left - (size.width + width * r) >= 0.0
    }

    /// Drops the parts of `collection` that are certainly outside the viewport.
    ///
    /// Without a known viewport size nothing is dropped. Dropping the custom line also drops the
    /// points and path coordinates that belong to it.
    pub fn virtual_render(
        &self,
        cfg: &LayoutConfig,
        collection: &StyleCollection,
    ) -> StyleCollection {
        let mut out = collection.clone();
        let Some(size) = self.size else {
            return out;
        };
        let margin = cfg.sibling_interval.max(cfg.level_interval) + CULL_BUFFER;

        if let Some(node) = &collection.node {
            let at = self.box_top_left(node, cfg.node_width, cfg.node_height);
            if self.off_screen(size, at, cfg.node_width + margin, cfg.node_height + margin) {
                out.node = None;
            }
        }

        if let Some(line) = &collection.junction_line {
            let at = self.box_top_left(line, line.width, line.height);
            if self.off_screen(size, at, line.width + CULL_BUFFER, line.height + CULL_BUFFER) {
                out.junction_line = None;
            }
        }

        if let Some(line) = &collection.custom_line {
            let at = self.box_top_left(line, line.width, line.height);
            if self.off_screen(size, at, line.width + CULL_BUFFER, line.height + CULL_BUFFER) {
                out.custom_line = None;
                out.head_point = None;
                out.tail_point = None;
                out.start_point = None;
                out.stop_point = None;
            }
        }

        out
    }
}
