//! User-facing options and the directional layout configuration derived from them.

use crate::geometry::{Side, Style, connector_template};
use crate::key::NodeKey;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutStrategy {
    /// Root on top, children spread left to right below it.
    #[default]
    TopCenter,
    /// Root at the bottom, children spread left to right above it.
    BottomCenter,
    /// Root on the left, children spread top to bottom to its right.
    CenterLeft,
    /// Root on the right, children spread top to bottom to its left.
    CenterRight,
    /// Root in the top-left corner; children start below it, aligned to its left edge.
    TopLeftAlignLeft,
    /// Root in the top-left corner; children start to its right, aligned to its top edge.
    TopLeftAlignTop,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 6] = [
        Self::TopCenter,
        Self::BottomCenter,
        Self::CenterLeft,
        Self::CenterRight,
        Self::TopLeftAlignLeft,
        Self::TopLeftAlignTop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopCenter => "TOP_CENTER",
            Self::BottomCenter => "BOTTOM_CENTER",
            Self::CenterLeft => "CENTER_LEFT",
            Self::CenterRight => "CENTER_RIGHT",
            Self::TopLeftAlignLeft => "TOP_LEFT_ALIGN_LEFT",
            Self::TopLeftAlignTop => "TOP_LEFT_ALIGN_TOP",
        }
    }

    pub fn kind(self) -> TreeKind {
        match self {
            Self::TopCenter | Self::BottomCenter | Self::CenterLeft | Self::CenterRight => {
                TreeKind::Centered
            }
            Self::TopLeftAlignLeft | Self::TopLeftAlignTop => TreeKind::Aside,
        }
    }

    /// `(final, level, x, y)` sides.
    fn sides(self) -> (Side, Side, Side, Side) {
        use Side::*;
        match self {
            Self::TopCenter | Self::TopLeftAlignLeft => (Left, Top, Left, Top),
            Self::BottomCenter => (Left, Bottom, Left, Bottom),
            Self::CenterLeft | Self::TopLeftAlignTop => (Top, Left, Left, Top),
            Self::CenterRight => (Top, Right, Right, Top),
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layout strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for LayoutStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Which positioning algorithm a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    /// Parents are centered over their children.
    Centered,
    /// Parents are aligned with their first child.
    Aside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Straight,
    /// No built-in connectors; only custom line geometry is produced.
    None,
}

fn lenient_line_type<'de, D>(deserializer: D) -> Result<LineType, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let raw = Value::deserialize(deserializer)?;
    Ok(match &raw {
        Value::String(s) if s == "none" => LineType::None,
        Value::String(s) if s == "straight" => LineType::Straight,
        Value::Null => LineType::Straight,
        other => {
            tracing::warn!(value = %other, "unknown lineType, using `straight`");
            LineType::Straight
        }
    })
}

/// Options accepted by [`TreeLayout::new`](crate::TreeLayout::new).
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeOptions {
    pub default_expand_all: bool,
    /// Defaults to `true` unless `default_expand_all` or `default_expanded_keys` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_expand_root: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_expanded_keys: Option<Vec<NodeKey>>,
    #[serde(alias = "identifierField")]
    pub custom_key_field: String,
    #[serde(alias = "childrenField")]
    pub custom_children_field: String,
    pub layout_strategy: LayoutStrategy,
    pub node_width: f64,
    pub node_height: f64,
    pub sibling_interval: f64,
    pub level_interval: f64,
    #[serde(alias = "lineThickness")]
    pub line_size: f64,
    pub line_color: String,
    #[serde(deserialize_with = "lenient_line_type")]
    pub line_type: LineType,
    #[serde(alias = "initialScaleRatio")]
    pub scale_ratio: f64,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            default_expand_all: false,
            default_expand_root: None,
            default_expanded_keys: None,
            custom_key_field: "key".to_string(),
            custom_children_field: "children".to_string(),
            layout_strategy: LayoutStrategy::TopCenter,
            node_width: 60.0,
            node_height: 30.0,
            sibling_interval: 30.0,
            level_interval: 60.0,
            line_size: 1.0,
            line_color: "black".to_string(),
            line_type: LineType::Straight,
            scale_ratio: 1.0,
        }
    }
}

/// Which nodes start expanded on the first ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandPolicy {
    Root,
    All,
    Keys(FxHashSet<NodeKey>),
}

impl ExpandPolicy {
    /// Explicit keys win over expand-all, which wins over expand-root.
    pub fn from_options(options: &TreeOptions) -> Self {
        if let Some(keys) = &options.default_expanded_keys {
            return Self::Keys(keys.iter().cloned().collect());
        }
        if options.default_expand_all {
            return Self::All;
        }
        match options.default_expand_root {
            Some(false) => Self::Keys(FxHashSet::default()),
            _ => Self::Root,
        }
    }

    pub(crate) fn expands(&self, key: &NodeKey, is_root: bool) -> bool {
        match self {
            Self::Root => is_root,
            Self::All => true,
            Self::Keys(keys) => keys.contains(key),
        }
    }
}

/// Everything the engine needs to know about geometry, derived once from [`TreeOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub strategy: LayoutStrategy,
    pub kind: TreeKind,
    pub expand_policy: ExpandPolicy,
    pub key_field: String,
    pub children_field: String,
    pub node_width: f64,
    pub node_height: f64,
    /// Node extent along the axis siblings are spread on.
    pub final_size: f64,
    /// Node extent along the axis levels are stacked on.
    pub level_size: f64,
    pub sibling_interval: f64,
    pub level_interval: f64,
    pub line_size: f64,
    pub line_color: String,
    pub line_type: LineType,
    pub final_side: Side,
    pub level_side: Side,
    pub x_side: Side,
    pub y_side: Side,
    pub head_line_level_side: Side,
    /// Node-local head line; `None` unless lines are straight.
    pub head_line: Option<Style>,
    /// Node-local tail line; `None` unless lines are straight.
    pub tail_line: Option<Style>,
    pub initial_scale_ratio: f64,
}

impl LayoutConfig {
    pub fn from_options(options: &TreeOptions) -> Self {
        let defaults = TreeOptions::default();
        let node_width = positive_or(options.node_width, defaults.node_width, "nodeWidth");
        let node_height = positive_or(options.node_height, defaults.node_height, "nodeHeight");
        let sibling_interval = non_negative_or(
            options.sibling_interval,
            defaults.sibling_interval,
            "siblingInterval",
        );
        let level_interval = non_negative_or(
            options.level_interval,
            defaults.level_interval,
            "levelInterval",
        );
        let line_size = positive_or(options.line_size, defaults.line_size, "lineSize");
        let initial_scale_ratio =
            positive_or(options.scale_ratio, defaults.scale_ratio, "scaleRatio");

        let strategy = options.layout_strategy;
        let (final_side, level_side, x_side, y_side) = strategy.sides();
        let (final_size, level_size) = if final_side.is_vertical() {
            (node_height, node_width)
        } else {
            (node_width, node_height)
        };

        let mut cfg = Self {
            strategy,
            kind: strategy.kind(),
            expand_policy: ExpandPolicy::from_options(options),
            key_field: non_empty_or(&options.custom_key_field, &defaults.custom_key_field),
            children_field: non_empty_or(
                &options.custom_children_field,
                &defaults.custom_children_field,
            ),
            node_width,
            node_height,
            final_size,
            level_size,
            sibling_interval,
            level_interval,
            line_size,
            line_color: non_empty_or(&options.line_color, &defaults.line_color),
            line_type: options.line_type,
            final_side,
            level_side,
            x_side,
            y_side,
            head_line_level_side: level_side.opposite(),
            head_line: None,
            tail_line: None,
            initial_scale_ratio,
        };

        if cfg.line_type == LineType::Straight {
            cfg.head_line = Some(connector_template(&cfg, cfg.head_line_level_side));
            cfg.tail_line = Some(connector_template(&cfg, cfg.level_side));
        }
        cfg
    }

    /// Distance between the origins of two adjacent siblings.
    pub fn sibling_step(&self) -> f64 {
        self.final_size + self.sibling_interval
    }

    pub fn straight_lines(&self) -> bool {
        self.line_type == LineType::Straight
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::from_options(&TreeOptions::default())
    }
}

fn positive_or(value: f64, default: f64, name: &str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(option = name, value, default, "option out of range, using default");
        default
    }
}

fn non_negative_or(value: f64, default: f64, name: &str) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!(option = name, value, default, "option out of range, using default");
        default
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_accept_camel_case_and_aliases() {
        let options: TreeOptions = serde_json::from_value(json!({
            "identifierField": "id",
            "childrenField": "kids",
            "layoutStrategy": "CENTER_RIGHT",
            "lineThickness": 2,
            "initialScaleRatio": 0.5,
            "lineType": "dotted"
        }))
        .unwrap();
        assert_eq!(options.custom_key_field, "id");
        assert_eq!(options.custom_children_field, "kids");
        assert_eq!(options.layout_strategy, LayoutStrategy::CenterRight);
        assert_eq!(options.line_size, 2.0);
        assert_eq!(options.scale_ratio, 0.5);
        assert_eq!(options.line_type, LineType::Straight);
        assert_eq!(options.node_width, 60.0);

        let none: TreeOptions = serde_json::from_value(json!({ "lineType": "none" })).unwrap();
        assert_eq!(none.line_type, LineType::None);
        assert!(LayoutConfig::from_options(&none).head_line.is_none());
    }

    #[test]
    fn expand_policy_precedence() {
        let mut options = TreeOptions::default();
        assert_eq!(ExpandPolicy::from_options(&options), ExpandPolicy::Root);

        options.default_expand_all = true;
        assert_eq!(ExpandPolicy::from_options(&options), ExpandPolicy::All);

        options.default_expanded_keys = Some(vec![]);
        assert_eq!(
            ExpandPolicy::from_options(&options),
            ExpandPolicy::Keys(FxHashSet::default())
        );

        let closed = TreeOptions {
            default_expand_root: Some(false),
            ..Default::default()
        };
        assert!(!ExpandPolicy::from_options(&closed).expands(&NodeKey::from("root"), true));
    }

    #[test]
    fn strategy_table() {
        let cfg = LayoutConfig::from_options(&TreeOptions {
            layout_strategy: LayoutStrategy::TopLeftAlignTop,
            ..Default::default()
        });
        assert_eq!(cfg.kind, TreeKind::Aside);
        assert_eq!((cfg.final_size, cfg.level_size), (30.0, 60.0));
        assert_eq!((cfg.final_side, cfg.level_side), (Side::Top, Side::Left));
        assert_eq!(cfg.head_line_level_side, Side::Right);

        let cfg = LayoutConfig::from_options(&TreeOptions {
            layout_strategy: LayoutStrategy::BottomCenter,
            ..Default::default()
        });
        assert_eq!(cfg.kind, TreeKind::Centered);
        assert_eq!((cfg.x_side, cfg.y_side), (Side::Left, Side::Bottom));
        assert_eq!(cfg.sibling_step(), 90.0);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let cfg = LayoutConfig::from_options(&TreeOptions {
            node_width: 0.0,
            node_height: f64::NAN,
            level_interval: -5.0,
            sibling_interval: 0.0,
            ..Default::default()
        });
        assert_eq!(cfg.node_width, 60.0);
        assert_eq!(cfg.node_height, 30.0);
        assert_eq!(cfg.level_interval, 60.0);
        assert_eq!(cfg.sibling_interval, 0.0);
    }

    #[test]
    fn strategies_parse_loosely() {
        assert_eq!(
            "top-left-align-top".parse::<LayoutStrategy>(),
            Ok(LayoutStrategy::TopLeftAlignTop)
        );
        assert_eq!(
            "center_left".parse::<LayoutStrategy>(),
            Ok(LayoutStrategy::CenterLeft)
        );
        assert!("diagonal".parse::<LayoutStrategy>().is_err());
    }
}
