#![forbid(unsafe_code)]

//! Headless layout engine for large, expandable/collapsible trees.
//!
//! `canopy` turns a hierarchical JSON data source into per-node geometry: node boxes, connector
//! lines, and the begin/end snapshots needed to animate a transition between two layouts. It
//! does not paint anything; renderers read [`StyleCollection`]s and draw them however they like.
//!
//! ```
//! use canopy::{NodeKey, TreeLayout, TreeOptions};
//! use serde_json::json;
//!
//! let mut layout = TreeLayout::new(TreeOptions::default());
//! layout
//!     .initialize(&json!({ "key": "root", "children": [{ "key": "a" }, { "key": "b" }] }))
//!     .expect("valid tree");
//! assert_eq!(layout.visible_nodes(false).len(), 3);
//!
//! assert!(layout.toggle_expanded(&NodeKey::from("root")));
//! assert_eq!(layout.visible_nodes(false).len(), 1);
//! ```

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
mod ingest;
pub mod key;
pub mod position;
pub mod tree;
pub mod viewport;

pub use animation::Animation;
pub use config::{ExpandPolicy, LayoutConfig, LayoutStrategy, LineType, TreeKind, TreeOptions};
pub use engine::TreeLayout;
pub use error::{Error, Result, Warning};
pub use geometry::{Centering, PointPosition, Side, Style, StyleCollection};
pub use key::NodeKey;
pub use tree::{Node, NodeId, Tree};
pub use viewport::{CanvasPoint, Distance, Element, ScrollTarget, Size, Viewport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
