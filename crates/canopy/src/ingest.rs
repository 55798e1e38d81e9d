use crate::config::LayoutConfig;
use crate::error::{Error, Result, Warning, json_type_name};
use crate::key::NodeKey;
use crate::tree::{Node, NodeId, Tree};
use serde_json::{Map, Value};
use std::collections::VecDeque;

pub(crate) struct Ingested {
    pub(crate) tree: Tree,
    pub(crate) warnings: Vec<Warning>,
}

struct Checked<'a> {
    key: NodeKey,
    children: &'a [Value],
    origin: Map<String, Value>,
}

fn check<'a>(value: &'a Value, cfg: &LayoutConfig) -> Result<Checked<'a>> {
    let Value::Object(object) = value else {
        return Err(Error::NotAnObject {
            found: json_type_name(value),
        });
    };

    let key = object
        .get(&cfg.key_field)
        .and_then(NodeKey::from_value)
        .ok_or_else(|| Error::InvalidKey {
            field: cfg.key_field.clone(),
        })?;

    let children: &[Value] = match object.get(&cfg.children_field) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(Error::InvalidChildren {
                field: cfg.children_field.clone(),
                key,
            });
        }
    };

    let origin: Map<String, Value> = object
        .iter()
        .filter(|(field, _)| **field != cfg.children_field)
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();

    Ok(Checked {
        key,
        children,
        origin,
    })
}

/// Builds a fresh arena from `data`, breadth-first.
///
/// With a `previous` tree, per-node state is carried over by identifier; otherwise the
/// configured expand policy decides what starts expanded. Nothing is returned on error, so the
/// caller's current tree stays in place.
pub(crate) fn ingest(
    data: &Value,
    cfg: &LayoutConfig,
    previous: Option<&Tree>,
) -> Result<Ingested> {
    let root = check(data, cfg)?;
    let mut tree = Tree::with_capacity(root.children.len() + 1);
    let mut warnings = Vec::new();

    let mut queue: VecDeque<(NodeId, &[Value])> = VecDeque::new();
    if let Some(id) = tree.push(Node::new(root.origin, root.key, None, 0)) {
        queue.push_back((id, root.children));
    }

    while let Some((parent, children)) = queue.pop_front() {
        let level = tree.get(parent).level + 1;
        for child in children {
            let checked = check(child, cfg)?;
            if tree.contains_key(&checked.key) {
                tracing::warn!(
                    key = %checked.key,
                    "different nodes have the same identifier, dropping the later one"
                );
                warnings.push(Warning::DuplicateKey { key: checked.key });
                continue;
            }
            let node = Node::new(checked.origin, checked.key, Some(parent), level);
            if let Some(id) = tree.push(node) {
                queue.push_back((id, checked.children));
            }
        }
    }

    let root_id = tree.root_id();
    for node in tree.iter_mut() {
        let is_root = node.parent.is_none();
        let has_children = !node.children.is_empty();

        match previous.and_then(|prev| prev.node(&node.key)) {
            Some(prev) => {
                node.expanded = prev.expanded && has_children;
                node.visible = prev.visible;
                node.style = prev.style.clone();
                node.animation = prev.animation.clone();
            }
            None if previous.is_some() => {}
            None => {
                node.expanded = cfg.expand_policy.expands(&node.key, is_root) && has_children;
            }
        }
    }
    tree.get_mut(root_id).visible = true;

    Ok(Ingested { tree, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeOptions;
    use serde_json::json;

    fn cfg(options: TreeOptions) -> LayoutConfig {
        LayoutConfig::from_options(&options)
    }

    #[test]
    fn builds_breadth_first_and_expands_root() {
        let data = json!({ "key": "r", "children": [
            { "key": "a", "children": [{ "key": "c" }] },
            { "key": 2, "label": "two" }
        ]});
        let out = ingest(&data, &cfg(TreeOptions::default()), None).unwrap();
        let keys: Vec<String> = out.tree.iter().map(|(_, n)| n.key.to_string()).collect();
        assert_eq!(keys, ["r", "a", "2", "c"]);

        let root = out.tree.root();
        assert!(root.expanded && root.visible);
        assert!(!out.tree.node(&NodeKey::from("a")).unwrap().expanded);
        let two = out.tree.node(&NodeKey::Int(2)).unwrap();
        assert_eq!(two.origin.get("label"), Some(&json!("two")));
        assert!(!out.tree.node(&NodeKey::from("a")).unwrap().origin.contains_key("children"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn custom_fields_are_honored() {
        let options = TreeOptions {
            custom_key_field: "id".into(),
            custom_children_field: "kids".into(),
            default_expand_all: true,
            ..Default::default()
        };
        let data = json!({ "id": 1, "kids": [{ "id": 2, "kids": [{ "id": 3 }] }] });
        let out = ingest(&data, &cfg(options), None).unwrap();
        assert_eq!(out.tree.len(), 3);
        assert!(out.tree.node(&NodeKey::Int(2)).unwrap().expanded);
        assert!(!out.tree.node(&NodeKey::Int(3)).unwrap().expanded);
    }

    #[test]
    fn validation_errors_name_the_field() {
        let cfg = cfg(TreeOptions::default());
        assert_eq!(
            ingest(&json!([1, 2]), &cfg, None).err(),
            Some(Error::NotAnObject { found: "an array" })
        );
        assert_eq!(
            ingest(&json!({ "key": true }), &cfg, None).err(),
            Some(Error::InvalidKey { field: "key".into() })
        );
        assert_eq!(
            ingest(
                &json!({ "key": "r", "children": [{ "key": "a", "children": {} }] }),
                &cfg,
                None
            )
            .err(),
            Some(Error::InvalidChildren {
                field: "children".into(),
                key: NodeKey::from("a"),
            })
        );
    }

    #[test]
    fn duplicates_are_dropped_with_their_subtree() {
        let data = json!({ "key": "r", "children": [
            { "key": "a" },
            { "key": "a", "children": [{ "key": "x" }] }
        ]});
        let out = ingest(&data, &cfg(TreeOptions::default()), None).unwrap();
        assert_eq!(out.tree.len(), 2);
        assert!(!out.tree.contains_key(&NodeKey::from("x")));
        assert_eq!(
            out.warnings,
            vec![Warning::DuplicateKey {
                key: NodeKey::from("a")
            }]
        );
    }

    #[test]
    fn reingest_carries_state_by_key() {
        let cfg = cfg(TreeOptions {
            default_expand_all: true,
            ..Default::default()
        });
        let first = json!({ "key": "r", "children": [{ "key": "a", "children": [{ "key": "b" }] }] });
        let mut prev = ingest(&first, &cfg, None).unwrap().tree;
        prev.node_mut(&NodeKey::from("a")).unwrap().expanded = false;
        prev.node_mut(&NodeKey::from("a")).unwrap().visible = true;

        let second = json!({ "key": "r", "children": [
            { "key": "a", "children": [{ "key": "b" }] },
            { "key": "n", "children": [{ "key": "m" }] }
        ]});
        let tree = ingest(&second, &cfg, Some(&prev)).unwrap().tree;
        let a = tree.node(&NodeKey::from("a")).unwrap();
        assert!(!a.expanded);
        assert!(a.visible);
        let n = tree.node(&NodeKey::from("n")).unwrap();
        assert!(!n.expanded && !n.visible);
        assert!(tree.root().expanded && tree.root().visible);
    }
}
