//! Ingestion errors and warnings.

use crate::key::NodeKey;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal ingestion errors. When one is returned, the previously installed tree is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("node must be an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("the identifier of a node must be a string or a number (field `{field}`)")]
    InvalidKey { field: String },

    #[error("the children of a node must be an array (field `{field}`), the identifier is: {key}")]
    InvalidChildren { field: String, key: NodeKey },
}

/// Non-fatal problems found while ingesting a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A node reused an identifier that was already taken; it was dropped with its subtree.
    DuplicateKey { key: NodeKey },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key } => {
                write!(f, "different nodes have the same identifier: {key}")
            }
        }
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
