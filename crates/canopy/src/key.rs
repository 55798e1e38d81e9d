//! Node identifiers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a node, unique across the whole tree.
///
/// Data sources may use JSON strings or JSON numbers, and both spellings of an identifier name
/// the same node: `7` and `"7"` are one key, as are `1.5` and `"1.5"`. Keys are canonical on
/// construction: text that is exactly the decimal form of an `i64` (and any integral number in
/// range) becomes [`NodeKey::Int`]; everything else is kept as text in [`NodeKey::Str`].
/// Build keys through [`NodeKey::from_value`], `From` or `FromStr` so they stay canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum NodeKey {
    Int(i64),
    Str(String),
}

impl NodeKey {
    /// Extracts a key from a JSON string or number. Other JSON types are not keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::from(s.as_str())),
            Value::Number(n) => Some(Self::from_number(n)),
            _ => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i);
        }
        // 2^63 is the first integral value that no longer fits.
        let fits =
            |f: f64| f.fract() == 0.0 && f >= i64::MIN as f64 && f < 9_223_372_036_854_775_808.0;
        match n.as_f64() {
            Some(f) if fits(f) => Self::Int(f as i64),
            _ => Self::from(n.to_string()),
        }
    }

    fn canonical(text: &str) -> Option<i64> {
        text.parse::<i64>().ok().filter(|i| i.to_string() == text)
    }
}

impl<'de> Deserialize<'de> for NodeKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| de::Error::custom("a node key must be a string or a number"))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Same as `From<&str>`; never fails.
impl FromStr for NodeKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        match Self::canonical(value) {
            Some(i) => Self::Int(i),
            None => Self::Str(value.to_string()),
        }
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        match Self::canonical(&value) {
            Some(i) => Self::Int(i),
            None => Self::Str(value),
        }
    }
}

impl From<i64> for NodeKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for NodeKey {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_from_json_values() {
        assert_eq!(NodeKey::from_value(&json!("O")), Some(NodeKey::from("O")));
        assert_eq!(NodeKey::from_value(&json!(7)), Some(NodeKey::Int(7)));
        assert_eq!(
            NodeKey::from_value(&json!(1.5)),
            Some(NodeKey::Str("1.5".to_string()))
        );
        assert_eq!(NodeKey::from_value(&json!(null)), None);
        assert_eq!(NodeKey::from_value(&json!({ "key": 1 })), None);
    }

    #[test]
    fn string_and_number_spellings_are_one_key() {
        assert_eq!(NodeKey::from_value(&json!("7")), Some(NodeKey::Int(7)));
        assert_eq!(NodeKey::from_value(&json!(7.0)), Some(NodeKey::Int(7)));
        assert_eq!(NodeKey::from("-12"), NodeKey::Int(-12));
        assert_eq!(NodeKey::from_value(&json!("1.5")), NodeKey::from_value(&json!(1.5)));

        // Only the exact decimal form is an integer.
        assert_eq!(NodeKey::from("007"), NodeKey::Str("007".to_string()));
        assert_eq!(NodeKey::from("+7"), NodeKey::Str("+7".to_string()));
        assert_eq!(
            NodeKey::from_value(&json!(u64::MAX)),
            Some(NodeKey::Str(u64::MAX.to_string()))
        );
    }

    #[test]
    fn keys_deserialize_from_any_string_or_number() {
        let keys: Vec<NodeKey> = serde_json::from_value(json!([1.5, "1.5", 7, "7", "x"])).unwrap();
        assert_eq!(
            keys,
            vec![
                NodeKey::Str("1.5".to_string()),
                NodeKey::Str("1.5".to_string()),
                NodeKey::Int(7),
                NodeKey::Int(7),
                NodeKey::from("x"),
            ]
        );
        assert!(serde_json::from_value::<NodeKey>(json!(null)).is_err());
        assert!(serde_json::from_value::<NodeKey>(json!([1])).is_err());
    }

    #[test]
    fn keys_serialize_untagged() {
        let keys = vec![NodeKey::Int(3), NodeKey::from("x")];
        assert_eq!(serde_json::to_value(&keys).unwrap(), json!([3, "x"]));
        assert_eq!("12".parse::<NodeKey>().unwrap(), NodeKey::Int(12));
        assert_eq!("E".parse::<NodeKey>().unwrap(), NodeKey::from("E"));
    }
}
