use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single value in the bot's configuration tree.
///
/// Mirrors the JSON shapes the backend returns for `/config`: scalars,
/// string lists and nested objects. `Null` keeps explicit nulls intact so a
/// whole-tree save sends back what it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Tree(ConfigTree),
}

impl ConfigValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            ConfigValue::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Text(s) => write!(f, "{}", s),
            ConfigValue::List(items) => write!(f, "{}", items.join(", ")),
            ConfigValue::Tree(tree) => write!(f, "{{{} keys}}", tree.len()),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<ConfigTree> for ConfigValue {
    fn from(value: ConfigTree) -> Self {
        ConfigValue::Tree(value)
    }
}

/// Nested mapping of trading parameters, addressed by dotted paths.
///
/// `Clone` is a full structural copy: no substructure is shared between a
/// tree and its clone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree(BTreeMap<String, ConfigValue>);

impl ConfigTree {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets `leaf` below the chain of child trees named by `parents`,
    /// creating missing ones. A non-tree value along the chain is replaced
    /// by an empty tree.
    pub fn insert_nested(&mut self, parents: &[String], leaf: &str, value: ConfigValue) {
        let Some((key, rest)) = parents.split_first() else {
            self.insert(leaf, value);
            return;
        };

        if let Some(ConfigValue::Tree(child)) = self.0.get_mut(key) {
            child.insert_nested(rest, leaf, value);
            return;
        }

        let mut child = ConfigTree::new();
        child.insert_nested(rest, leaf, value);
        self.0.insert(key.clone(), ConfigValue::Tree(child));
    }

    /// Flattens the tree into `(dotted_path, leaf)` pairs in key order.
    /// Empty nested trees are reported as leaves.
    pub fn leaves(&self) -> Vec<(String, &ConfigValue)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a ConfigValue)>) {
        for (key, value) in &self.0 {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                ConfigValue::Tree(child) if !child.is_empty() => child.collect_leaves(&path, out),
                _ => out.push((path, value)),
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
