use std::fmt;

use crate::error::{EditorError, Result};
use crate::types::{ConfigTree, ConfigValue};

pub const PATH_DELIMITER: char = '.';

/// A validated dotted path such as `risk_management.atr_params.sl_multiplier`.
///
/// Segments are not escaped, so keys containing `.` cannot be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(invalid(raw, "path is empty"));
        }

        let segments: Vec<String> = raw.split(PATH_DELIMITER).map(str::to_string).collect();
        if let Some(idx) = segments.iter().position(|s| s.is_empty()) {
            return Err(invalid(raw, &format!("segment {} is empty", idx + 1)));
        }
        if let Some(seg) = segments.iter().find(|s| s.trim() != s.as_str()) {
            return Err(invalid(raw, &format!("segment '{}' has surrounding whitespace", seg)));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Splits into the intermediate segments and the leaf key.
    pub fn split_leaf(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((leaf, parents)) => (parents, leaf.as_str()),
            None => (&self.segments[..0], ""),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn invalid(path: &str, reason: &str) -> EditorError {
    EditorError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Returns the value at `path`, or `None` if any segment along the way is
/// missing or does not hold a tree.
pub fn read<'a>(tree: &'a ConfigTree, path: &FieldPath) -> Option<&'a ConfigValue> {
    let (parents, leaf) = path.split_leaf();
    let mut current = tree;
    for key in parents {
        current = current.get(key)?.as_tree()?;
    }
    current.get(leaf)
}

/// Sets the leaf at `path` to `value`, creating any missing intermediate
/// trees. An intermediate holding a non-tree value is replaced by an empty
/// tree. Siblings are left untouched.
pub fn write(tree: &mut ConfigTree, path: &FieldPath, value: ConfigValue) {
    let (parents, leaf) = path.split_leaf();
    tree.insert_nested(parents, leaf, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    fn sample() -> ConfigTree {
        ConfigTree::from_json(json!({
            "risk_management": {
                "method": "atr",
                "atr_params": { "sl_multiplier": 1.5, "tp_risk_reward_ratio": 2.0 }
            },
            "adx_period": 14
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", ".", "a.", ".a", "a..b", " a.b", "a. b"] {
            let err = FieldPath::parse(raw).unwrap_err();
            assert!(matches!(err, EditorError::InvalidPath { .. }), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_segments() {
        let path = p("trading_sessions.sessions.ny.start");
        let (parents, leaf) = path.split_leaf();
        assert_eq!(parents.len(), 3);
        assert_eq!(leaf, "start");
        assert_eq!(path.to_string(), "trading_sessions.sessions.ny.start");
    }

    #[test]
    fn test_read_nested_and_missing() {
        let tree = sample();
        assert_eq!(
            read(&tree, &p("risk_management.atr_params.sl_multiplier")),
            Some(&ConfigValue::Float(1.5))
        );
        assert_eq!(read(&tree, &p("risk_management.missing.sl")), None);
        // stepping through a scalar is absent, not a failure
        assert_eq!(read(&tree, &p("adx_period.value")), None);
    }

    #[test]
    fn test_read_after_write() {
        let mut tree = sample();
        let cases: Vec<(&str, ConfigValue)> = vec![
            ("adx_period", ConfigValue::Integer(20)),
            ("risk_management.method", ConfigValue::from("percentage")),
            ("risk_management.atr_params.sl_multiplier", ConfigValue::Float(2.25)),
            ("symbols", ConfigValue::List(vec!["XAUUSDm".into()])),
            ("portfolio_risk.enabled", ConfigValue::Bool(false)),
        ];
        for (raw, value) in cases {
            write(&mut tree, &p(raw), value.clone());
            assert_eq!(read(&tree, &p(raw)), Some(&value));
        }
    }

    #[test]
    fn test_write_creates_intermediates_without_touching_siblings() {
        let mut tree = sample();
        write(&mut tree, &p("trading_sessions.sessions.asian.start"), "00:00".into());

        let expected = json!({
            "risk_management": {
                "method": "atr",
                "atr_params": { "sl_multiplier": 1.5, "tp_risk_reward_ratio": 2.0 }
            },
            "adx_period": 14,
            "trading_sessions": { "sessions": { "asian": { "start": "00:00" } } }
        });
        assert_eq!(tree.to_json().unwrap(), expected);
    }

    #[test]
    fn test_write_replaces_scalar_intermediate() {
        let mut tree = sample();
        write(&mut tree, &p("adx_period.value"), ConfigValue::Integer(5));
        let json = tree.to_json().unwrap();
        assert_eq!(json["adx_period"], json!({ "value": 5 }));
        assert_eq!(json["risk_management"]["method"], json!("atr"));
    }
}
