use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ConfigValue;

const PERCENT_SCALE: Decimal = dec!(100);
const LIST_DELIMITER: char = ',';

/// How a field's raw input is turned into a stored value, and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Secret,
    /// Counts and periods. Whole input is stored as a JSON integer.
    Integer,
    /// Account identifiers. Decimal input is truncated.
    Id,
    Number,
    /// Stored as a fraction (0.02), entered and shown as a percentage (2).
    Percent,
    Boolean,
    Choice,
    List,
    Time,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Secret => "secret",
            FieldKind::Integer => "integer",
            FieldKind::Id => "id",
            FieldKind::Number => "number",
            FieldKind::Percent => "percent",
            FieldKind::Boolean => "boolean",
            FieldKind::Choice => "choice",
            FieldKind::List => "list",
            FieldKind::Time => "time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "string" => Some(FieldKind::Text),
            "secret" | "password" => Some(FieldKind::Secret),
            "integer" | "int" => Some(FieldKind::Integer),
            "id" | "login" => Some(FieldKind::Id),
            "number" | "float" => Some(FieldKind::Number),
            "percent" | "pct" => Some(FieldKind::Percent),
            "boolean" | "bool" => Some(FieldKind::Boolean),
            "choice" | "select" => Some(FieldKind::Choice),
            "list" | "array" => Some(FieldKind::List),
            "time" => Some(FieldKind::Time),
            _ => None,
        }
    }

    /// Best guess for a path outside the field catalog, based on what the
    /// tree currently holds there.
    pub fn infer(current: Option<&ConfigValue>) -> Self {
        match current {
            Some(ConfigValue::Integer(_)) => FieldKind::Integer,
            Some(ConfigValue::Float(_)) => FieldKind::Number,
            Some(ConfigValue::Bool(_)) => FieldKind::Boolean,
            Some(ConfigValue::List(_)) => FieldKind::List,
            _ => FieldKind::Text,
        }
    }

    /// Converts raw user input into the value stored in the tree.
    pub fn coerce(&self, raw: &str) -> ConfigValue {
        match self {
            FieldKind::Text | FieldKind::Secret | FieldKind::Choice | FieldKind::Time => {
                ConfigValue::Text(raw.to_string())
            }
            FieldKind::Integer => whole_or_float(parse_number(raw)),
            FieldKind::Id => ConfigValue::Integer(parse_integer(raw)),
            FieldKind::Number => ConfigValue::Float(parse_number(raw)),
            FieldKind::Percent => ConfigValue::Float(percent_to_fraction(parse_number(raw))),
            FieldKind::Boolean => ConfigValue::Bool(parse_bool(raw)),
            FieldKind::List => ConfigValue::List(parse_list(raw)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lenient float parse: anything unparsable or non-finite becomes `0`.
pub fn parse_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Lenient integer parse. Decimal input is truncated toward zero; anything
/// else becomes `0`.
pub fn parse_integer(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return v;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() < i64::MAX as f64 => v.trunc() as i64,
        _ => 0,
    }
}

/// Stores whole values as integers and anything else as typed.
fn whole_or_float(value: f64) -> ConfigValue {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        ConfigValue::Integer(value as i64)
    } else {
        ConfigValue::Float(value)
    }
}

pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "on"
    )
}

/// Splits comma-separated input, trimming each item and dropping empties.
/// Order and duplicates are kept as typed.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Magnitudes outside the decimal range fall back to float arithmetic.
pub fn fraction_to_percent(fraction: f64) -> f64 {
    scale(fraction, |d| d.checked_mul(PERCENT_SCALE)).unwrap_or(fraction * 100.0)
}

pub fn percent_to_fraction(percent: f64) -> f64 {
    scale(percent, |d| d.checked_div(PERCENT_SCALE)).unwrap_or(percent / 100.0)
}

fn scale(value: f64, op: impl Fn(Decimal) -> Option<Decimal>) -> Option<f64> {
    let d = Decimal::from_f64(value)?;
    op(d)?.normalize().to_f64()
}

/// Renders a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b ,, c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list("M5, M15, M5"), vec!["M5", "M15", "M5"]);
        assert!(parse_list(" , ,").is_empty());
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_numeric_coercion_is_lenient() {
        assert_eq!(parse_number("1.25"), 1.25);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);

        assert_eq!(parse_integer("12345"), 12345);
        assert_eq!(parse_integer(" 7.9 "), 7);
        assert_eq!(parse_integer(""), 0);
        assert_eq!(parse_integer("login"), 0);
    }

    #[test]
    fn test_percent_conversion() {
        assert_eq!(fraction_to_percent(0.02), 2.0);
        assert_eq!(percent_to_fraction(5.0), 0.05);
        assert_eq!(fraction_to_percent(0.07), 7.0);
        assert_eq!(percent_to_fraction(1.5), 0.015);
    }

    #[test]
    fn test_percent_conversion_out_of_decimal_range() {
        let shown = fraction_to_percent(1e27);
        assert!((shown - 1e29).abs() / 1e29 < 1e-12);

        let stored = percent_to_fraction(5e30);
        assert!((stored - 5e28).abs() / 5e28 < 1e-12);
        assert!((fraction_to_percent(stored) - 5e30).abs() / 5e30 < 1e-12);
    }

    #[test]
    fn test_kind_coerce() {
        assert_eq!(FieldKind::Percent.coerce("5"), ConfigValue::Float(0.05));
        assert_eq!(FieldKind::Percent.coerce("oops"), ConfigValue::Float(0.0));
        assert_eq!(FieldKind::Integer.coerce("3"), ConfigValue::Integer(3));
        assert_eq!(FieldKind::Integer.coerce("7.9"), ConfigValue::Float(7.9));
        assert_eq!(FieldKind::Integer.coerce(""), ConfigValue::Integer(0));
        assert_eq!(FieldKind::Id.coerce("12345.7"), ConfigValue::Integer(12345));
        assert_eq!(FieldKind::Id.coerce("abc"), ConfigValue::Integer(0));
        assert_eq!(FieldKind::Number.coerce("0.0005"), ConfigValue::Float(0.0005));
        assert_eq!(FieldKind::Boolean.coerce("on"), ConfigValue::Bool(true));
        assert_eq!(FieldKind::Boolean.coerce("off"), ConfigValue::Bool(false));
        assert_eq!(
            FieldKind::List.coerce("BTCUSDm, XAUUSDm"),
            ConfigValue::List(vec!["BTCUSDm".into(), "XAUUSDm".into()])
        );
        assert_eq!(FieldKind::Time.coerce("08:30"), ConfigValue::from("08:30"));
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(FieldKind::infer(Some(&ConfigValue::Integer(3))), FieldKind::Integer);
        assert_eq!(FieldKind::infer(Some(&ConfigValue::Float(0.5))), FieldKind::Number);
        assert_eq!(FieldKind::infer(Some(&ConfigValue::Bool(true))), FieldKind::Boolean);
        assert_eq!(FieldKind::infer(Some(&ConfigValue::List(vec![]))), FieldKind::List);
        assert_eq!(FieldKind::infer(None), FieldKind::Text);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.0005), "0.0005");
        assert_eq!(format_number(-3.0), "-3");
    }
}
