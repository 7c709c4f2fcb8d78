use std::fmt::Write as _;

use super::sections::{FieldSpec, SectionId};
use crate::editor::coerce::{format_number, fraction_to_percent};
use crate::editor::path::{self, FieldPath};
use crate::editor::FieldKind;
use crate::types::{ConfigTree, ConfigValue};

const MASK: &str = "********";
const DEFAULT_TIME: &str = "00:00";

fn lookup<'a>(tree: &'a ConfigTree, field: &FieldSpec) -> Option<&'a ConfigValue> {
    FieldPath::parse(&field.path)
        .ok()
        .and_then(|p| path::read(tree, &p))
}

/// Formats a field's current value the way the settings page shows it.
pub fn display_value(tree: &ConfigTree, field: &FieldSpec, reveal_secrets: bool) -> String {
    let value = lookup(tree, field);

    match field.kind {
        FieldKind::Percent => {
            let fraction = value.and_then(|v| v.as_f64()).unwrap_or(0.0);
            format_number(fraction_to_percent(fraction))
        }
        FieldKind::Integer | FieldKind::Id | FieldKind::Number => value
            .and_then(|v| v.as_f64())
            .map(format_number)
            .unwrap_or_default(),
        FieldKind::Boolean => {
            let on = value.and_then(|v| v.as_bool()).unwrap_or(false);
            let label = if on { "on" } else { "off" };
            label.to_string()
        }
        FieldKind::Secret => {
            let secret = value.and_then(|v| v.as_str()).unwrap_or("");
            if reveal_secrets || secret.is_empty() {
                secret.to_string()
            } else {
                MASK.to_string()
            }
        }
        FieldKind::Time => value
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_TIME)
            .to_string(),
        FieldKind::List => {
            let items = value.and_then(|v| v.as_list()).unwrap_or(&[]);
            if field.is_membership() {
                field
                    .options
                    .iter()
                    .map(|opt| {
                        let mark = if items.iter().any(|i| i == opt) { 'x' } else { ' ' };
                        format!("[{}] {}", mark, opt)
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            } else {
                items.join(", ")
            }
        }
        FieldKind::Text | FieldKind::Choice => match value {
            Some(ConfigValue::Text(s)) => s.clone(),
            Some(ConfigValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
    }
}

/// Renders one section as indented `label: value` lines.
pub fn render_section(tree: &ConfigTree, section: SectionId, reveal_secrets: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", section.title(), section.description());

    for field in section.fields() {
        let mut value = display_value(tree, &field, reveal_secrets);
        if value.is_empty() {
            if let Some(placeholder) = field.placeholder {
                value = format!("<{}>", placeholder);
            }
        }
        let suffix = field.suffix.map(|s| format!(" {}", s)).unwrap_or_default();
        let _ = writeln!(out, "  {:<30} {}{}  [{}]", field.label, value, suffix, field.path);

        if !field.options.is_empty() && !field.is_membership() {
            let _ = writeln!(out, "  {:<30} options: {}", "", field.options.join(" | "));
        }
    }
    out
}

/// One line of the field reference: path, kind, input hints and description.
pub fn catalog_entry(field: &FieldSpec) -> String {
    let mut line = format!("{:<50} {:<8}", field.path, field.kind);
    match (field.min, field.max) {
        (Some(min), Some(max)) => {
            let _ = write!(line, " {}..{}", format_number(min), format_number(max));
        }
        (Some(min), None) => {
            let _ = write!(line, " >= {}", format_number(min));
        }
        (None, Some(max)) => {
            let _ = write!(line, " <= {}", format_number(max));
        }
        (None, None) => {}
    }
    if let Some(step) = field.step {
        let _ = write!(line, " step {}", format_number(step));
    }
    if let Some(suffix) = field.suffix {
        let _ = write!(line, " ({})", suffix);
    }
    if let Some(description) = field.description {
        let _ = write!(line, "  {}", description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::find_field;
    use serde_json::json;

    fn tree() -> ConfigTree {
        ConfigTree::from_json(json!({
            "mt5_credentials": { "login": 5551234, "password": "hunter2", "server": "Exness-MT5Real", "mt5_terminal_path": null },
            "risk_percent_per_trade": 0.02,
            "symbols": ["BTCUSDm", "XAUUSDm"],
            "active_strategies": ["SMC", "ADX"],
            "portfolio_risk": { "enabled": true },
            "trading_sessions": { "sessions": { "london": { "start": "08:00" } } }
        }))
        .unwrap()
    }

    fn show(path: &str, reveal: bool) -> String {
        display_value(&tree(), &find_field(path).unwrap(), reveal)
    }

    #[test]
    fn test_display_by_kind() {
        assert_eq!(show("risk_percent_per_trade", false), "2");
        assert_eq!(show("mt5_credentials.login", false), "5551234");
        assert_eq!(show("mt5_credentials.password", false), MASK);
        assert_eq!(show("mt5_credentials.password", true), "hunter2");
        assert_eq!(show("mt5_credentials.mt5_terminal_path", false), "");
        assert_eq!(show("symbols", false), "BTCUSDm, XAUUSDm");
        assert_eq!(show("portfolio_risk.enabled", false), "on");
        assert_eq!(show("adx_signal_filter.enabled", false), "off");
        assert_eq!(show("trading_sessions.sessions.london.start", false), "08:00");
        assert_eq!(show("trading_sessions.sessions.ny.end", false), DEFAULT_TIME);
        assert_eq!(show("adx_period", false), "");
    }

    #[test]
    fn test_membership_display() {
        let shown = show("active_strategies", false);
        assert!(shown.contains("[x] SMC"));
        assert!(shown.contains("[ ] Fibonacci"));
        assert!(shown.contains("[x] ADX"));
    }

    #[test]
    fn test_missing_percent_shows_zero() {
        let field = find_field("risk_percent_per_trade").unwrap();
        assert_eq!(display_value(&ConfigTree::new(), &field, false), "0");
    }

    #[test]
    fn test_huge_percent_displays_without_overflow() {
        let field = find_field("risk_percent_per_trade").unwrap();
        let mut tree = tree();
        tree.insert("risk_percent_per_trade", FieldKind::Percent.coerce("5e30"));

        let shown: f64 = display_value(&tree, &field, false).parse().unwrap();
        assert!((shown - 5e30).abs() / 5e30 < 1e-12);

        tree.insert("risk_percent_per_trade", 1e27);
        assert!(!display_value(&tree, &field, false).is_empty());
    }

    #[test]
    fn test_catalog_entry_lists_hints() {
        let adx = catalog_entry(&find_field("adx_period").unwrap());
        assert!(adx.starts_with("adx_period"));
        assert!(adx.contains("integer"));
        assert!(adx.contains("5..50"));

        let fvg = catalog_entry(&find_field("smc_fvg_threshold").unwrap());
        assert!(fvg.contains("step 0.0001"));

        let login = catalog_entry(&find_field("mt5_credentials.login").unwrap());
        assert!(login.contains("Your MT5 account number"));
    }

    #[test]
    fn test_render_section() {
        let text = render_section(&tree(), SectionId::Mt5, false);
        assert!(text.starts_with("MT5 Connection"));
        assert!(text.contains("Exness-MT5Real"));
        assert!(text.contains("<Leave empty for default>"));
        assert!(!text.contains("hunter2"));

        let risk = render_section(&tree(), SectionId::RiskManagement, false);
        assert!(risk.contains("options: atr | percentage | fixed_pips"));
    }
}
