use serde::{Deserialize, Serialize};

use crate::editor::FieldKind;

/// Strategies the bot knows how to run; `active_strategies` is a subset.
pub const ALL_STRATEGIES: [&str; 5] = ["SMC", "LiquiditySweep", "Fibonacci", "ADX", "MalaysianSnR"];
pub const ACTIVE_STRATEGIES_PATH: &str = "active_strategies";
pub const TRADING_SESSIONS: [&str; 3] = ["asian", "london", "ny"];

const SL_TP_METHODS: &[&str] = &["atr", "percentage", "fixed_pips"];
const HIGHER_TIMEFRAMES: &[&str] = &["M15", "M30", "H1", "H4", "D1"];

/// Groups of fields on the settings page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    Mt5,
    General,
    RiskManagement,
    Strategies,
    TradingSessions,
}

impl SectionId {
    pub fn all() -> [SectionId; 5] {
        [
            SectionId::Mt5,
            SectionId::General,
            SectionId::RiskManagement,
            SectionId::Strategies,
            SectionId::TradingSessions,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Mt5 => "mt5",
            Self::General => "general",
            Self::RiskManagement => "risk",
            Self::Strategies => "strategies",
            Self::TradingSessions => "sessions",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Mt5 => "MT5 Connection",
            Self::General => "General Settings",
            Self::RiskManagement => "Risk Management",
            Self::Strategies => "Strategy Configuration",
            Self::TradingSessions => "Trading Sessions",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Mt5 => "MetaTrader 5 account credentials",
            Self::General => "Trading symbols, timeframes, and bot parameters",
            Self::RiskManagement => "Risk per trade, stop loss, and position sizing",
            Self::Strategies => "Enable/disable strategies and tune parameters",
            Self::TradingSessions => "Session times and trading hours",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|id| id.key().eq_ignore_ascii_case(s.trim()))
    }

    /// Only the credentials section starts expanded.
    pub fn expanded_by_default(&self) -> bool {
        matches!(self, Self::Mt5)
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        match self {
            Self::Mt5 => mt5_fields(),
            Self::General => general_fields(),
            Self::RiskManagement => risk_fields(),
            Self::Strategies => strategy_fields(),
            Self::TradingSessions => session_fields(),
        }
    }
}

/// One editable field: where it lives in the tree and how it is entered.
///
/// Bounds and step are input hints; nothing enforces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub path: String,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub suffix: Option<&'static str>,
    pub options: &'static [&'static str],
    pub placeholder: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, label: &'static str, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            label,
            kind,
            min: None,
            max: None,
            step: None,
            suffix: None,
            options: &[],
            placeholder: None,
            description: None,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = Some(suffix);
        self
    }

    pub fn options(mut self, options: &'static [&'static str]) -> Self {
        self.options = options;
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// A list field whose items come from a fixed set (checkboxes).
    pub fn is_membership(&self) -> bool {
        self.kind == FieldKind::List && !self.options.is_empty()
    }
}

fn mt5_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("mt5_credentials.login", "Login ID", FieldKind::Id)
            .describe("Your MT5 account number"),
        FieldSpec::new("mt5_credentials.password", "Password", FieldKind::Secret)
            .describe("Your MT5 account password"),
        FieldSpec::new("mt5_credentials.server", "Server", FieldKind::Text)
            .placeholder("e.g., Exness-MT5Real")
            .describe("MT5 broker server name"),
        FieldSpec::new("mt5_credentials.mt5_terminal_path", "Terminal Path", FieldKind::Text)
            .placeholder("Leave empty for default")
            .describe("Path to terminal64.exe (optional)"),
    ]
}

fn general_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("symbols", "Symbols", FieldKind::List)
            .placeholder("BTCUSDm, XAUUSDm")
            .describe("Comma-separated list of trading symbols"),
        FieldSpec::new("timeframes", "Timeframes", FieldKind::List)
            .placeholder("M5, M15")
            .describe("Comma-separated list of timeframes"),
        FieldSpec::new("max_trades_per_symbol", "Max Trades Per Symbol", FieldKind::Integer)
            .range(1.0, 20.0),
        FieldSpec::new("cooldown_period_minutes", "Cooldown Period", FieldKind::Integer)
            .min(0.0)
            .suffix("minutes")
            .describe("Wait time between trades on the same symbol"),
        FieldSpec::new("monitoring_interval_seconds", "Monitoring Interval", FieldKind::Integer)
            .min(1.0)
            .suffix("seconds"),
    ]
}

fn risk_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("risk_percent_per_trade", "Risk Per Trade", FieldKind::Percent)
            .range(0.1, 10.0)
            .step(0.5)
            .suffix("%")
            .describe("Percentage of account to risk per trade"),
        FieldSpec::new("risk_management.method", "SL/TP Method", FieldKind::Choice)
            .options(SL_TP_METHODS)
            .describe("How to calculate Stop Loss and Take Profit"),
        FieldSpec::new("risk_management.atr_params.sl_multiplier", "SL ATR Multiplier", FieldKind::Number)
            .range(0.5, 5.0)
            .step(0.1),
        FieldSpec::new(
            "risk_management.atr_params.tp_risk_reward_ratio",
            "TP Risk:Reward Ratio",
            FieldKind::Number,
        )
        .range(1.0, 10.0)
        .step(0.5),
        FieldSpec::new("portfolio_risk.enabled", "Enable Portfolio Risk", FieldKind::Boolean)
            .describe("Enable portfolio-level risk management"),
        FieldSpec::new(
            "portfolio_risk.max_daily_drawdown_percent",
            "Max Daily Drawdown",
            FieldKind::Number,
        )
        .range(1.0, 50.0)
        .step(1.0)
        .suffix("%"),
        FieldSpec::new(
            "portfolio_risk.max_portfolio_risk_percent",
            "Max Portfolio Risk",
            FieldKind::Number,
        )
        .range(5.0, 100.0)
        .step(5.0)
        .suffix("%"),
    ]
}

fn strategy_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(ACTIVE_STRATEGIES_PATH, "Active Strategies", FieldKind::List)
            .options(&ALL_STRATEGIES),
        // SMC
        FieldSpec::new("smc_swing_lookback", "SMC Swing Lookback", FieldKind::Integer).range(5.0, 100.0),
        FieldSpec::new("smc_fvg_threshold", "SMC FVG Threshold", FieldKind::Number).step(0.0001),
        FieldSpec::new("smc_liquidity_tolerance", "SMC Liquidity Tolerance", FieldKind::Number).step(0.0001),
        FieldSpec::new("smc_higher_timeframe", "SMC Higher Timeframe", FieldKind::Choice)
            .options(HIGHER_TIMEFRAMES),
        // Liquidity sweep
        FieldSpec::new(
            "liquidity_sweep_params.lookback_period",
            "Sweep Lookback Period",
            FieldKind::Integer,
        )
        .range(5.0, 50.0),
        FieldSpec::new(
            "liquidity_sweep_params.eq_level_tolerance",
            "Sweep EQ Level Tolerance",
            FieldKind::Number,
        )
        .step(0.0001),
        FieldSpec::new("liquidity_sweep_params.enable_fvg", "Sweep Enable FVG", FieldKind::Boolean),
        FieldSpec::new(
            "liquidity_sweep_params.enable_mss_confirmation",
            "Sweep Enable MSS Confirmation",
            FieldKind::Boolean,
        ),
        // Fibonacci
        FieldSpec::new(
            "fibonacci_golden_zone.swing_lookback",
            "Fibonacci Swing Lookback",
            FieldKind::Integer,
        )
        .range(10.0, 200.0),
        FieldSpec::new(
            "fibonacci_golden_zone.trend_ema_period",
            "Fibonacci Trend EMA Period",
            FieldKind::Integer,
        )
        .range(10.0, 200.0),
        FieldSpec::new(
            "fibonacci_golden_zone.signal_strength",
            "Fibonacci Signal Strength",
            FieldKind::Number,
        )
        .range(0.1, 1.0)
        .step(0.1),
        // ADX
        FieldSpec::new("adx_signal_filter.enabled", "Enable ADX Filter", FieldKind::Boolean),
        FieldSpec::new("adx_period", "ADX Period", FieldKind::Integer).range(5.0, 50.0),
        FieldSpec::new(
            "adx_signal_filter.min_adx_for_entry",
            "Min ADX for Entry",
            FieldKind::Number,
        )
        .range(5.0, 50.0),
        FieldSpec::new("adx_threshold", "ADX Threshold", FieldKind::Number).range(10.0, 50.0),
    ]
}

fn session_fields() -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::new("trading_sessions.enabled", "Enable Session Filter", FieldKind::Boolean)
            .describe("Only trade during specified sessions"),
    ];
    for session in TRADING_SESSIONS {
        let label = session_label(session);
        fields.push(FieldSpec::new(
            format!("trading_sessions.sessions.{}.start", session),
            label.0,
            FieldKind::Time,
        ));
        fields.push(FieldSpec::new(
            format!("trading_sessions.sessions.{}.end", session),
            label.1,
            FieldKind::Time,
        ));
    }
    fields
}

fn session_label(session: &str) -> (&'static str, &'static str) {
    match session {
        "asian" => ("Asian Start", "Asian End"),
        "london" => ("London Start", "London End"),
        _ => ("New York Start", "New York End"),
    }
}

/// Every field on the settings page, in display order.
pub fn all_fields() -> Vec<FieldSpec> {
    SectionId::all().iter().flat_map(|s| s.fields()).collect()
}

pub fn find_field(path: &str) -> Option<FieldSpec> {
    all_fields().into_iter().find(|f| f.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::FieldPath;
    use std::collections::HashSet;

    #[test]
    fn test_every_catalog_path_is_valid_and_unique() {
        let fields = all_fields();
        let mut seen = HashSet::new();
        for field in &fields {
            assert!(FieldPath::parse(&field.path).is_ok(), "bad path {}", field.path);
            assert!(seen.insert(field.path.clone()), "duplicate path {}", field.path);
        }
        assert_eq!(fields.len(), 39);
    }

    #[test]
    fn test_find_field() {
        let risk = find_field("risk_percent_per_trade").unwrap();
        assert_eq!(risk.kind, FieldKind::Percent);
        assert_eq!(risk.suffix, Some("%"));

        let ny_end = find_field("trading_sessions.sessions.ny.end").unwrap();
        assert_eq!(ny_end.label, "New York End");
        assert!(find_field("not_a_field").is_none());
    }

    #[test]
    fn test_section_lookup() {
        assert_eq!(SectionId::from_str("RISK"), Some(SectionId::RiskManagement));
        assert_eq!(SectionId::from_str("nope"), None);
        assert!(SectionId::Mt5.expanded_by_default());
        assert!(!SectionId::Strategies.expanded_by_default());
    }

    #[test]
    fn test_membership_field() {
        let active = find_field(ACTIVE_STRATEGIES_PATH).unwrap();
        assert!(active.is_membership());
        assert!(!find_field("symbols").unwrap().is_membership());
    }
}
