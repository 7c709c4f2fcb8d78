use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_SAVE_MESSAGE: &str = "Configuration saved successfully!";
const SAVE_FAILED_MESSAGE: &str = "Failed to save configuration.";
const LOAD_FAILED_MESSAGE: &str = "Failed to load configuration. Make sure the bot is running.";

/// Notification severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Error,
}

/// Events the settings editor reports to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AlertType {
    Saved { message: Option<String> },
    SaveFailed { reason: String },
    LoadFailed { reason: String },
}

impl AlertType {
    pub fn default_severity(&self) -> Severity {
        match self {
            AlertType::Saved { .. } => Severity::Success,
            AlertType::SaveFailed { .. } | AlertType::LoadFailed { .. } => Severity::Error,
        }
    }

    /// Text shown to the user. The collaborator's message wins over the
    /// default success text when present.
    pub fn text(&self) -> String {
        match self {
            AlertType::Saved { message } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_SAVE_MESSAGE)
                .to_string(),
            AlertType::SaveFailed { .. } => SAVE_FAILED_MESSAGE.to_string(),
            AlertType::LoadFailed { .. } => LOAD_FAILED_MESSAGE.to_string(),
        }
    }

    /// Underlying cause for failures.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AlertType::Saved { .. } => None,
            AlertType::SaveFailed { reason } | AlertType::LoadFailed { reason } => {
                Some(reason.as_str())
            }
        }
    }
}

/// A notice surfaced by the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub alert_type: AlertType,
}

impl Notification {
    pub fn new(alert_type: AlertType) -> Self {
        Self::at(alert_type, Utc::now())
    }

    pub fn at(alert_type: AlertType, timestamp: DateTime<Utc>) -> Self {
        let severity = alert_type.default_severity();
        Self {
            timestamp,
            severity,
            alert_type,
        }
    }

    pub fn text(&self) -> String {
        self.alert_type.text()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Holds the notice currently on screen plus a bounded history.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    pending: Option<Notification>,
    history: Vec<Notification>,
    max_history: usize,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            pending: None,
            history: Vec::new(),
            max_history: 50,
        }
    }

    pub fn push(&mut self, notification: Notification) {
        match notification.severity {
            Severity::Error => warn!(
                "{} ({})",
                notification.text(),
                notification.alert_type.detail().unwrap_or("unknown cause")
            ),
            Severity::Success => info!("{}", notification.text()),
        }

        self.history.insert(0, notification.clone());
        if self.history.len() > self.max_history {
            self.history.truncate(self.max_history);
        }
        self.pending = Some(notification);
    }

    pub fn pending(&self) -> Option<&Notification> {
        self.pending.as_ref()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn history(&self) -> &[Notification] {
        &self.history
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_text_prefers_server_message() {
        let with_msg = AlertType::Saved { message: Some("Config updated, bot reloading".to_string()) };
        assert_eq!(with_msg.text(), "Config updated, bot reloading");

        let without = AlertType::Saved { message: None };
        assert_eq!(without.text(), DEFAULT_SAVE_MESSAGE);

        let empty = AlertType::Saved { message: Some(String::new()) };
        assert_eq!(empty.text(), DEFAULT_SAVE_MESSAGE);
    }

    #[test]
    fn test_severity_defaults() {
        assert_eq!(AlertType::Saved { message: None }.default_severity(), Severity::Success);
        assert_eq!(
            AlertType::SaveFailed { reason: "timeout".into() }.default_severity(),
            Severity::Error
        );
        let failed = Notification::new(AlertType::LoadFailed { reason: "refused".into() });
        assert!(failed.is_error());
        assert_eq!(failed.alert_type.detail(), Some("refused"));
        assert_eq!(AlertType::Saved { message: None }.detail(), None);
    }

    #[test]
    fn test_center_pending_and_history() {
        let mut center = NotificationCenter::new();
        center.push(Notification::new(AlertType::SaveFailed { reason: "500".into() }));
        center.push(Notification::new(AlertType::Saved { message: None }));

        assert_eq!(center.pending().map(|n| n.severity), Some(Severity::Success));
        assert_eq!(center.history().len(), 2);

        center.clear();
        assert!(center.pending().is_none());
        assert_eq!(center.history().len(), 2);
    }
}
