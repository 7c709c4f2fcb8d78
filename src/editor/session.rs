use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::coerce::{parse_list, FieldKind};
use super::path::{self, FieldPath};
use crate::api::{ConfigStore, SaveReceipt};
use crate::error::{EditorError, Result};
use crate::notifications::{AlertType, Notification, NotificationCenter};
use crate::types::{ConfigTree, ConfigValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditorState {
    Idle,
    Loading,
    Ready { dirty: bool },
    Saving,
    Error,
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorState::Idle => write!(f, "idle"),
            EditorState::Loading => write!(f, "loading"),
            EditorState::Ready { dirty: false } => write!(f, "ready (clean)"),
            EditorState::Ready { dirty: true } => write!(f, "ready (dirty)"),
            EditorState::Saving => write!(f, "saving"),
            EditorState::Error => write!(f, "in error"),
        }
    }
}

/// Issued by [`ConfigEditor::begin_load`]; hand it back with the fetch result.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
}

/// Issued by [`ConfigEditor::begin_save`]. Carries the exact tree being sent.
#[derive(Debug)]
pub struct SaveTicket {
    generation: u64,
    snapshot: ConfigTree,
}

impl SaveTicket {
    pub fn tree(&self) -> &ConfigTree {
        &self.snapshot
    }
}

/// Proof that the user was asked before discarding edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    id: Uuid,
    generation: u64,
}

/// Result of feeding a remote response back into the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    Applied(T),
    /// The session moved on (closed, reloaded or reset) before the response
    /// arrived; nothing was changed.
    Stale,
}

impl<T> Completion<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(v) => Some(v),
            Completion::Stale => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        message: Option<String>,
    },
    Failed {
        reason: String,
    },
}

impl SaveOutcome {
    pub fn into_result(self) -> Result<Option<String>> {
        match self {
            SaveOutcome::Saved { message } => Ok(message),
            SaveOutcome::Failed { reason } => Err(EditorError::Save(reason)),
        }
    }
}

/// Editing session over the bot's configuration tree.
///
/// Holds a working copy that field edits replace, and a pristine copy of
/// what the remote store last confirmed. The two never share structure.
pub struct ConfigEditor {
    state: EditorState,
    working: Option<ConfigTree>,
    pristine: Option<ConfigTree>,
    load_error: Option<String>,
    generation: u64,
    pending_reset: Option<Uuid>,
    notifications: NotificationCenter,
    last_saved: Option<DateTime<Utc>>,
}

impl ConfigEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Idle,
            working: None,
            pristine: None,
            load_error: None,
            generation: 0,
            pending_reset: None,
            notifications: NotificationCenter::new(),
            last_saved: None,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, EditorState::Ready { dirty: true })
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty()
    }

    pub fn working(&self) -> Option<&ConfigTree> {
        self.working.as_ref()
    }

    pub fn pristine(&self) -> Option<&ConfigTree> {
        self.pristine.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notification> {
        self.notifications.pending()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn last_saved_label(&self) -> String {
        match self.last_saved {
            Some(at) => at.with_timezone(&Local).format("%I:%M %p").to_string(),
            None => "Never".to_string(),
        }
    }

    // === Load ===

    /// Starts a fetch. Any tree currently held is dropped; a newer load
    /// supersedes one still in flight.
    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        if self.state == EditorState::Saving {
            return Err(self.transition_error("load"));
        }

        self.generation += 1;
        self.state = EditorState::Loading;
        self.working = None;
        self.pristine = None;
        self.load_error = None;
        self.pending_reset = None;
        self.notifications.clear();

        debug!("Loading configuration (generation {})", self.generation);
        Ok(LoadTicket {
            generation: self.generation,
        })
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: anyhow::Result<ConfigTree>,
    ) -> Result<Completion<()>> {
        if ticket.generation != self.generation || self.state != EditorState::Loading {
            warn!("Discarding stale load response (generation {})", ticket.generation);
            return Ok(Completion::Stale);
        }

        match result {
            Ok(tree) => {
                info!("Configuration loaded: {} top-level keys", tree.len());
                self.pristine = Some(tree.clone());
                self.working = Some(tree);
                self.state = EditorState::Ready { dirty: false };
                Ok(Completion::Applied(()))
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                self.state = EditorState::Error;
                self.load_error = Some(reason.clone());
                self.notifications
                    .push(Notification::new(AlertType::LoadFailed { reason: reason.clone() }));
                Err(EditorError::Load(reason))
            }
        }
    }

    /// Fetches the configuration from `store`. Also the retry path out of
    /// the `Error` state.
    pub async fn load<S: ConfigStore + ?Sized>(&mut self, store: &S) -> Result<Completion<()>> {
        let ticket = self.begin_load()?;
        let result = store.load_configuration().await;
        self.complete_load(ticket, result)
    }

    // === Edits ===

    pub fn read(&self, raw_path: &str) -> Result<Option<&ConfigValue>> {
        let path = FieldPath::parse(raw_path)?;
        Ok(self.working.as_ref().and_then(|tree| path::read(tree, &path)))
    }

    /// Writes `value` at `raw_path` into a fresh copy of the working tree and
    /// swaps it in. Always marks the session dirty.
    pub fn set_field(&mut self, raw_path: &str, value: ConfigValue) -> Result<()> {
        let path = FieldPath::parse(raw_path)?;
        let current = match (&self.state, &self.working) {
            (EditorState::Ready { .. }, Some(tree)) => tree,
            _ => return Err(self.transition_error("edit")),
        };

        let mut next = current.clone();
        debug!("Set {} = {}", path, value);
        path::write(&mut next, &path, value);

        self.working = Some(next);
        self.state = EditorState::Ready { dirty: true };
        self.notifications.clear();
        Ok(())
    }

    pub fn set_field_from_input(&mut self, raw_path: &str, kind: FieldKind, raw: &str) -> Result<()> {
        self.set_field(raw_path, kind.coerce(raw))
    }

    pub fn set_array_field(&mut self, raw_path: &str, raw_text: &str) -> Result<()> {
        self.set_field(raw_path, ConfigValue::List(parse_list(raw_text)))
    }

    /// Adds `member` to the list at `raw_path` (once) or removes every
    /// occurrence of it. A missing or non-list value counts as empty.
    pub fn toggle_list_membership(&mut self, raw_path: &str, member: &str, present: bool) -> Result<()> {
        let mut items: Vec<String> = self
            .read(raw_path)?
            .and_then(|v| v.as_list())
            .map(|items| items.to_vec())
            .unwrap_or_default();

        if present {
            if !items.iter().any(|s| s == member) {
                items.push(member.to_string());
            }
        } else {
            items.retain(|s| s != member);
        }

        self.set_field(raw_path, ConfigValue::List(items))
    }

    /// Leaf paths whose value differs between the working and pristine
    /// trees. Informational only; dirtiness is tracked separately.
    pub fn changed_paths(&self) -> Vec<String> {
        let (Some(working), Some(pristine)) = (&self.working, &self.pristine) else {
            return Vec::new();
        };

        let before: BTreeMap<String, &ConfigValue> = pristine.leaves().into_iter().collect();
        let after: BTreeMap<String, &ConfigValue> = working.leaves().into_iter().collect();

        let mut changed: Vec<String> = after
            .iter()
            .filter(|(path, value)| before.get(*path) != Some(*value))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(before.keys().filter(|p| !after.contains_key(*p)).cloned());
        changed.sort();
        changed
    }

    // === Save ===

    pub fn begin_save(&mut self) -> Result<SaveTicket> {
        if !self.is_dirty() {
            return Err(self.transition_error("save"));
        }
        let snapshot = match &self.working {
            Some(tree) => tree.clone(),
            None => return Err(self.transition_error("save")),
        };

        self.state = EditorState::Saving;
        self.pending_reset = None;
        self.notifications.clear();

        info!("Saving configuration");
        Ok(SaveTicket {
            generation: self.generation,
            snapshot,
        })
    }

    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: anyhow::Result<SaveReceipt>,
    ) -> Completion<SaveOutcome> {
        if ticket.generation != self.generation || self.state != EditorState::Saving {
            warn!("Discarding stale save response (generation {})", ticket.generation);
            return Completion::Stale;
        }

        match result {
            Ok(receipt) => {
                let at = Utc::now();
                self.pristine = Some(ticket.snapshot);
                self.state = EditorState::Ready { dirty: false };
                self.last_saved = Some(at);
                self.notifications.push(Notification::at(
                    AlertType::Saved { message: receipt.message.clone() },
                    at,
                ));
                Completion::Applied(SaveOutcome::Saved {
                    message: receipt.message,
                })
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                self.state = EditorState::Ready { dirty: true };
                self.notifications
                    .push(Notification::new(AlertType::SaveFailed { reason: reason.clone() }));
                Completion::Applied(SaveOutcome::Failed { reason })
            }
        }
    }

    /// Sends the whole working tree to `store`. A failed save keeps every
    /// edit so it can be resubmitted.
    pub async fn save<S: ConfigStore + ?Sized>(&mut self, store: &S) -> Result<Completion<SaveOutcome>> {
        let ticket = self.begin_save()?;
        let result = store.save_configuration(ticket.tree()).await;
        Ok(self.complete_save(ticket, result))
    }

    // === Reset ===

    /// First step of discarding edits. The caller confirms with the user and
    /// then passes the token to [`confirm_reset`](Self::confirm_reset).
    pub fn request_reset(&mut self) -> Result<ResetToken> {
        if !self.is_dirty() {
            return Err(self.transition_error("reset"));
        }
        let id = Uuid::new_v4();
        self.pending_reset = Some(id);
        Ok(ResetToken {
            id,
            generation: self.generation,
        })
    }

    pub fn cancel_reset(&mut self) {
        self.pending_reset = None;
    }

    pub fn confirm_reset(&mut self, token: ResetToken) -> Result<()> {
        if self.pending_reset != Some(token.id) || token.generation != self.generation {
            return Err(EditorError::ResetToken);
        }
        let restored = match (&self.state, &self.pristine) {
            (EditorState::Ready { .. }, Some(pristine)) => pristine.clone(),
            _ => return Err(self.transition_error("reset")),
        };

        self.pending_reset = None;
        self.generation += 1;
        self.working = Some(restored);
        self.state = EditorState::Ready { dirty: false };
        self.notifications.clear();

        info!("Discarded unsaved changes");
        Ok(())
    }

    /// Ends the session. Responses still in flight will be discarded.
    pub fn close(&mut self) {
        self.generation += 1;
        self.state = EditorState::Idle;
        self.working = None;
        self.pristine = None;
        self.load_error = None;
        self.pending_reset = None;
        self.notifications.clear();
    }

    fn transition_error(&self, action: &'static str) -> EditorError {
        EditorError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }
}

impl Default for ConfigEditor {
    fn default() -> Self {
        Self::new()
    }
}
