pub mod commands;

pub use commands::*;

use chrono::Local;
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::api::ConfigStore;
use crate::editor::{
    path, Completion, ConfigEditor, EditorState, FieldKind, FieldPath, ResetToken, SaveOutcome,
};
use crate::error::EditorError;
use crate::schema::{self, display_value, render_section, SectionId};
use crate::types::{ConfigTree, ConfigValue};

const RECENT_NOTICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive settings session: one editor, one store, line-based input.
pub struct Console<'a, S: ConfigStore + ?Sized> {
    editor: ConfigEditor,
    store: &'a S,
    expanded: HashSet<SectionId>,
    reveal_secrets: bool,
    pending_reset: Option<ResetToken>,
}

impl<'a, S: ConfigStore + ?Sized> Console<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            editor: ConfigEditor::new(),
            store,
            expanded: SectionId::all()
                .into_iter()
                .filter(|s| s.expanded_by_default())
                .collect(),
            reveal_secrets: false,
            pending_reset: None,
        }
    }

    pub fn editor(&self) -> &ConfigEditor {
        &self.editor
    }

    pub fn prompt(&self) -> &'static str {
        if self.pending_reset.is_some() {
            ""
        } else if self.editor.is_dirty() {
            "settings*> "
        } else {
            "settings> "
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> (Flow, String) {
        if let Some(token) = self.pending_reset.take() {
            return (Flow::Continue, self.answer_reset(token, line));
        }

        match parse(line) {
            Ok(command) => match self.execute(command).await {
                Ok(result) => result,
                Err(e) => (Flow::Continue, format!("error: {}", e)),
            },
            Err(msg) => (Flow::Continue, msg),
        }
    }

    fn answer_reset(&mut self, token: ResetToken, line: &str) -> String {
        let answer = line.trim().to_lowercase();
        if answer == "y" || answer == "yes" {
            match self.editor.confirm_reset(token) {
                Ok(()) => "Changes discarded.".to_string(),
                Err(e) => format!("error: {}", e),
            }
        } else {
            self.editor.cancel_reset();
            "Reset cancelled.".to_string()
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<(Flow, String), EditorError> {
        debug!("Console command: {:?}", command);

        let reply = match command {
            Command::Show(None) => {
                let sections: Vec<SectionId> = SectionId::all()
                    .into_iter()
                    .filter(|s| self.expanded.contains(s))
                    .collect();
                self.render(&sections)
            }
            Command::ShowAll => self.render(&SectionId::all()),
            Command::Show(Some(section)) => self.render(&[section]),
            Command::Expand(section) => {
                self.expanded.insert(section);
                format!("{} expanded.", section.title())
            }
            Command::Collapse(section) => {
                self.expanded.remove(&section);
                format!("{} collapsed.", section.title())
            }
            Command::Reveal => {
                self.reveal_secrets = !self.reveal_secrets;
                let text = if self.reveal_secrets { "Passwords shown." } else { "Passwords hidden." };
                text.to_string()
            }
            Command::Get(path) => match self.editor.read(&path)? {
                Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
                None => "<absent>".to_string(),
            },
            Command::Set { path, raw } => {
                let kind = match schema::find_field(&path) {
                    Some(field) => field.kind,
                    None => FieldKind::infer(self.editor.read(&path)?),
                };
                self.editor.set_field_from_input(&path, kind, &raw)?;
                self.describe_field(&path)?
            }
            Command::List { path, raw } => {
                self.editor.set_array_field(&path, &raw)?;
                self.describe_field(&path)?
            }
            Command::Toggle { path, member, present } => {
                self.editor.toggle_list_membership(&path, &member, present)?;
                self.describe_field(&path)?
            }
            Command::Diff => self.diff(),
            Command::Status => self.status(),
            Command::Save => self.save().await?,
            Command::Reset => {
                if !self.editor.is_dirty() {
                    "No unsaved changes.".to_string()
                } else {
                    self.pending_reset = Some(self.editor.request_reset()?);
                    "Are you sure you want to discard all changes? [y/N]".to_string()
                }
            }
            Command::Reload => self.load().await,
            Command::Help => HELP.to_string(),
            Command::Quit => {
                let text = if self.editor.is_dirty() {
                    "Leaving with unsaved changes discarded."
                } else {
                    "Bye."
                };
                self.editor.close();
                return Ok((Flow::Quit, text.to_string()));
            }
        };

        Ok((Flow::Continue, reply))
    }

    pub async fn load(&mut self) -> String {
        match self.editor.load(self.store).await {
            Ok(Completion::Applied(())) => "Configuration loaded.".to_string(),
            Ok(Completion::Stale) => "Load response discarded.".to_string(),
            Err(EditorError::Load(reason)) => {
                let text = self.editor.notice().map(|n| n.text()).unwrap_or_default();
                format!("{} ({})\nType `reload` to retry.", text, reason)
            }
            Err(e) => format!("error: {}", e),
        }
    }

    async fn save(&mut self) -> Result<String, EditorError> {
        if !self.editor.can_save() {
            return Ok(match self.editor.state() {
                EditorState::Ready { dirty: false } => "Nothing to save.".to_string(),
                state => format!("Cannot save while editor is {}.", state),
            });
        }

        let reply = match self.editor.save(self.store).await? {
            Completion::Applied(SaveOutcome::Saved { message }) => {
                info!("Configuration saved via console");
                let text = self.editor.notice().map(|n| n.text()).unwrap_or_else(|| message.unwrap_or_default());
                format!("{} (last saved {})", text, self.editor.last_saved_label())
            }
            Completion::Applied(SaveOutcome::Failed { reason }) => {
                let text = self.editor.notice().map(|n| n.text()).unwrap_or_default();
                format!("{} ({})\nYour edits are kept; run `save` to retry.", text, reason)
            }
            Completion::Stale => "Save response discarded.".to_string(),
        };
        Ok(reply)
    }

    fn status(&self) -> String {
        let mut lines = vec![
            format!("State: {}", self.editor.state()),
            format!("Unsaved changes: {}", if self.editor.is_dirty() { "yes" } else { "no" }),
            format!("Last saved: {}", self.editor.last_saved_label()),
        ];
        if let Some(err) = self.editor.load_error() {
            lines.push(format!("Load error: {}", err));
        }
        if let Some(notice) = self.editor.notice() {
            lines.push(format!("Notice: {}", notice.text()));
        }

        let history = self.editor.notifications().history();
        if !history.is_empty() {
            lines.push("Recent:".to_string());
            for n in history.iter().take(RECENT_NOTICES) {
                let marker = if n.is_error() { "!" } else { "-" };
                lines.push(format!(
                    "  {} {} {}",
                    n.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                    marker,
                    n.text()
                ));
            }
        }
        lines.join("\n")
    }

    /// Changed leaves as `path: saved -> edited`.
    fn diff(&self) -> String {
        let changed = self.editor.changed_paths();
        if changed.is_empty() {
            return "No differences from saved configuration.".to_string();
        }

        let lookup = |tree: Option<&ConfigTree>, raw: &str| -> String {
            FieldPath::parse(raw)
                .ok()
                .zip(tree)
                .and_then(|(p, t)| path::read(t, &p))
                .map(ConfigValue::to_string)
                .unwrap_or_else(|| "<absent>".to_string())
        };

        changed
            .iter()
            .map(|p| {
                format!(
                    "{}: {} -> {}",
                    p,
                    lookup(self.editor.pristine(), p),
                    lookup(self.editor.working(), p)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(&self, sections: &[SectionId]) -> String {
        let Some(tree) = self.editor.working() else {
            return match self.editor.state() {
                EditorState::Error => "Configuration unavailable. Type `reload` to retry.".to_string(),
                state => format!("No configuration loaded (editor is {}).", state),
            };
        };
        if sections.is_empty() {
            return "All sections collapsed. Use `expand <section>` or `show all`.".to_string();
        }

        sections
            .iter()
            .map(|s| render_section(tree, *s, self.reveal_secrets))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn describe_field(&self, path: &str) -> Result<String, EditorError> {
        let shown = match (schema::find_field(path), self.editor.working()) {
            (Some(field), Some(tree)) => display_value(tree, &field, self.reveal_secrets),
            _ => self
                .editor
                .read(path)?
                .map(|v| v.to_string())
                .unwrap_or_default(),
        };
        Ok(format!("{} = {}", path, shown))
    }

    /// Loads the configuration, then reads commands until `quit` or EOF.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let greeting = self.load().await;
        output.write_all(format!("{}\n", greeting).as_bytes()).await?;
        output.write_all(self.prompt().as_bytes()).await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() && self.pending_reset.is_none() {
                output.write_all(self.prompt().as_bytes()).await?;
                output.flush().await?;
                continue;
            }

            let (flow, reply) = self.handle_line(&line).await;
            output.write_all(format!("{}\n", reply).as_bytes()).await?;
            if flow == Flow::Quit {
                break;
            }
            output.write_all(self.prompt().as_bytes()).await?;
            output.flush().await?;
        }

        output.flush().await?;
        Ok(())
    }
}
