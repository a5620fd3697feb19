//! Filesystem event handler for the notify watcher (hot-reload).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::event::ModifyKind;
use notify::{Event, EventKind};
use tracing::{info, warn};

use crate::model::RuleSet;

use super::core::load_ruleset_file;

/// A rule set change detected on disk.
#[derive(Debug)]
pub enum RuleSetChange {
    /// A file was created or modified and parsed into a valid rule set.
    Upsert { path: PathBuf, ruleset: RuleSet },
    /// A file that previously held this rule set was deleted, renamed away,
    /// or now holds a rule set with a different id.
    Remove { path: PathBuf, ruleset_id: String },
}

/// Whether a path has a rule file extension and is not a dotfile.
pub(super) fn is_rule_file(path: &Path) -> bool {
    let yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false);
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    yaml && !hidden
}

/// State owned by the watcher callback.
pub(super) struct WatchState {
    /// Canonical file path → rule set id currently loaded from it.
    sources: HashMap<PathBuf, String>,
    /// When the loader root is a single file, only events for it count.
    only: Option<PathBuf>,
    sender: Sender<RuleSetChange>,
}

impl WatchState {
    pub(super) fn new(
        sources: HashMap<PathBuf, String>,
        only: Option<PathBuf>,
        sender: Sender<RuleSetChange>,
    ) -> Self {
        Self {
            sources,
            only,
            sender,
        }
    }

    /// Handle a single filesystem event from the notify watcher.
    pub(super) fn handle_event(&mut self, event: &Event) {
        for path in &event.paths {
            if !is_rule_file(path) {
                continue;
            }
            if let Some(only) = &self.only {
                if only != path {
                    continue;
                }
            }

            match &event.kind {
                EventKind::Create(_)
                | EventKind::Modify(ModifyKind::Data(_))
                | EventKind::Modify(ModifyKind::Name(_))
                | EventKind::Modify(ModifyKind::Any) => {
                    // Renames report both ends; the vanished end is a removal.
                    if path.exists() {
                        self.reload(path);
                    } else {
                        self.forget(path);
                    }
                }
                EventKind::Remove(_) => self.forget(path),
                _ => {}
            }
        }
    }

    fn reload(&mut self, path: &Path) {
        let ruleset = match load_ruleset_file(path) {
            Ok(ruleset) => ruleset,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse rule set during hot-reload, keeping previous version"
                );
                return;
            }
        };

        let previous = self.sources.insert(path.to_path_buf(), ruleset.id.clone());
        if let Some(old_id) = previous.filter(|old| *old != ruleset.id) {
            self.send(RuleSetChange::Remove {
                path: path.to_path_buf(),
                ruleset_id: old_id,
            });
        }

        info!(ruleset_id = %ruleset.id, path = %path.display(), "hot-reloaded rule set");
        self.send(RuleSetChange::Upsert {
            path: path.to_path_buf(),
            ruleset,
        });
    }

    fn forget(&mut self, path: &Path) {
        if let Some(ruleset_id) = self.sources.remove(path) {
            info!(ruleset_id = %ruleset_id, path = %path.display(), "rule file removed");
            self.send(RuleSetChange::Remove {
                path: path.to_path_buf(),
                ruleset_id,
            });
        }
    }

    fn send(&self, change: RuleSetChange) {
        if self.sender.send(change).is_err() {
            warn!("rule change receiver dropped; ignoring filesystem event");
        }
    }
}
