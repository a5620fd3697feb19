//! Core [`RuleSetLoader`]: filesystem-backed rule set loading with optional hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::error::{Result, RuleError};
use crate::model::RuleSet;
use crate::schema::RuleSetDocument;

use super::report::{LoadResult, LoadStatus};
use super::watcher::{is_rule_file, RuleSetChange, WatchState};

/// Parse and validate one YAML rule set document.
///
/// Nothing is returned unless the whole document is valid.
pub fn parse_ruleset(yaml: &str) -> Result<RuleSet> {
    let doc: RuleSetDocument = serde_yaml::from_str(yaml)?;
    RuleSet::from_document(&doc)
}

/// Read, parse, and validate a single rule set file.
pub fn load_ruleset_file(path: &Path) -> Result<RuleSet> {
    let contents = fs::read_to_string(path)?;
    parse_ruleset(&contents)
}

/// Filesystem-backed rule set loader.
///
/// Tracks which file each rule set came from so that deletions seen by the
/// watcher can be mapped back to a rule set id.
pub struct RuleSetLoader {
    /// A rule file, or a directory scanned recursively.
    root: PathBuf,
    /// Canonical file path → rule set id, for every successfully loaded file.
    sources: HashMap<PathBuf, String>,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl RuleSetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sources: HashMap::new(),
            _watcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a loaded rule set came from.
    pub fn source_of(&self, ruleset_id: &str) -> Option<&Path> {
        self.sources
            .iter()
            .find(|(_, id)| id.as_str() == ruleset_id)
            .map(|(path, _)| path.as_path())
    }

    /// Load the root file, or every rule file under the root directory.
    ///
    /// A missing root is an error. Inside a directory, dotfiles and non-YAML
    /// files are skipped and a bad file is reported without aborting the scan.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        let root = fs::canonicalize(&self.root)?;
        let mut results = Vec::new();

        if root.is_file() {
            self.load_one(root, &mut results);
        } else {
            self.scan_dir_recursive(&root, &mut results)?;
        }

        Ok(results)
    }

    fn scan_dir_recursive(&mut self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Directory order is platform-dependent; sort so registration order is stable.
        entries.sort();

        for path in entries {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false);

            if path.is_dir() {
                if !hidden {
                    self.scan_dir_recursive(&path, results)?;
                }
                continue;
            }

            if hidden {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "dotfile".to_string(),
                    },
                });
                continue;
            }

            if !is_rule_file(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            self.load_one(path, results);
        }

        Ok(())
    }

    fn load_one(&mut self, path: PathBuf, results: &mut Vec<LoadResult>) {
        match load_ruleset_file(&path) {
            Ok(ruleset) => {
                info!(
                    ruleset_id = %ruleset.id,
                    rules = ruleset.len(),
                    path = %path.display(),
                    "loaded rule set"
                );
                self.sources.insert(path.clone(), ruleset.id.clone());
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Loaded { ruleset },
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load rule file");
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Failed {
                        error: e.to_string(),
                    },
                });
            }
        }
    }

    /// Start a filesystem watcher that sends a [`RuleSetChange`] for every
    /// rule file created, modified, or deleted under the root.
    ///
    /// Parse errors are logged and produce no message, so the receiver keeps
    /// the previous version of the rule set.
    pub fn watch(&mut self, sender: Sender<RuleSetChange>) -> Result<()> {
        let root = fs::canonicalize(&self.root)?;
        let (target, mode, only) = if root.is_file() {
            let parent = root
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| RuleError::Validation(format!("cannot watch '{}'", root.display())))?;
            (parent, RecursiveMode::NonRecursive, Some(root.clone()))
        } else {
            (root.clone(), RecursiveMode::Recursive, None)
        };

        let mut state = WatchState::new(self.sources.clone(), only, sender);
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => state.handle_event(&event),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;
        watcher.watch(&target, mode)?;

        info!(path = %root.display(), "watching rules for changes");
        self._watcher = Some(watcher);
        Ok(())
    }

    /// Atomically write a rule set to `<root>/<id>.yml`.
    ///
    /// Writes to a dot-prefixed `.tmp` file first, then renames it into place.
    /// Requires a directory root.
    pub fn write_ruleset(&mut self, ruleset: &RuleSet) -> Result<PathBuf> {
        if !self.root.is_dir() {
            return Err(RuleError::Validation(format!(
                "cannot write rule set '{}': '{}' is not a directory",
                ruleset.id,
                self.root.display()
            )));
        }

        let root = fs::canonicalize(&self.root)?;
        let final_path = root.join(format!("{}.yml", ruleset.id));
        let tmp_path = root.join(format!(".{}.tmp", ruleset.id));

        let yaml = serde_yaml::to_string(&ruleset.to_document())?;
        fs::write(&tmp_path, yaml)?;
        fs::rename(&tmp_path, &final_path)?;

        info!(ruleset_id = %ruleset.id, path = %final_path.display(), "wrote rule set file");
        self.sources.insert(final_path.clone(), ruleset.id.clone());
        Ok(final_path)
    }
}
