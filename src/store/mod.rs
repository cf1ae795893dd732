//! Durable process storage
//!
//! A process is a named, ordered action sequence. The store owns the full
//! name → sequence map for the lifetime of the hosting process and persists
//! it as a single JSON document: every save rewrites the whole document, so
//! memory and disk stay consistent after each save (external edits to the
//! file are not picked up until the next load).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use colored::Colorize;
use thiserror::Error;

use crate::action::Action;

/// The persisted map of all known processes.
///
/// Names are kept in a `BTreeMap` so iteration order, and therefore the
/// matcher's tie-break, is deterministic.
pub type ProcessMap = BTreeMap<String, Vec<Action>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize process store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct ProcessStore {
    path: PathBuf,
    processes: ProcessMap,
}

impl ProcessStore {
    /// Load the store from `path`.
    ///
    /// A missing file is the normal first-run state and yields an empty map.
    /// An unreadable or malformed file also yields an empty map, with a
    /// diagnostic; refusing to start over a corrupt store would leave the
    /// tool unusable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let processes = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<ProcessMap>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    println!(
                        "{} Process file {} is not valid, starting empty: {}",
                        "⚠".yellow(),
                        path.display(),
                        e
                    );
                    ProcessMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProcessMap::new(),
            Err(e) => {
                println!(
                    "{} Could not read {}, starting empty: {}",
                    "⚠".yellow(),
                    path.display(),
                    e
                );
                ProcessMap::new()
            }
        };

        log::debug!(
            "loaded {} process(es) from {}",
            processes.len(),
            path.display()
        );
        Self { path, processes }
    }

    pub fn processes(&self) -> &ProcessMap {
        &self.processes
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Store `actions` under `name`, replacing any existing sequence
    /// wholesale, then flush the full document to disk.
    ///
    /// On a write failure the in-memory entry is kept, so the caller may fix
    /// the underlying problem and retry the save.
    pub fn save(&mut self, name: &str, actions: Vec<Action>) -> Result<(), StoreError> {
        self.processes.insert(name.to_string(), actions);
        self.flush()
    }

    /// Atomically rewrite the backing document: write a sibling temp file,
    /// then rename it over the target so readers never observe a torn file.
    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.processes)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.to_path_buf(),
            source,
        })?;

        log::debug!("flushed {} process(es) to {}", self.processes.len(), self.path.display());
        Ok(())
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use uuid::Uuid;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir().join(format!("flowpilot-test-{}.json", Uuid::new_v4()))
    }

    fn sample_actions() -> Vec<Action> {
        vec![
            Action::navigate("https://example.com"),
            Action::click("//*[@id=\"go\"]", "Go", "btn", "go"),
            Action::input("//input[1]", "hello"),
        ]
    }

    #[test]
    fn test_missing_file_yields_empty_map() {
        let store = ProcessStore::load(temp_store_path());
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_reload_round_trips() {
        let path = temp_store_path();
        let actions = sample_actions();

        let mut store = ProcessStore::load(&path);
        store.save("demo", actions.clone()).unwrap();

        let reloaded = ProcessStore::load(&path);
        assert_eq!(reloaded.processes().get("demo"), Some(&actions));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_overwrite_keeps_only_latest_sequence() {
        let path = temp_store_path();

        let mut store = ProcessStore::load(&path);
        store.save("demo", sample_actions()).unwrap();
        let second = vec![Action::navigate("https://example.org")];
        store.save("demo", second.clone()).unwrap();

        let reloaded = ProcessStore::load(&path);
        assert_eq!(reloaded.processes().len(), 1);
        assert_eq!(reloaded.processes().get("demo"), Some(&second));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let path = temp_store_path();
        std::fs::write(&path, "not json {{").unwrap();

        let store = ProcessStore::load(&path);
        assert!(store.is_empty());

        std::fs::remove_file(&path).ok();
    }
}
