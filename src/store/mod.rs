//! Workspace persistence.
//!
//! One JSON file per workspace under `workspaces/`, written atomically via
//! temp-file + rename but otherwise cache-free: every read parses from disk,
//! every write replaces the whole file. Construction runs the one-time
//! legacy-profile migration.

pub mod migration;

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AppPaths;
use crate::snapshot::models::WorkspaceSnapshot;

/// File suffix for persisted workspaces.
const WORKSPACE_SUFFIX: &str = ".workspace.json";

/// Characters not allowed in workspace file names. Each is collapsed away.
const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip forbidden-in-filename characters from a workspace name.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN_NAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').to_string();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Disk store for workspace snapshots.
pub struct WorkspaceStore {
    paths: AppPaths,
}

impl WorkspaceStore {
    /// Open the store: ensure the directory layout exists and run the
    /// sentinel-guarded legacy migration once.
    pub fn open(paths: AppPaths) -> Result<Self> {
        paths
            .ensure_dirs()
            .with_context(|| format!("creating data directory {}", paths.data_dir().display()))?;
        let store = Self { paths };
        let report = migration::run_if_needed(&store);
        if report.migrated > 0 {
            log::info!("migrated {} legacy profile(s)", report.migrated);
        }
        Ok(store)
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    fn workspace_file(&self, name: &str) -> PathBuf {
        self.paths
            .workspaces_dir()
            .join(format!("{}{}", sanitize_name(name), WORKSPACE_SUFFIX))
    }

    /// Whether a workspace with this (sanitized) name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.workspace_file(name).is_file()
    }

    /// Write a snapshot, replacing any previous file of the same name.
    pub fn save(&self, snapshot: &WorkspaceSnapshot) -> Result<PathBuf> {
        let path = self.workspace_file(&snapshot.name);
        let json = serde_json::to_string_pretty(snapshot).context("serializing workspace")?;
        atomic_write(&path, &json)
            .with_context(|| format!("writing workspace {}", path.display()))?;
        Ok(path)
    }

    /// Load one workspace by name.
    pub fn load(&self, name: &str) -> Result<WorkspaceSnapshot> {
        let path = self.workspace_file(name);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading workspace {}", path.display()))?;
        let mut snapshot: WorkspaceSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("parsing workspace {}", path.display()))?;
        snapshot.normalize();
        Ok(snapshot)
    }

    /// All workspaces on disk, sorted by name. Corrupt files are logged and
    /// skipped.
    pub fn list(&self) -> Vec<WorkspaceSnapshot> {
        let mut out = Vec::new();
        let Ok(entries) = fs::read_dir(self.paths.workspaces_dir()) else {
            return out;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_workspace = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(WORKSPACE_SUFFIX))
                .unwrap_or(false);
            if !is_workspace {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|c| serde_json::from_str::<WorkspaceSnapshot>(&c).map_err(Into::into))
            {
                Ok(mut snapshot) => {
                    snapshot.normalize();
                    out.push(snapshot);
                }
                Err(err) => {
                    log::warn!("skipping unreadable workspace {}: {}", path.display(), err);
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Delete a workspace by name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.workspace_file(name);
        fs::remove_file(&path)
            .with_context(|| format!("deleting workspace {}", path.display()))?;
        Ok(())
    }

    /// Rename a workspace: rewrite under the new name, remove the old file.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut snapshot = self.load(old_name)?;
        snapshot.name = new_name.to_string();
        self.save(&snapshot)?;
        if sanitize_name(old_name) != sanitize_name(new_name) {
            self.delete(old_name)?;
        }
        Ok(())
    }

    /// Fingerprint last seen by save or restore, if recorded.
    pub fn read_last_fingerprint(&self) -> Option<String> {
        let contents = fs::read_to_string(self.paths.last_fingerprint_file()).ok()?;
        let trimmed = contents.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Record the fingerprint last seen. Best effort; failures are logged.
    pub fn write_last_fingerprint(&self, fingerprint: &str) {
        let path = self.paths.last_fingerprint_file();
        if let Err(err) = fs::write(&path, fingerprint) {
            log::warn!("writing {} failed: {}", path.display(), err);
        }
    }

    /// Opaque settings blob owned by the settings UI.
    pub fn read_settings(&self) -> serde_json::Value {
        fs::read_to_string(self.paths.settings_file())
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or(serde_json::Value::Null)
    }

    pub fn write_settings(&self, settings: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_string_pretty(settings).context("serializing settings")?;
        atomic_write(&self.paths.settings_file(), &json).context("writing settings")
    }
}

/// Atomically replace a file's contents via write-to-temp + rename.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("invalid path: {}", path.display()))?;
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        std::process::id()
    ));
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store() -> (tempfile::TempDir, WorkspaceStore) {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = AppPaths::with_data_dir(temp.path().join("anchor"));
        let store = WorkspaceStore::open(paths).unwrap();
        (temp, store)
    }

    fn snapshot(name: &str) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            name: name.to_string(),
            monitor_fingerprint: "a1b2c3d4e5f60718".into(),
            saved_at: Utc::now(),
            saved_with_files: false,
            monitors: vec![],
            entries: vec![],
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Home Office"), "Home Office");
        assert_eq!(sanitize_name("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_name("  dots... "), "dots");
        assert_eq!(sanitize_name("///"), "unnamed");
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_temp, store) = store();
        let snap = snapshot("Desk Setup");
        let path = store.save(&snap).unwrap();
        assert!(path.ends_with("Desk Setup.workspace.json"));

        let loaded = store.load("Desk Setup").unwrap();
        assert_eq!(loaded.name, "Desk Setup");
        assert_eq!(loaded.monitor_fingerprint, snap.monitor_fingerprint);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let (_temp, store) = store();
        let mut snap = snapshot("dup");
        store.save(&snap).unwrap();
        snap.monitor_fingerprint = "ffffffffffffffff".into();
        store.save(&snap).unwrap();

        assert_eq!(store.list().len(), 1);
        assert_eq!(
            store.load("dup").unwrap().monitor_fingerprint,
            "ffffffffffffffff"
        );
    }

    #[test]
    fn test_list_skips_corrupt_files() {
        let (_temp, store) = store();
        store.save(&snapshot("good")).unwrap();
        fs::write(
            store.paths.workspaces_dir().join("bad.workspace.json"),
            "{ nope",
        )
        .unwrap();

        let all = store.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "good");
    }

    #[test]
    fn test_delete_and_rename() {
        let (_temp, store) = store();
        store.save(&snapshot("old")).unwrap();
        store.rename("old", "new").unwrap();
        assert!(!store.exists("old"));
        assert_eq!(store.load("new").unwrap().name, "new");

        store.delete("new").unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_last_fingerprint_round_trip() {
        let (_temp, store) = store();
        assert_eq!(store.read_last_fingerprint(), None);
        store.write_last_fingerprint("a1b2c3d4e5f60718");
        assert_eq!(
            store.read_last_fingerprint().as_deref(),
            Some("a1b2c3d4e5f60718")
        );
    }

    #[test]
    fn test_last_fingerprint_is_trimmed() {
        let (_temp, store) = store();
        fs::write(
            store.paths.last_fingerprint_file(),
            "  a1b2c3d4e5f60718\n",
        )
        .unwrap();
        assert_eq!(
            store.read_last_fingerprint().as_deref(),
            Some("a1b2c3d4e5f60718")
        );
    }

    #[test]
    fn test_no_temp_files_left_after_save() {
        let (_temp, store) = store();
        store.save(&snapshot("clean")).unwrap();
        let leftovers: Vec<_> = fs::read_dir(store.paths.workspaces_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_settings_blob_round_trip() {
        let (_temp, store) = store();
        assert_eq!(store.read_settings(), serde_json::Value::Null);
        let value = serde_json::json!({"defaultWorkspace": "desk"});
        store.write_settings(&value).unwrap();
        assert_eq!(store.read_settings(), value);
    }
}
