//! One-time migration of legacy profiles.
//!
//! Versions before the workspace format kept one `*.profile.json` per
//! monitor configuration under `profiles/`. On first run those are converted
//! into workspace snapshots (no file tracking, no monitor descriptors), then
//! a zero-byte sentinel marks the migration done so later launches skip it.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::snapshot::models::{WindowRecord, WorkspaceEntry, WorkspaceSnapshot};
use crate::store::WorkspaceStore;

/// What the migration pass did.
#[derive(Debug, Default, Clone, Copy)]
pub struct MigrationReport {
    pub migrated: usize,
    pub skipped: bool,
}

/// Pre-v2 profile file shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProfile {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    fingerprint: String,
    #[serde(default)]
    last_saved_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    windows: Vec<WindowRecord>,
}

/// Convert legacy profiles into snapshots, once.
///
/// Individual profile failures are logged and skipped; the sentinel is
/// written after the conversion pass so subsequent launches do nothing.
pub fn run_if_needed(store: &WorkspaceStore) -> MigrationReport {
    let sentinel = store.paths().migration_sentinel();
    if sentinel.exists() {
        return MigrationReport {
            migrated: 0,
            skipped: true,
        };
    }
    let profiles_dir = store.paths().legacy_profiles_dir();
    if !profiles_dir.is_dir() {
        return MigrationReport::default();
    }

    let mut migrated = 0;
    let entries = match std::fs::read_dir(&profiles_dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("legacy profile dir unreadable: {}", err);
            return MigrationReport::default();
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_profile = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with(".profile.json"))
            .unwrap_or(false);
        if !is_profile {
            continue;
        }
        match migrate_one(store, &path) {
            Ok(()) => migrated += 1,
            Err(err) => log::warn!("skipping legacy profile {}: {}", path.display(), err),
        }
    }

    if let Err(err) = std::fs::write(&sentinel, b"") {
        log::warn!("writing migration sentinel failed: {}", err);
    }
    MigrationReport {
        migrated,
        skipped: false,
    }
}

fn migrate_one(store: &WorkspaceStore, path: &std::path::Path) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(path)?;
    let profile: LegacyProfile = serde_json::from_str(&contents)?;
    let mut snapshot = convert_profile(profile);

    // Two legacy profiles can share a display name; keep both.
    if store.exists(&snapshot.name) {
        let prefix: String = snapshot.monitor_fingerprint.chars().take(6).collect();
        snapshot.name = format!("{} {}", snapshot.name, prefix);
    }
    store.save(&snapshot)?;
    Ok(())
}

fn convert_profile(profile: LegacyProfile) -> WorkspaceSnapshot {
    let name = match profile.display_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            let prefix: String = profile.fingerprint.chars().take(6).collect();
            format!("Monitor Config {}", prefix)
        }
    };
    WorkspaceSnapshot {
        name,
        monitor_fingerprint: profile.fingerprint,
        saved_at: profile.last_saved_utc.unwrap_or_else(Utc::now),
        saved_with_files: false,
        monitors: Vec::new(),
        entries: profile
            .windows
            .into_iter()
            .map(WorkspaceEntry::from_record)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppPaths;

    fn legacy_profile_json(display_name: Option<&str>, fingerprint: &str) -> String {
        let name = match display_name {
            Some(n) => format!("\"displayName\": \"{}\",", n),
            None => String::new(),
        };
        format!(
            r#"{{
                {}
                "fingerprint": "{}",
                "lastSavedUtc": "2025-11-02T09:00:00Z",
                "windows": [
                    {{
                        "executablePath": "C:\\Windows\\System32\\notepad.exe",
                        "processName": "notepad",
                        "windowClassName": "Notepad",
                        "titleSnippet": "old - Notepad",
                        "showCommand": "NORMAL",
                        "left": 10, "top": 10, "right": 510, "bottom": 410,
                        "dpi": 96
                    }}
                ]
            }}"#,
            name, fingerprint
        )
    }

    fn fresh_store() -> (tempfile::TempDir, WorkspaceStore) {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = AppPaths::with_data_dir(temp.path().join("anchor"));
        paths.ensure_dirs().unwrap();
        (temp, WorkspaceStore::open(paths).unwrap())
    }

    fn write_profile(store: &WorkspaceStore, file: &str, json: &str) {
        let dir = store.paths().legacy_profiles_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), json).unwrap();
    }

    #[test]
    fn test_migration_converts_profiles() {
        let (_temp, store) = fresh_store();
        write_profile(
            &store,
            "one.profile.json",
            &legacy_profile_json(Some("Docked"), "aabbccddeeff0011"),
        );
        write_profile(
            &store,
            "two.profile.json",
            &legacy_profile_json(None, "1122334455667788"),
        );

        let report = run_if_needed(&store);
        assert_eq!(report.migrated, 2);
        assert!(!report.skipped);
        assert!(store.paths().migration_sentinel().exists());

        let docked = store.load("Docked").unwrap();
        assert_eq!(docked.monitor_fingerprint, "aabbccddeeff0011");
        assert!(!docked.saved_with_files);
        assert!(docked.monitors.is_empty());
        assert_eq!(docked.entries.len(), 1);
        assert_eq!(docked.entries[0].process_name, "notepad");
        assert_eq!(docked.entries[0].file_confidence, 0);

        let unnamed = store.load("Monitor Config 112233").unwrap();
        assert_eq!(unnamed.saved_at.to_rfc3339(), "2025-11-02T09:00:00+00:00");
    }

    #[test]
    fn test_migration_is_idempotent() {
        let (_temp, store) = fresh_store();
        write_profile(
            &store,
            "one.profile.json",
            &legacy_profile_json(Some("Docked"), "aabbccddeeff0011"),
        );

        let first = run_if_needed(&store);
        assert_eq!(first.migrated, 1);
        let before = std::fs::read_to_string(
            store.paths().workspaces_dir().join("Docked.workspace.json"),
        )
        .unwrap();

        let second = run_if_needed(&store);
        assert_eq!(second.migrated, 0);
        assert!(second.skipped);
        let after = std::fs::read_to_string(
            store.paths().workspaces_dir().join("Docked.workspace.json"),
        )
        .unwrap();
        assert_eq!(before, after, "second run must not rewrite snapshots");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_corrupt_profile_skipped_others_migrate() {
        let (_temp, store) = fresh_store();
        write_profile(&store, "bad.profile.json", "{ definitely not json");
        write_profile(
            &store,
            "good.profile.json",
            &legacy_profile_json(Some("Desk"), "ffff000011112222"),
        );

        let report = run_if_needed(&store);
        assert_eq!(report.migrated, 1);
        assert!(store.exists("Desk"));
    }

    #[test]
    fn test_duplicate_display_names_keep_both() {
        let (_temp, store) = fresh_store();
        write_profile(
            &store,
            "a.profile.json",
            &legacy_profile_json(Some("Desk"), "aaaa000011112222"),
        );
        write_profile(
            &store,
            "b.profile.json",
            &legacy_profile_json(Some("Desk"), "bbbb000011112222"),
        );

        let report = run_if_needed(&store);
        assert_eq!(report.migrated, 2);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_no_profiles_dir_writes_no_sentinel() {
        let (_temp, store) = fresh_store();
        let report = run_if_needed(&store);
        assert_eq!(report.migrated, 0);
        assert!(!store.paths().migration_sentinel().exists());
    }
}
