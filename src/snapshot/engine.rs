//! Snapshot capture pipeline.
//!
//! Orchestrates one `take_snapshot` pass: fingerprint the monitor topology,
//! enumerate user windows, resolve the document each window most likely has
//! open, and hand the completed snapshot to persistence. The jump-list index
//! is built once per pass and discarded with it.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use crate::config::AppPaths;
use crate::display;
use crate::platform::{DisplaySystem, RegistryView, WindowHandle, WindowSystem};
use crate::progress::{emit, Progress, ProgressSink};
use crate::resolver::handlers::HandlerCache;
use crate::resolver::jumplist::JumpListIndex;
use crate::resolver::search::SearchRoots;
use crate::resolver::{resolve_window_file, ResolvedFile, WindowFileQuery};
use crate::snapshot::models::{
    FileSource, WorkspaceEntry, WorkspaceSnapshot, EXPLORER_FOLDER_CONFIDENCE,
};
use crate::store::WorkspaceStore;
use crate::window::{self, capture_record};

/// Process names whose windows default to unchecked in the save dialog.
const PASSWORD_MANAGERS: &[&str] = &[
    "keepass",
    "keepassxc",
    "1password",
    "bitwarden",
    "lastpass",
    "dashlane",
    "keeper",
    "roboform",
    "enpass",
];

/// Title fragments marking private-browsing windows.
const PRIVATE_BROWSING_PATTERNS: &[&str] =
    &["InPrivate", "Incognito", "Private Browsing", "Private Window"];

/// The OS file browser's process name.
const EXPLORER_PROCESS: &str = "explorer";

/// Default-uncheck policy for sensitive windows. They are still enumerated;
/// only their default selection state changes.
pub fn is_excluded_by_default(process_name: &str, title: &str) -> bool {
    if PASSWORD_MANAGERS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(process_name))
    {
        return true;
    }
    let title_lc = title.to_lowercase();
    PRIVATE_BROWSING_PATTERNS
        .iter()
        .any(|p| title_lc.contains(&p.to_lowercase()))
}

/// A window offered to the save dialog.
#[derive(Debug, Clone)]
pub struct CandidateWindow {
    pub handle: WindowHandle,
    pub process_name: String,
    pub title: String,
    pub checked_by_default: bool,
}

/// One snapshot request.
pub struct SnapshotRequest<'a> {
    pub name: &'a str,
    pub save_files: bool,
    /// Handles chosen in the save dialog; `None` records every user window.
    pub selected_windows: Option<&'a HashSet<WindowHandle>>,
    pub progress: Option<&'a dyn ProgressSink>,
}

/// Orchestrates per-window capture and document resolution.
pub struct SnapshotEngine {
    windows: Arc<dyn WindowSystem>,
    displays: Arc<dyn DisplaySystem>,
    registry: Arc<dyn RegistryView>,
    handlers: Arc<HandlerCache>,
    paths: AppPaths,
    roots: SearchRoots,
}

impl SnapshotEngine {
    pub fn new(
        windows: Arc<dyn WindowSystem>,
        displays: Arc<dyn DisplaySystem>,
        registry: Arc<dyn RegistryView>,
        handlers: Arc<HandlerCache>,
        paths: AppPaths,
        roots: SearchRoots,
    ) -> Self {
        Self {
            windows,
            displays,
            registry,
            handlers,
            paths,
            roots,
        }
    }

    /// Windows offered to the save dialog, with their default check state.
    pub fn enumerate_candidates(&self) -> Vec<CandidateWindow> {
        window::list_user_windows(self.windows.as_ref())
            .into_iter()
            .map(|w| {
                let process_name = window::process_name_from_path(&w.executable_path);
                let checked_by_default = !is_excluded_by_default(&process_name, &w.title);
                CandidateWindow {
                    handle: w.handle,
                    process_name,
                    title: w.title,
                    checked_by_default,
                }
            })
            .collect()
    }

    /// Capture a snapshot and hand it to persistence.
    pub fn take_snapshot(
        &self,
        store: &WorkspaceStore,
        request: SnapshotRequest<'_>,
    ) -> Result<WorkspaceSnapshot> {
        let fingerprint = display::fingerprint::compute(self.displays.as_ref());
        let monitors = display::enumerate(self.displays.as_ref());

        let mut captured = window::list_user_windows(self.windows.as_ref());
        if let Some(selected) = request.selected_windows {
            captured.retain(|w| selected.contains(&w.handle));
        }

        let mut index = if request.save_files {
            emit(request.progress, Progress::IndexingRecentFiles);
            Some(JumpListIndex::build(
                self.paths.recent_destinations_dir(),
                self.registry.as_ref(),
                &self.handlers,
            ))
        } else {
            None
        };

        let total = captured.len();
        let mut entries = Vec::with_capacity(total);
        for (i, raw) in captured.iter().enumerate() {
            let process_name = window::process_name_from_path(&raw.executable_path);
            emit(
                request.progress,
                Progress::Window {
                    current: i + 1,
                    total,
                    process_name: process_name.clone(),
                    title: raw.title.clone(),
                },
            );

            let Some(mut record) = capture_record(self.windows.as_ref(), raw) else {
                log::warn!("placement capture failed for '{}'", raw.title);
                continue;
            };
            let assignment =
                display::assignment_for_window(self.windows.as_ref(), raw.handle, &monitors);
            record.monitor_id = assignment.monitor_id.clone();
            record.monitor_index = assignment.monitor_index;
            record.monitor_name = assignment.monitor_name.clone();

            if process_name == EXPLORER_PROCESS {
                record.explorer_folder = self.windows.explorer_folder(raw.handle);
            }

            let resolved = self.resolve_entry_file(&process_name, raw, &record, index.as_mut());

            let mut entry = WorkspaceEntry::from_record(record);
            entry.launch_arg = resolved
                .is_launchable()
                .then(|| resolved.path.clone())
                .flatten();
            entry.file_path = resolved.path;
            entry.file_confidence = resolved.confidence;
            entry.file_source = resolved.source;
            promote_workspace_folder(&mut entry);
            entries.push(entry);
        }

        let mut snapshot = WorkspaceSnapshot {
            name: request.name.to_string(),
            monitor_fingerprint: fingerprint.clone(),
            saved_at: Utc::now(),
            saved_with_files: request.save_files,
            monitors,
            entries,
        };
        snapshot.normalize();

        emit(request.progress, Progress::Saving);
        store.save(&snapshot)?;
        store.write_last_fingerprint(&fingerprint);
        Ok(snapshot)
    }

    fn resolve_entry_file(
        &self,
        process_name: &str,
        raw: &crate::platform::RawWindow,
        record: &crate::snapshot::models::WindowRecord,
        index: Option<&mut JumpListIndex>,
    ) -> ResolvedFile {
        // File-browser windows skip the tiers entirely.
        if process_name == EXPLORER_PROCESS {
            if let Some(folder) = &record.explorer_folder {
                return ResolvedFile {
                    path: Some(folder.clone()),
                    confidence: EXPLORER_FOLDER_CONFIDENCE,
                    source: FileSource::ExplorerFolder,
                };
            }
        }
        let Some(index) = index else {
            return ResolvedFile::none();
        };
        resolve_window_file(
            WindowFileQuery {
                process_name,
                executable_path: &raw.executable_path,
                title: &raw.title,
            },
            index,
            &self.roots,
        )
    }
}

/// Electron-based code editors open a directory, not a file. Promote their
/// launch argument: directories and `.code-workspace` manifests are kept,
/// any other file is replaced by its containing directory.
fn promote_workspace_folder(entry: &mut WorkspaceEntry) {
    let is_code_editor = entry.process_name.eq_ignore_ascii_case("code")
        || entry.process_name.eq_ignore_ascii_case("cursor");
    if !is_code_editor {
        return;
    }
    let Some(arg) = entry.launch_arg.clone() else {
        return;
    };
    let path = Path::new(&arg);
    if path.is_dir() {
        return;
    }
    if !path.is_file() {
        return;
    }
    if path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("code-workspace"))
        .unwrap_or(false)
    {
        return;
    }
    if let Some(parent) = path.parent() {
        entry.launch_arg = Some(parent.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::models::WindowRecord;
    use crate::window::placement::ShowCommand;

    fn entry_for(process: &str, arg: Option<&str>) -> WorkspaceEntry {
        let record = WindowRecord {
            executable_path: format!("C:\\apps\\{}.exe", process),
            process_name: process.to_string(),
            window_class_name: "Chrome_WidgetWin_1".into(),
            title_snippet: "t".into(),
            show_command: ShowCommand::Normal,
            left: 0,
            top: 0,
            right: 800,
            bottom: 600,
            dpi: 96,
            explorer_folder: None,
            monitor_id: String::new(),
            monitor_index: 0,
            monitor_name: String::new(),
        };
        let mut entry = WorkspaceEntry::from_record(record);
        entry.launch_arg = arg.map(|s| s.to_string());
        entry.file_confidence = if arg.is_some() { 90 } else { 0 };
        entry
    }

    #[test]
    fn test_smart_exclusion_password_managers() {
        assert!(is_excluded_by_default("keepassxc", "database.kdbx"));
        assert!(is_excluded_by_default("1password", "Vault"));
        assert!(!is_excluded_by_default("notepad", "notes.txt - Notepad"));
    }

    #[test]
    fn test_smart_exclusion_private_browsing() {
        assert!(is_excluded_by_default(
            "msedge",
            "stuff - [InPrivate] - Microsoft Edge"
        ));
        assert!(is_excluded_by_default("chrome", "site - Incognito"));
        assert!(is_excluded_by_default("firefox", "x - Private Browsing"));
        assert!(!is_excluded_by_default("chrome", "docs - Google Chrome"));
    }

    #[test]
    fn test_promotion_keeps_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().to_str().unwrap().to_string();
        let mut entry = entry_for("code", Some(&dir));
        promote_workspace_folder(&mut entry);
        assert_eq!(entry.launch_arg.as_deref(), Some(dir.as_str()));
    }

    #[test]
    fn test_promotion_keeps_workspace_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = temp.path().join("proj.code-workspace");
        std::fs::write(&manifest, "{}").unwrap();
        let mut entry = entry_for("code", manifest.to_str());
        promote_workspace_folder(&mut entry);
        assert_eq!(entry.launch_arg.as_deref(), manifest.to_str());
    }

    #[test]
    fn test_promotion_replaces_file_with_parent() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("main.rs");
        std::fs::write(&file, "fn main() {}").unwrap();
        let mut entry = entry_for("cursor", file.to_str());
        promote_workspace_folder(&mut entry);
        assert_eq!(
            entry.launch_arg.as_deref(),
            temp.path().to_str(),
            "plain files are replaced by their directory"
        );
    }

    #[test]
    fn test_promotion_ignores_other_processes() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("doc.docx");
        std::fs::write(&file, "x").unwrap();
        let mut entry = entry_for("winword", file.to_str());
        promote_workspace_folder(&mut entry);
        assert_eq!(entry.launch_arg.as_deref(), file.to_str());
    }

    #[test]
    fn test_promotion_leaves_missing_paths_alone() {
        let mut entry = entry_for("code", Some("C:\\gone\\file.rs"));
        promote_workspace_folder(&mut entry);
        assert_eq!(entry.launch_arg.as_deref(), Some("C:\\gone\\file.rs"));
    }
}
