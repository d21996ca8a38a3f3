//! Entry-to-window matching.
//!
//! Three tiers, tried per entry in persisted order: document-aware, then
//! executable + class, then executable + title prefix. A live handle is
//! consumed by at most one entry, and an entry is never matched twice across
//! the passes of a single restore.

use std::collections::HashSet;
use std::path::Path;

use crate::platform::{RawWindow, WindowHandle};
use crate::snapshot::models::WorkspaceEntry;

/// Length of the saved-title prefix used by the weakest tier.
pub const TITLE_PREFIX_BYTES: usize = 10;

/// A live window reduced to the attributes matching needs.
#[derive(Debug, Clone)]
pub struct LiveWindow {
    pub handle: WindowHandle,
    pub executable_path: String,
    pub class_name: String,
    pub title: String,
}

impl LiveWindow {
    pub fn from_raw(raw: &RawWindow) -> Self {
        Self {
            handle: raw.handle,
            executable_path: raw.executable_path.clone(),
            class_name: raw.class_name.clone(),
            title: raw.title.clone(),
        }
    }
}

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    DocumentAware,
    ExeAndClass,
    ExeAndTitlePrefix,
    /// Fallback for entries whose executable path was unreadable at capture.
    ClassAndTitlePrefix,
}

/// Cross-pass bookkeeping for one restore run.
#[derive(Debug, Default)]
pub struct MatchState {
    /// Entry indices already assigned a window.
    pub restored: HashSet<usize>,
    /// Live handles already consumed.
    pub used_handles: HashSet<WindowHandle>,
    /// Entries whose document-aware match confirmed the right document.
    pub doc_matched: HashSet<usize>,
}

/// Run one matching pass. Returns `(entry_index, handle)` pairs matched in
/// this pass; the state is updated as matches are claimed.
pub fn run_pass(
    entries: &[WorkspaceEntry],
    live: &[LiveWindow],
    state: &mut MatchState,
) -> Vec<(usize, WindowHandle)> {
    let mut matched = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if state.restored.contains(&index) {
            continue;
        }
        let Some((handle, kind)) = find_match(entry, live, &state.used_handles) else {
            continue;
        };
        state.restored.insert(index);
        state.used_handles.insert(handle);
        if kind == MatchKind::DocumentAware {
            state.doc_matched.insert(index);
        }
        matched.push((index, handle));
    }
    matched
}

/// Whether some live window, consumed or not, has this entry's document
/// open. Used by the launch phase to avoid re-opening documents.
pub fn document_open_anywhere(entry: &WorkspaceEntry, live: &[LiveWindow]) -> bool {
    live.iter().any(|w| document_matches(entry, w))
}

fn find_match(
    entry: &WorkspaceEntry,
    live: &[LiveWindow],
    used: &HashSet<WindowHandle>,
) -> Option<(WindowHandle, MatchKind)> {
    let available = || live.iter().filter(|w| !used.contains(&w.handle));

    if entry.executable_path.is_empty() {
        // Unreadable executable path at capture time: class + title only.
        let prefix = title_prefix(&entry.position.title_snippet);
        if prefix.is_empty() {
            return None;
        }
        return available()
            .find(|w| {
                w.class_name.eq_ignore_ascii_case(&entry.window_class_name)
                    && w.title.to_lowercase().starts_with(&prefix)
            })
            .map(|w| (w.handle, MatchKind::ClassAndTitlePrefix));
    }

    if entry.launch_arg.is_some() {
        if let Some(w) = available().find(|w| document_matches(entry, w)) {
            return Some((w.handle, MatchKind::DocumentAware));
        }
    }

    if let Some(w) = available().find(|w| {
        paths_equal(&w.executable_path, &entry.executable_path)
            && w.class_name.eq_ignore_ascii_case(&entry.window_class_name)
    }) {
        return Some((w.handle, MatchKind::ExeAndClass));
    }

    let prefix = title_prefix(&entry.position.title_snippet);
    if !prefix.is_empty() {
        if let Some(w) = available().find(|w| {
            paths_equal(&w.executable_path, &entry.executable_path)
                && w.title.to_lowercase().starts_with(&prefix)
        }) {
            return Some((w.handle, MatchKind::ExeAndTitlePrefix));
        }
    }
    None
}

fn document_matches(entry: &WorkspaceEntry, window: &LiveWindow) -> bool {
    let Some(arg) = &entry.launch_arg else {
        return false;
    };
    if !paths_equal(&window.executable_path, &entry.executable_path) {
        return false;
    }
    let stem = file_stem_lc(arg);
    !stem.is_empty() && window.title.to_lowercase().contains(&stem)
}

fn paths_equal(a: &str, b: &str) -> bool {
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

fn file_stem_lc(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// First bytes of the saved title, lowercased, cut on a char boundary.
fn title_prefix(snippet: &str) -> String {
    let mut end = TITLE_PREFIX_BYTES.min(snippet.len());
    while end > 0 && !snippet.is_char_boundary(end) {
        end -= 1;
    }
    snippet[..end].to_lowercase()
}
