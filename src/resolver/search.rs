//! Filesystem search for bare file names (Tier 3).
//!
//! Looks for a file by name under the user's document folders and OneDrive
//! roots. The walk tolerates unreadable directories and cloud-only
//! placeholders: a failed subtree is skipped, its siblings continue. Only an
//! unambiguous single hit is ever returned.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Root directories Tier 3 is allowed to search.
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
    roots: Vec<PathBuf>,
}

impl SearchRoots {
    /// The user's Documents, Desktop, Downloads, and any OneDrive roots.
    pub fn discover() -> Self {
        let mut roots = Vec::new();
        for dir in [dirs::document_dir(), dirs::desktop_dir(), dirs::download_dir()]
            .into_iter()
            .flatten()
        {
            roots.push(dir);
        }
        // Personal, consumer, and commercial OneDrive roots, when present.
        for var in ["OneDrive", "OneDriveConsumer", "OneDriveCommercial"] {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    roots.push(PathBuf::from(value));
                }
            }
        }
        roots.dedup();
        Self { roots }
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Search all roots for a file with the given name, case-insensitively.
///
/// Returns the path only when exactly one match exists; zero or several
/// matches are ambiguous and yield `None` rather than a guess.
pub fn find_unique_file(roots: &SearchRoots, file_name: &str) -> Option<PathBuf> {
    let wanted = file_name.to_lowercase();
    let mut found: Option<PathBuf> = None;

    for root in &roots.roots {
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .map(|n| n.to_lowercase() == wanted)
                .unwrap_or(false);
            if !matches {
                continue;
            }
            let path = entry.path().to_path_buf();
            match &found {
                None => found = Some(path),
                Some(existing) if same_file(existing, &path) => {}
                Some(_) => {
                    log::info!("file search for '{}' is ambiguous", file_name);
                    return None;
                }
            }
        }
    }
    found
}

/// Two hits on the same physical file (overlapping roots) are not ambiguous.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => a == b,
    }
}
