//! Document detection for captured windows.
//!
//! A three-tier pipeline with explicit confidence scoring. Tiers
//! short-circuit as soon as confidence reaches the launch threshold:
//!
//! 1. Title parsing against a per-application regex registry.
//! 1.5. Exact file-name lookup in the owning application's jump list.
//! 2. Jump-list inference: recent documents whose name appears in the title.
//! 3. Filesystem search across the user's document folders.
//!
//! Comparisons are plain lowercase; accented variants of the same name are
//! treated as distinct (known limitation).

pub mod appid;
pub mod handlers;
pub mod jumplist;
pub mod search;
pub mod shell_link;
pub mod title_rules;

use std::path::Path;

use crate::snapshot::models::{FileSource, LAUNCH_CONFIDENCE_THRESHOLD};

use jumplist::JumpListIndex;
use search::SearchRoots;
use title_rules::TitleCapture;

/// Candidate pool for the exact-filename jump-list scan.
pub const JUMPLIST_EXACT_POOL: usize = 50;
/// Candidate pool for jump-list title inference.
pub const JUMPLIST_INFER_POOL: usize = 30;
/// Candidate pool for the recent-files diagnostic query.
pub const RECENT_QUERY_POOL: usize = 5;

/// Minimum stem length considered for title-substring inference.
const MIN_INFER_STEM_LEN: usize = 3;

/// Outcome of document detection for one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: Option<String>,
    pub confidence: u8,
    pub source: FileSource,
}

impl ResolvedFile {
    pub fn none() -> Self {
        Self {
            path: None,
            confidence: 0,
            source: FileSource::None,
        }
    }

    fn hit(path: String, confidence: u8, source: FileSource) -> Self {
        Self {
            path: Some(path),
            confidence,
            source,
        }
    }

    /// Whether this result is strong enough to become a launch argument.
    pub fn is_launchable(&self) -> bool {
        self.path.is_some() && self.confidence >= LAUNCH_CONFIDENCE_THRESHOLD
    }
}

/// The window attributes document detection works from.
#[derive(Debug, Clone, Copy)]
pub struct WindowFileQuery<'a> {
    /// Lowercased process name without extension.
    pub process_name: &'a str,
    /// Full executable path; may be empty for inaccessible processes.
    pub executable_path: &'a str,
    pub title: &'a str,
}

/// Run the tier pipeline for one window.
pub fn resolve_window_file(
    query: WindowFileQuery<'_>,
    index: &mut JumpListIndex,
    roots: &SearchRoots,
) -> ResolvedFile {
    // Tier 1: title regex.
    let capture = title_rules::parse_title(query.process_name, query.title);
    if let TitleCapture::AbsolutePath(path) = &capture {
        return ResolvedFile::hit(path.clone(), 90, FileSource::TitleParse);
    }

    let bare_name = match &capture {
        TitleCapture::BareName(name) => Some(name.clone()),
        _ => None,
    };

    // Tier 1.5: the bare name, resolved exactly in the app's own jump list.
    if let Some(name) = &bare_name {
        if !query.executable_path.is_empty() {
            let pool = index.own_recent_files(query.executable_path, JUMPLIST_EXACT_POOL);
            if let Some(path) = pool.iter().find(|p| {
                Path::new(p.as_str())
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            }) {
                return ResolvedFile::hit(path.clone(), 90, FileSource::JumplistExact);
            }
        }
    }

    // Tier 2: recent documents whose name shows up in the title.
    if !query.executable_path.is_empty() {
        let candidates = index.recent_files_for_app(query.executable_path, JUMPLIST_INFER_POOL);
        if let Some(path) = infer_from_title(&candidates, query.title) {
            return ResolvedFile::hit(path, 80, FileSource::Jumplist);
        }
    }

    // Tier 3: unique filesystem hit for a still-bare name.
    if let Some(name) = &bare_name {
        if let Some(path) = search::find_unique_file(roots, name) {
            return ResolvedFile::hit(
                path.to_string_lossy().into_owned(),
                85,
                FileSource::FileSearch,
            );
        }
        // Keep the bare-name observation; it is below the launch threshold.
        return ResolvedFile::hit(name.clone(), 40, FileSource::TitleParse);
    }

    ResolvedFile::none()
}

/// Pick the candidate whose file name or stem appears in the window title,
/// preferring the longest (most specific) stem.
fn infer_from_title(candidates: &[String], title: &str) -> Option<String> {
    let title_lc = title.to_lowercase();
    let mut best: Option<(usize, &String)> = None;

    for candidate in candidates {
        let path = Path::new(candidate.as_str());
        let name_lc = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase())
            .unwrap_or_default();
        let stem_lc = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let name_hit = !name_lc.is_empty() && title_lc.contains(&name_lc);
        let stem_hit = stem_lc.len() >= MIN_INFER_STEM_LEN && title_lc.contains(&stem_lc);
        if !name_hit && !stem_hit {
            continue;
        }
        match best {
            Some((best_len, _)) if best_len >= stem_lc.len() => {}
            _ => best = Some((stem_lc.len(), candidate)),
        }
    }
    best.map(|(_, path)| path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{write_jump_list, FakeRegistry};
    use handlers::HandlerCache;

    fn empty_index(dir: &Path) -> JumpListIndex {
        JumpListIndex::build(dir, &FakeRegistry::new(), &HandlerCache::new())
    }

    #[test]
    fn test_absolute_title_hit_short_circuits() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let title = format!("{} - Notepad", file.display());
        let mut index = empty_index(temp.path());
        let result = resolve_window_file(
            WindowFileQuery {
                process_name: "notepad",
                executable_path: "C:\\Windows\\System32\\notepad.exe",
                title: &title,
            },
            &mut index,
            &SearchRoots::with_roots(vec![]),
        );
        assert_eq!(result.path.as_deref(), Some(file.to_str().unwrap()));
        assert_eq!(result.confidence, 90);
        assert_eq!(result.source, FileSource::TitleParse);
        assert!(result.is_launchable());
    }

    #[test]
    fn test_bare_name_without_corroboration_scores_forty() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut index = empty_index(temp.path());
        let result = resolve_window_file(
            WindowFileQuery {
                process_name: "notepad",
                executable_path: "C:\\Windows\\System32\\notepad.exe",
                title: "notes.txt - Notepad",
            },
            &mut index,
            &SearchRoots::with_roots(vec![]),
        );
        assert_eq!(result.path.as_deref(), Some("notes.txt"));
        assert_eq!(result.confidence, 40);
        assert_eq!(result.source, FileSource::TitleParse);
        assert!(!result.is_launchable());
    }

    #[test]
    fn test_exact_jump_list_lookup_upgrades_bare_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let recent = temp.path().join("recent");
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&recent).unwrap();
        std::fs::create_dir_all(&docs).unwrap();

        let doc = docs.join("notes.txt");
        std::fs::write(&doc, "x").unwrap();

        let exe = "C:\\Windows\\System32\\notepad.exe";
        let stem = appid::jump_list_stem(exe);
        write_jump_list(
            &recent.join(format!("{}.automaticDestinations-ms", stem)),
            &[doc.to_str().unwrap()],
        );

        let mut index = empty_index(&recent);
        let result = resolve_window_file(
            WindowFileQuery {
                process_name: "notepad",
                executable_path: exe,
                title: "notes.txt - Notepad",
            },
            &mut index,
            &SearchRoots::with_roots(vec![]),
        );
        assert_eq!(result.path.as_deref(), doc.to_str());
        assert_eq!(result.confidence, 90);
        assert_eq!(result.source, FileSource::JumplistExact);
    }

    #[test]
    fn test_title_inference_prefers_longest_stem() {
        let candidates = vec![
            "C:\\Docs\\Plan.docx".to_string(),
            "C:\\Docs\\Plan 2026 final.docx".to_string(),
        ];
        let hit = infer_from_title(&candidates, "Plan 2026 final.docx - Word");
        assert_eq!(hit.as_deref(), Some("C:\\Docs\\Plan 2026 final.docx"));
    }

    #[test]
    fn test_title_inference_requires_stem_in_title() {
        let candidates = vec![
            "C:\\Docs\\Diplomarbeit.docx".to_string(),
            "C:\\Docs\\Relevant code.docx".to_string(),
        ];
        let hit = infer_from_title(&candidates, "Diplomarbeit.docx - Word");
        assert_eq!(hit.as_deref(), Some("C:\\Docs\\Diplomarbeit.docx"));
    }

    #[test]
    fn test_short_stems_are_ignored() {
        let candidates = vec!["C:\\Docs\\a.docx".to_string()];
        assert_eq!(infer_from_title(&candidates, "something - Word"), None);
        // But a short stem still matches via the full file name.
        assert_eq!(
            infer_from_title(&candidates, "a.docx - Word").as_deref(),
            Some("C:\\Docs\\a.docx")
        );
    }

    #[test]
    fn test_file_search_resolves_unique_bare_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let docs = temp.path().join("Documents");
        std::fs::create_dir_all(&docs).unwrap();
        let target = docs.join("thesis.txt");
        std::fs::write(&target, "x").unwrap();

        let recent = temp.path().join("recent");
        std::fs::create_dir_all(&recent).unwrap();
        let mut index = empty_index(&recent);

        let result = resolve_window_file(
            WindowFileQuery {
                process_name: "notepad",
                executable_path: "C:\\Windows\\System32\\notepad.exe",
                title: "thesis.txt - Notepad",
            },
            &mut index,
            &SearchRoots::with_roots(vec![docs]),
        );
        assert_eq!(result.path.as_deref(), target.to_str());
        assert_eq!(result.confidence, 85);
        assert_eq!(result.source, FileSource::FileSearch);
    }

    #[test]
    fn test_unknown_process_resolves_to_none() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut index = empty_index(temp.path());
        let result = resolve_window_file(
            WindowFileQuery {
                process_name: "spotify",
                executable_path: "C:\\Spotify\\spotify.exe",
                title: "Artist - Song",
            },
            &mut index,
            &SearchRoots::with_roots(vec![]),
        );
        assert_eq!(result, ResolvedFile::none());
    }
}
