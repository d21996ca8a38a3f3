//! Title-based document detection (Tier 1).
//!
//! A static registry maps process names to title regexes with a named `file`
//! capture. The captured text is stripped of dirty-state decorations and
//! classified as an absolute path, a bare file name, or noise.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// What Tier 1 managed to read out of a window title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleCapture {
    /// An absolute path that exists on disk.
    AbsolutePath(String),
    /// A file name with no directory component.
    BareName(String),
    /// Nothing usable.
    None,
}

static TITLE_RULES: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    let rules: &[(&str, &str)] = &[
        ("notepad", r"^(?P<file>.+) - Notepad$"),
        ("notepad++", r"^(?P<file>.+) - Notepad\+\+.*$"),
        ("winword", r"^(?P<file>.+) - Word$"),
        ("excel", r"^(?P<file>.+) - Excel$"),
        ("powerpnt", r"^(?P<file>.+) - PowerPoint$"),
        ("code", r"^(?P<file>.+) - Visual Studio Code$"),
        ("cursor", r"^(?P<file>.+) - Cursor$"),
        ("acrord32", r"^(?P<file>.+) - Adobe Acrobat.*$"),
        ("sumatrapdf", r"^(?P<file>.+) - SumatraPDF$"),
        ("wordpad", r"^(?P<file>.+) - WordPad$"),
    ];
    rules
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("static title regex")))
        .collect()
});

/// Characters editors prepend or append to signal unsaved state.
const DECORATIONS: &[char] = &['*', '•', '●', ' ', '\t'];

/// Run the Tier 1 title parse for a process.
///
/// `process_name` must already be lowercased and extension-free.
pub fn parse_title(process_name: &str, title: &str) -> TitleCapture {
    let Some(rule) = TITLE_RULES.get(process_name) else {
        return TitleCapture::None;
    };
    let Some(captures) = rule.captures(title) else {
        return TitleCapture::None;
    };
    let Some(raw) = captures.name("file") else {
        return TitleCapture::None;
    };

    let candidate = raw.as_str().trim_matches(DECORATIONS);
    if candidate.is_empty() {
        return TitleCapture::None;
    }

    let path = Path::new(candidate);
    if path.is_absolute() && path.exists() {
        return TitleCapture::AbsolutePath(candidate.to_string());
    }
    if !candidate.contains('\\') && !candidate.contains('/') {
        return TitleCapture::BareName(candidate.to_string());
    }
    TitleCapture::None
}

/// Whether any Tier 1 rule exists for a process.
pub fn has_rule(process_name: &str) -> bool {
    TITLE_RULES.contains_key(process_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_capture() {
        assert_eq!(
            parse_title("notepad", "notes.txt - Notepad"),
            TitleCapture::BareName("notes.txt".to_string())
        );
        assert_eq!(
            parse_title("winword", "Diplomarbeit.docx - Word"),
            TitleCapture::BareName("Diplomarbeit.docx".to_string())
        );
    }

    #[test]
    fn test_absolute_path_capture_requires_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let title = format!("{} - Notepad", file.display());
        assert_eq!(
            parse_title("notepad", &title),
            TitleCapture::AbsolutePath(file.display().to_string())
        );
    }

    #[test]
    fn test_missing_absolute_path_is_rejected() {
        // Pathy but nonexistent: not an absolute hit, not a bare name.
        #[cfg(windows)]
        let title = "C:\\definitely\\missing\\notes.txt - Notepad";
        #[cfg(not(windows))]
        let title = "/definitely/missing/notes.txt - Notepad";
        assert_eq!(parse_title("notepad", title), TitleCapture::None);
    }

    #[test]
    fn test_decorations_are_stripped() {
        assert_eq!(
            parse_title("notepad", "*notes.txt - Notepad"),
            TitleCapture::BareName("notes.txt".to_string())
        );
        assert_eq!(
            parse_title("code", "● main.rs - Visual Studio Code"),
            TitleCapture::BareName("main.rs".to_string())
        );
    }

    #[test]
    fn test_unknown_process_has_no_capture() {
        assert_eq!(
            parse_title("spotify", "Artist - Song"),
            TitleCapture::None
        );
        assert!(!has_rule("spotify"));
        assert!(has_rule("winword"));
    }

    #[test]
    fn test_non_matching_title_yields_none() {
        assert_eq!(parse_title("notepad", "Notepad"), TitleCapture::None);
        assert_eq!(
            parse_title("winword", "Word"),
            TitleCapture::None
        );
    }

    #[test]
    fn test_notepad_plus_plus_versioned_suffix() {
        assert_eq!(
            parse_title("notepad++", "config.xml - Notepad++ v8.6"),
            TitleCapture::BareName("config.xml".to_string())
        );
    }
}
