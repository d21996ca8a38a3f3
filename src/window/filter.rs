//! User-window filtering.
//!
//! Decides which top-level windows count as part of the user's workspace.
//! Shell chrome, background workers, and transient popups are rejected by a
//! class skip set plus visibility, ownership, title, and size rules.

use crate::platform::RawWindow;

/// Window classes belonging to shell chrome and input-method plumbing.
const SKIP_CLASSES: &[&str] = &[
    "Shell_TrayWnd",
    "DV2ControlHost",
    "MsgrIMEWindowClass",
    "SysShadow",
    "Button",
    "Windows.UI.Core.CoreWindow",
    "Progman",
    "WorkerW",
    "NotifyIconOverflowWindow",
    "TrayClockWClass",
    "MSTaskListWClass",
    "MSTaskSwWClass",
    "ReBarWindow32",
    "TopLevelWindowForOverflowXamlIsland",
];

/// Windows smaller than this on either axis are popups or tool chrome.
const MIN_DIMENSION: i32 = 100;

/// Whether a top-level window belongs in a workspace snapshot.
pub fn is_user_window(window: &RawWindow) -> bool {
    if !window.is_visible || window.has_owner {
        return false;
    }
    if window.title.trim().is_empty() {
        return false;
    }
    if SKIP_CLASSES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&window.class_name))
    {
        return false;
    }
    window.rect.width() >= MIN_DIMENSION && window.rect.height() >= MIN_DIMENSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::placement::Rect;

    fn window(class: &str, title: &str) -> RawWindow {
        RawWindow {
            handle: 1,
            title: title.to_string(),
            class_name: class.to_string(),
            is_visible: true,
            has_owner: false,
            rect: Rect::new(0, 0, 800, 600),
            process_id: 42,
            executable_path: "C:\\app\\app.exe".to_string(),
        }
    }

    #[test]
    fn test_ordinary_window_included() {
        assert!(is_user_window(&window("Notepad", "Untitled - Notepad")));
    }

    #[test]
    fn test_shell_chrome_excluded() {
        assert!(!is_user_window(&window("Shell_TrayWnd", "Taskbar")));
        assert!(!is_user_window(&window("Progman", "Program Manager")));
        assert!(!is_user_window(&window("WorkerW", "x")));
    }

    #[test]
    fn test_skip_class_match_is_case_insensitive() {
        assert!(!is_user_window(&window("shell_traywnd", "Taskbar")));
    }

    #[test]
    fn test_invisible_window_excluded() {
        let mut w = window("Notepad", "Untitled - Notepad");
        w.is_visible = false;
        assert!(!is_user_window(&w));
    }

    #[test]
    fn test_owned_window_excluded() {
        let mut w = window("#32770", "Save As");
        w.has_owner = true;
        assert!(!is_user_window(&w));
    }

    #[test]
    fn test_blank_title_excluded() {
        assert!(!is_user_window(&window("Chrome_WidgetWin_1", "   ")));
        assert!(!is_user_window(&window("Chrome_WidgetWin_1", "")));
    }

    #[test]
    fn test_tiny_window_excluded() {
        let mut w = window("Notepad", "Untitled - Notepad");
        w.rect = Rect::new(0, 0, 99, 600);
        assert!(!is_user_window(&w));
        w.rect = Rect::new(0, 0, 800, 99);
        assert!(!is_user_window(&w));
        w.rect = Rect::new(0, 0, 100, 100);
        assert!(is_user_window(&w));
    }
}
