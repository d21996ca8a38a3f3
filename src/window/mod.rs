//! Window model: enumeration, capture, repositioning, graceful close.

pub mod filter;
pub mod placement;

use anyhow::Result;

use crate::platform::{RawWindow, WindowHandle, WindowSystem};
use crate::snapshot::models::WindowRecord;
use placement::{effective_normal_rect, scale_rect, truncate_title, ShowCommand, BASELINE_DPI};

pub use filter::is_user_window;

/// Enumerate the user's workspace windows: filtered, excluding this process.
pub fn list_user_windows(system: &dyn WindowSystem) -> Vec<RawWindow> {
    let own_pid = system.current_process_id();
    system
        .list_windows()
        .into_iter()
        .filter(|w| w.process_id != own_pid)
        .filter(is_user_window)
        .collect()
}

/// Lowercased executable stem, the canonical process name.
pub fn process_name_from_path(executable_path: &str) -> String {
    std::path::Path::new(executable_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Capture a window's placement into a persistable record.
///
/// Monitor-assignment fields are left empty; the snapshot engine fills them
/// from the display model.
pub fn capture_record(system: &dyn WindowSystem, window: &RawWindow) -> Option<WindowRecord> {
    let placement = system.placement(window.handle).ok()?;
    let rect = effective_normal_rect(
        placement.show_command,
        placement.normal_rect,
        system.outer_rect(window.handle),
    );
    let dpi = match system.window_dpi(window.handle) {
        0 => BASELINE_DPI,
        d => d,
    };

    Some(WindowRecord {
        executable_path: window.executable_path.clone(),
        process_name: process_name_from_path(&window.executable_path),
        window_class_name: window.class_name.clone(),
        title_snippet: truncate_title(&window.title),
        show_command: placement.show_command,
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
        dpi,
        explorer_folder: None,
        monitor_id: String::new(),
        monitor_index: 0,
        monitor_name: String::new(),
    })
}

/// Reposition a live window to a saved record.
///
/// Reads the current placement to preserve its flag bits, overwrites the show
/// command and restored rectangle (scaled into the window's current DPI
/// context), and writes it back. Maximized windows get an explicit maximize
/// call on top; placement alone is unreliable across monitor DPI changes.
pub fn apply_record(
    system: &dyn WindowSystem,
    handle: WindowHandle,
    record: &WindowRecord,
) -> Result<()> {
    let mut live = system.placement(handle)?;
    let current_dpi = match system.window_dpi(handle) {
        0 => BASELINE_DPI,
        d => d,
    };
    live.show_command = record.show_command;
    live.normal_rect = scale_rect(record.rect(), record.dpi, current_dpi);
    system.set_placement(handle, &live)?;
    if record.show_command == ShowCommand::Maximized {
        system.show_maximized(handle);
    }
    Ok(())
}

/// Post a close request to every user window.
///
/// The returned count is advisory: windows showing save-confirmation dialogs
/// can outlive it indefinitely.
pub fn close_user_windows(system: &dyn WindowSystem) -> usize {
    let windows = list_user_windows(system);
    for w in &windows {
        system.request_close(w.handle);
    }
    windows.len()
}

/// Number of user windows currently open.
pub fn count_user_windows(system: &dyn WindowSystem) -> usize {
    list_user_windows(system).len()
}
