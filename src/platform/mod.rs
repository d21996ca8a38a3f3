//! Platform seam.
//!
//! Every OS call the engines make goes through the traits in this module.
//! This inverts the dependency: the snapshot and restore pipelines depend on
//! abstractions, and the Win32 implementations live behind `cfg(windows)` in
//! [`windows`](self::windows). Tests supply in-memory fakes.

use anyhow::Result;

use crate::window::placement::{Placement, Rect};

pub mod testing;
#[cfg(windows)]
pub mod windows;

/// Opaque OS window handle value.
pub type WindowHandle = isize;

/// A top-level window as enumerated from the OS, before filtering.
#[derive(Debug, Clone)]
pub struct RawWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub class_name: String,
    pub is_visible: bool,
    pub has_owner: bool,
    /// Actual outer rectangle in virtual-desktop coordinates.
    pub rect: Rect,
    pub process_id: u32,
    /// Full executable path; empty when the process denies access.
    pub executable_path: String,
}

/// Window enumeration and manipulation.
pub trait WindowSystem: Send + Sync {
    /// Enumerate all top-level windows, unfiltered.
    fn list_windows(&self) -> Vec<RawWindow>;

    /// Read a window's placement (show command, restored rect, flag bits).
    fn placement(&self, handle: WindowHandle) -> Result<Placement>;

    /// Write a window's placement back.
    fn set_placement(&self, handle: WindowHandle, placement: &Placement) -> Result<()>;

    /// Explicit maximize, needed in addition to placement across DPI changes.
    fn show_maximized(&self, handle: WindowHandle);

    /// Per-window DPI; 0 when the query fails.
    fn window_dpi(&self, handle: WindowHandle) -> u32;

    /// Actual outer rectangle right now, if the window still exists.
    fn outer_rect(&self, handle: WindowHandle) -> Option<Rect>;

    /// Post a close request to the window. Never force-kills.
    fn request_close(&self, handle: WindowHandle);

    /// OS device name (`\\.\DISPLAY1`) of the monitor nearest the window.
    fn monitor_device_for_window(&self, handle: WindowHandle) -> Option<String>;

    /// Folder shown by a file-browser window, via shell automation.
    fn explorer_folder(&self, handle: WindowHandle) -> Option<String>;

    /// Process id of this process, for self-exclusion.
    fn current_process_id(&self) -> u32;
}

/// One monitor as reported by the GDI geometry sweep.
#[derive(Debug, Clone)]
pub struct GdiMonitor {
    /// OS display-device name, e.g. `\\.\DISPLAY1`.
    pub device_name: String,
    pub rect: Rect,
    pub work_area: Rect,
    pub is_primary: bool,
}

/// One active display target from the display-config walk.
#[derive(Debug, Clone)]
pub struct DisplayTarget {
    /// GDI device name of the source, links the target to a [`GdiMonitor`].
    pub source_device_name: String,
    /// Hardware device path, used as the identity fallback without EDID.
    pub device_path: String,
    pub friendly_name: String,
    pub edid_valid: bool,
    pub edid_manufacturer_id: u16,
    pub edid_product_code: u16,
    pub connector_instance: u32,
}

/// Display-config query failures, surfaced in-band as sentinel fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayConfigError {
    /// The buffer-size query failed.
    BufferSize,
    /// The path query itself failed.
    QueryFailed,
}

/// Monitor topology queries.
pub trait DisplaySystem: Send + Sync {
    /// Geometry sweep: every monitor with rect, work area, and device name.
    fn gdi_monitors(&self) -> Vec<GdiMonitor>;

    /// Display-config walk over active paths.
    fn display_targets(&self) -> std::result::Result<Vec<DisplayTarget>, DisplayConfigError>;
}

/// Process spawning for the restore pipeline.
pub trait Launcher: Send + Sync {
    /// Open a document or folder through the OS shell association.
    fn shell_open(&self, target: &str) -> Result<()>;

    /// Launch an application directly with arguments.
    fn spawn(&self, executable: &str, args: &[String]) -> Result<()>;
}

/// Raw registry lookups behind the extension-to-handler resolution.
pub trait RegistryView: Send + Sync {
    /// Per-user file-extension choice (`FileExts\{ext}\UserChoice` ProgId).
    fn user_choice_progid(&self, extension: &str) -> Option<String>;

    /// Machine-wide progid (default value of `HKCR\{ext}`).
    fn machine_progid(&self, extension: &str) -> Option<String>;

    /// Default value of `HKCR\{progid}\shell\open\command`.
    fn open_command(&self, progid: &str) -> Option<String>;
}
