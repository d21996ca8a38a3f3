//! Window placement primitives.
//!
//! Rectangles, show-commands, and the placement math used on both the
//! capture and restore sides: snap-drift correction, DPI coordinate scaling,
//! and the byte-capped title snippet.

use serde::{Deserialize, Serialize};

/// Stored titles are capped at 200 bytes. Long enough to keep the
/// ` - AppName` suffixes that title parsing relies on.
pub const TITLE_SNIPPET_MAX_BYTES: usize = 200;

/// Edge drift above this is a snap arrangement, not DWM shadow jitter
/// (shadows drift 7-14 px; snap offsets start around 100 px).
pub const SNAP_DRIFT_TOLERANCE: i32 = 15;

/// DPI assumed when a record carries none.
pub const BASELINE_DPI: u32 = 96;

/// Virtual-desktop rectangle, edges in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Window state at capture time, restored via window placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShowCommand {
    Normal,
    Maximized,
    Minimized,
}

impl Default for ShowCommand {
    fn default() -> Self {
        ShowCommand::Normal
    }
}

impl ShowCommand {
    /// Map a Win32 `SW_*` show command onto the three states we persist.
    pub fn from_sw(sw: u32) -> Self {
        match sw {
            2 | 6 | 7 => ShowCommand::Minimized,
            3 => ShowCommand::Maximized,
            _ => ShowCommand::Normal,
        }
    }

    pub fn to_sw(self) -> u32 {
        match self {
            ShowCommand::Normal => 1,
            ShowCommand::Minimized => 2,
            ShowCommand::Maximized => 3,
        }
    }
}

/// Window-placement snapshot as read from (and written back to) the OS.
///
/// `raw_flags` carries the OS flag bits through a read-modify-write so a
/// reposition only replaces the show command and the restored rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub show_command: ShowCommand,
    pub normal_rect: Rect,
    pub raw_flags: u32,
}

/// Pick the rectangle to persist for a window.
///
/// The OS keeps the pre-snap rectangle in the placement's normal position,
/// which goes stale while a window sits in a snap arrangement. For windows in
/// the `Normal` state, prefer the actual on-screen rectangle whenever it has
/// drifted further than shadow jitter can explain.
pub fn effective_normal_rect(
    show_command: ShowCommand,
    normal_rect: Rect,
    actual_rect: Option<Rect>,
) -> Rect {
    if show_command != ShowCommand::Normal {
        return normal_rect;
    }
    let Some(actual) = actual_rect else {
        return normal_rect;
    };
    let drifted = (actual.left - normal_rect.left).abs() > SNAP_DRIFT_TOLERANCE
        || (actual.top - normal_rect.top).abs() > SNAP_DRIFT_TOLERANCE
        || (actual.right - normal_rect.right).abs() > SNAP_DRIFT_TOLERANCE
        || (actual.bottom - normal_rect.bottom).abs() > SNAP_DRIFT_TOLERANCE;
    if drifted {
        actual
    } else {
        normal_rect
    }
}

/// Scale a restored rectangle from the DPI it was captured at to the DPI of
/// the monitor it is being placed on. Placement coordinates are interpreted
/// in the target window's DPI context, so edges scale linearly and truncate.
pub fn scale_rect(rect: Rect, saved_dpi: u32, current_dpi: u32) -> Rect {
    let saved = if saved_dpi == 0 { BASELINE_DPI } else { saved_dpi };
    let current = if current_dpi == 0 {
        BASELINE_DPI
    } else {
        current_dpi
    };
    if saved == current {
        return rect;
    }
    let scale = |edge: i32| -> i32 { ((edge as i64 * current as i64) / saved as i64) as i32 };
    Rect {
        left: scale(rect.left),
        top: scale(rect.top),
        right: scale(rect.right),
        bottom: scale(rect.bottom),
    }
}

/// Truncate a window title to the stored snippet size, on a char boundary.
pub fn truncate_title(title: &str) -> String {
    if title.len() <= TITLE_SNIPPET_MAX_BYTES {
        return title.to_string();
    }
    let mut end = TITLE_SNIPPET_MAX_BYTES;
    while end > 0 && !title.is_char_boundary(end) {
        end -= 1;
    }
    title[..end].to_string()
}
