//! Workspace snapshot models.
//!
//! These structs define the on-disk snapshot format: camelCase property
//! names, human-readable indentation, and the legacy wire conventions for
//! absent values (`"NONE"` file source, empty strings for absent paths).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::placement::{Rect, ShowCommand};

/// Detection confidence at or above which a file becomes the launch argument.
pub const LAUNCH_CONFIDENCE_THRESHOLD: u8 = 80;

/// Confidence assigned to folders read from the file browser itself.
pub const EXPLORER_FOLDER_CONFIDENCE: u8 = 95;

/// Where a detected file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileSource {
    None,
    TitleParse,
    JumplistExact,
    Jumplist,
    FileSearch,
    ExplorerFolder,
}

impl Default for FileSource {
    fn default() -> Self {
        FileSource::None
    }
}

/// One monitor as recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub monitor_id: String,
    pub friendly_name: String,
    /// OS display-device name, e.g. `\\.\DISPLAY1`.
    pub device_name: String,
    /// Zero-based position after primary-first, left-ascending sort.
    pub index: i32,
    pub width_pixels: i32,
    pub height_pixels: i32,
    pub is_primary: bool,
}

/// Captured placement of a single window.
///
/// The rectangle is always the *restored* position, even for windows that
/// were maximized at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    #[serde(default)]
    pub executable_path: String,
    #[serde(default)]
    pub process_name: String,
    #[serde(default)]
    pub window_class_name: String,
    #[serde(default)]
    pub title_snippet: String,
    #[serde(default)]
    pub show_command: ShowCommand,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub right: i32,
    #[serde(default)]
    pub bottom: i32,
    /// DPI of the monitor the window was on at capture time.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Folder shown by a file-browser window, when known.
    #[serde(default, with = "empty_string_option")]
    pub explorer_folder: Option<String>,
    #[serde(default)]
    pub monitor_id: String,
    #[serde(default)]
    pub monitor_index: i32,
    #[serde(default)]
    pub monitor_name: String,
}

fn default_dpi() -> u32 {
    96
}

impl WindowRecord {
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.left = rect.left;
        self.top = rect.top;
        self.right = rect.right;
        self.bottom = rect.bottom;
    }
}

/// One window's worth of snapshot state: placement plus file detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceEntry {
    pub executable_path: String,
    pub process_name: String,
    pub window_class_name: String,
    /// Detected document, if any.
    #[serde(default, with = "empty_string_option")]
    pub file_path: Option<String>,
    /// Detection confidence, 0..=100.
    #[serde(default)]
    pub file_confidence: u8,
    #[serde(default)]
    pub file_source: FileSource,
    /// Argument passed at launch; only present at confidence >= 80.
    #[serde(default, with = "empty_string_option")]
    pub launch_arg: Option<String>,
    pub position: WindowRecord,
    #[serde(default)]
    pub monitor_id: String,
    #[serde(default)]
    pub monitor_index: i32,
    #[serde(default)]
    pub monitor_name: String,
    /// Runtime-only marker set by the restore pipeline.
    #[serde(skip)]
    pub was_restored: bool,
}

impl WorkspaceEntry {
    /// Entry with no file detection, from a bare window record.
    pub fn from_record(position: WindowRecord) -> Self {
        Self {
            executable_path: position.executable_path.clone(),
            process_name: position.process_name.clone(),
            window_class_name: position.window_class_name.clone(),
            file_path: None,
            file_confidence: 0,
            file_source: FileSource::None,
            launch_arg: None,
            monitor_id: position.monitor_id.clone(),
            monitor_index: position.monitor_index,
            monitor_name: position.monitor_name.clone(),
            position,
            was_restored: false,
        }
    }

    /// Clear all file-detection fields back to neutral.
    pub fn clear_file_detection(&mut self) {
        self.file_path = None;
        self.file_confidence = 0;
        self.file_source = FileSource::None;
        self.launch_arg = None;
    }
}

/// A named, persisted workspace: monitor set, window list, file assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub name: String,
    pub monitor_fingerprint: String,
    pub saved_at: DateTime<Utc>,
    pub saved_with_files: bool,
    #[serde(default)]
    pub monitors: Vec<Monitor>,
    #[serde(default)]
    pub entries: Vec<WorkspaceEntry>,
}

impl WorkspaceSnapshot {
    /// Enforce model invariants after construction or deserialization.
    ///
    /// A snapshot saved without file tracking carries no detection results,
    /// and a launch argument below the confidence threshold is dropped.
    pub fn normalize(&mut self) {
        for entry in &mut self.entries {
            if !self.saved_with_files {
                entry.clear_file_detection();
            }
            if entry.file_confidence < LAUNCH_CONFIDENCE_THRESHOLD {
                entry.launch_arg = None;
            }
        }
    }
}

/// Serialize `Option<String>` as an empty string when absent; read empty or
/// missing strings back as `None`. Preserves the historical file format.
mod empty_string_option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
