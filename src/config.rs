// Path configuration for the per-user data directory
// Handles the WindowAnchor app-data layout and the shell's jump-list location

use std::path::PathBuf;

/// Locations of everything WindowAnchor reads or writes on disk.
///
/// All persistent state lives under one per-user directory (Roaming AppData
/// on Windows). The jump-list directory belongs to the OS shell and is only
/// ever read.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Base directory for workspaces, settings, log, and migration sentinel
    data_dir: PathBuf,
    /// The shell's `AutomaticDestinations` jump-list directory
    recent_destinations_dir: PathBuf,
}

impl AppPaths {
    /// Create configuration from environment variables, falling back to defaults.
    ///
    /// `WINDOW_ANCHOR_DATA_DIR` overrides the data directory (used by tests
    /// and portable installs).
    pub fn from_env() -> Self {
        let data_dir = match std::env::var("WINDOW_ANCHOR_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => Self::default_data_dir(),
        };
        let recent_destinations_dir = Self::default_recent_dir();
        Self {
            data_dir,
            recent_destinations_dir,
        }
    }

    /// Build paths rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            recent_destinations_dir: data_dir.join("recent"),
            data_dir,
        }
    }

    /// Override the jump-list directory (fixtures in tests).
    pub fn with_recent_dir(mut self, dir: PathBuf) -> Self {
        self.recent_destinations_dir = dir;
        self
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("WindowAnchor"))
            .unwrap_or_else(|| PathBuf::from(".window-anchor"))
    }

    fn default_recent_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| {
                d.join("Microsoft")
                    .join("Windows")
                    .join("Recent")
                    .join("AutomaticDestinations")
            })
            .unwrap_or_else(|| PathBuf::from("AutomaticDestinations"))
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Directory holding one `.workspace.json` file per saved workspace.
    pub fn workspaces_dir(&self) -> PathBuf {
        self.data_dir.join("workspaces")
    }

    /// Single-line file recording the fingerprint last seen by save or restore.
    pub fn last_fingerprint_file(&self) -> PathBuf {
        self.data_dir.join("last_fingerprint.txt")
    }

    /// External-configuration blob owned by the settings UI.
    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    /// Zero-byte sentinel marking the one-time profile migration as done.
    pub fn migration_sentinel(&self) -> PathBuf {
        self.data_dir.join(".migrated_v2")
    }

    /// Pre-v2 profile directory, consumed once by migration.
    pub fn legacy_profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    /// Append-only diagnostic log.
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("app.log")
    }

    /// The shell's per-application jump-list files.
    pub fn recent_destinations_dir(&self) -> &PathBuf {
        &self.recent_destinations_dir
    }

    /// Create the data and workspace directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.workspaces_dir())?;
        Ok(())
    }
}
