//! Jump-list index (Tier 1.5 / Tier 2 backing store).
//!
//! The shell keeps one compound-document file per application under
//! `Recent\AutomaticDestinations`, each holding a `DestList` metadata stream
//! plus one Shell Link stream per recent item. This module parses those
//! files into three parallel indexes and answers "which documents did this
//! application touch recently".
//!
//! The index is built once per snapshot pass and discarded afterwards.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::platform::RegistryView;
use crate::window::process_name_from_path;

use super::appid::jump_list_stem;
use super::handlers::{process_name_for_extension, HandlerCache};
use super::shell_link::parse_target_path;

/// File suffix of automatic jump-list files.
const JUMP_LIST_SUFFIX: &str = ".automaticdestinations-ms";

/// Recent-document indexes keyed three ways.
pub struct JumpListIndex {
    recent_dir: PathBuf,
    /// Registry-resolved handler executable (lowercased) -> discovered paths.
    by_handler: HashMap<String, Vec<String>>,
    /// Canonical process name -> discovered paths.
    by_process: HashMap<String, Vec<String>>,
    /// Lowercased executable path -> targets of its own jump-list file,
    /// parsed lazily on first query.
    direct: HashMap<String, Vec<String>>,
}

impl JumpListIndex {
    /// Parse every jump-list file in `recent_dir` into the handler and
    /// process-name indexes. Unreadable files are logged and skipped.
    pub fn build(
        recent_dir: &Path,
        registry: &dyn RegistryView,
        handlers: &HandlerCache,
    ) -> Self {
        let mut index = Self {
            recent_dir: recent_dir.to_path_buf(),
            by_handler: HashMap::new(),
            by_process: HashMap::new(),
            direct: HashMap::new(),
        };

        let entries = match std::fs::read_dir(recent_dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!(
                    "jump-list directory unreadable: {}: {}",
                    recent_dir.display(),
                    err
                );
                return index;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_jump_list = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_lowercase().ends_with(JUMP_LIST_SUFFIX))
                .unwrap_or(false);
            if !is_jump_list {
                continue;
            }
            for target in extract_link_targets(&path) {
                index.insert_target(registry, handlers, target);
            }
        }
        index
    }

    fn insert_target(
        &mut self,
        registry: &dyn RegistryView,
        handlers: &HandlerCache,
        target: String,
    ) {
        let extension = Path::new(&target)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e));
        let Some(extension) = extension else {
            return;
        };
        if let Some(handler) = handlers.handler_for_extension(registry, &extension) {
            self.by_handler
                .entry(handler)
                .or_default()
                .push(target.clone());
        }
        if let Some(process) = process_name_for_extension(&extension) {
            self.by_process
                .entry(process.to_string())
                .or_default()
                .push(target);
        }
    }

    /// Documents from the application's *own* jump list: the file named by
    /// its AppID hash, or the handler index when the app is the registered
    /// handler. Used for exact-filename lookups, where a process-name guess
    /// would be too loose.
    pub fn own_recent_files(&mut self, executable_path: &str, max: usize) -> Vec<String> {
        if executable_path.is_empty() || max == 0 {
            return Vec::new();
        }
        let key = executable_path.to_lowercase();

        if !self.direct.contains_key(&key) {
            let stem = jump_list_stem(executable_path);
            let file = self
                .recent_dir
                .join(format!("{}{}", stem, JUMP_LIST_SUFFIX));
            let targets = if file.is_file() {
                extract_link_targets(&file)
            } else {
                Vec::new()
            };
            self.direct.insert(key.clone(), targets);
        }
        if let Some(targets) = self.direct.get(&key) {
            if !targets.is_empty() {
                return targets.iter().take(max).cloned().collect();
            }
        }

        if let Some(targets) = self.by_handler.get(&key) {
            if !targets.is_empty() {
                return targets.iter().take(max).cloned().collect();
            }
        }
        Vec::new()
    }

    /// Recent documents for an application, most reliable index first:
    /// the app's own jump-list file, then the registry-resolved handler
    /// index, then the extension-derived process-name index. The first
    /// non-empty tier wins; the result is truncated to `max`.
    pub fn recent_files_for_app(&mut self, executable_path: &str, max: usize) -> Vec<String> {
        if executable_path.is_empty() || max == 0 {
            return Vec::new();
        }
        let own = self.own_recent_files(executable_path, max);
        if !own.is_empty() {
            return own;
        }
        let process = process_name_from_path(executable_path);
        if let Some(targets) = self.by_process.get(&process) {
            if !targets.is_empty() {
                return targets.iter().take(max).cloned().collect();
            }
        }
        Vec::new()
    }
}

/// Extract existing link targets from one jump-list file.
///
/// The shell holds the original open, so the file is copied to a temporary
/// location first. Stream-level errors are isolated: one corrupt stream
/// never aborts the file.
pub fn extract_link_targets(jump_list_file: &Path) -> Vec<String> {
    let temp = match tempfile::NamedTempFile::new() {
        Ok(t) => t,
        Err(err) => {
            log::warn!("temp file for jump list failed: {}", err);
            return Vec::new();
        }
    };
    if let Err(err) = std::fs::copy(jump_list_file, temp.path()) {
        log::warn!(
            "jump list copy failed: {}: {}",
            jump_list_file.display(),
            err
        );
        return Vec::new();
    }

    let mut comp = match cfb::open(temp.path()) {
        Ok(c) => c,
        Err(err) => {
            log::warn!(
                "jump list unreadable as compound document: {}: {}",
                jump_list_file.display(),
                err
            );
            return Vec::new();
        }
    };

    let stream_paths: Vec<PathBuf> = comp
        .walk()
        .filter(|e| e.is_stream() && !e.name().starts_with("DestList"))
        .map(|e| e.path().to_path_buf())
        .collect();

    let mut targets = Vec::new();
    for stream_path in stream_paths {
        let mut data = Vec::new();
        match comp.open_stream(&stream_path) {
            Ok(mut stream) => {
                if let Err(err) = stream.read_to_end(&mut data) {
                    log::info!("jump list stream read failed: {}", err);
                    continue;
                }
            }
            Err(err) => {
                log::info!("jump list stream open failed: {}", err);
                continue;
            }
        }
        let Some(target) = parse_target_path(&data) else {
            continue;
        };
        // Only targets that still exist are useful for matching or launch.
        if Path::new(&target).exists() {
            targets.push(target);
        }
    }
    targets
}
