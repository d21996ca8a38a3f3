//! File-backed diagnostic logging.
//!
//! Installs a `log` facade backend that appends timestamped lines to
//! `app.log`, serializing writes behind a mutex. The log is truncated once it
//! grows past 2 MiB. Logging must never fail the operation that logged:
//! every I/O error here is swallowed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use log::{Level, LevelFilter, Metadata, Record};

/// Truncation threshold for `app.log`.
const MAX_LOG_BYTES: u64 = 2 * 1024 * 1024;

/// `log::Log` backend writing to a single rolling file.
pub struct FileLogger {
    inner: Mutex<LogFile>,
    max_bytes: u64,
}

struct LogFile {
    path: PathBuf,
    file: Option<File>,
}

impl FileLogger {
    pub fn new(path: PathBuf) -> Self {
        Self::with_max_bytes(path, MAX_LOG_BYTES)
    }

    fn with_max_bytes(path: PathBuf, max_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(LogFile { path, file: None }),
            max_bytes,
        }
    }

    /// Install this logger as the process-wide `log` backend.
    ///
    /// Safe to call more than once; later installs are ignored.
    pub fn install(path: PathBuf) {
        let logger = Box::new(Self::new(path));
        if log::set_boxed_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Info);
        }
    }

    fn write_line(&self, level: Level, line: &str) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        // Roll the file once it passes the size cap.
        if let Ok(meta) = std::fs::metadata(&inner.path) {
            if meta.len() >= self.max_bytes {
                inner.file = None;
                let _ = std::fs::remove_file(&inner.path);
            }
        }

        if inner.file.is_none() {
            if let Some(parent) = inner.path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            inner.file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&inner.path)
                .ok();
        }

        if let Some(file) = inner.file.as_mut() {
            let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "{} [{}] {}", stamp, level, line);
        }
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.write_line(record.level(), &record.args().to_string());
        }
    }

    fn flush(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(file) = inner.file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn record(msg: &str) -> String {
        msg.to_string()
    }

    #[test]
    fn test_appends_timestamped_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("app.log");
        let logger = FileLogger::new(path.clone());

        logger.write_line(Level::Info, &record("first"));
        logger.write_line(Level::Warn, &record("second"));
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO] first"));
        assert!(lines[1].contains("[WARN] second"));
    }

    #[test]
    fn test_truncates_past_cap() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("app.log");
        let logger = FileLogger::with_max_bytes(path.clone(), 256);

        for i in 0..32 {
            logger.write_line(Level::Info, &record(&format!("filler line {}", i)));
            logger.flush();
        }

        let len = std::fs::metadata(&path).unwrap().len();
        // One post-truncation line at most, never the full history.
        assert!(len < 512, "log should have rolled, was {} bytes", len);
    }

    #[test]
    fn test_missing_parent_is_not_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("deep").join("nested").join("app.log");
        let logger = FileLogger::new(path.clone());
        logger.write_line(Level::Info, &record("created parents"));
        assert!(path.exists());
    }
}
