//! Workspace snapshots: data model and the capture engine.

pub mod engine;
pub mod models;

pub use engine::{CandidateWindow, SnapshotEngine, SnapshotRequest};
pub use models::{FileSource, Monitor, WindowRecord, WorkspaceEntry, WorkspaceSnapshot};
