//! WindowAnchor core.
//!
//! Captures the state of a desktop — windows, their placements and DPI
//! context, the monitor each sits on, and the document each most likely has
//! open — into named workspace snapshots, and restores that state later by
//! matching live windows, launching what is missing, and repositioning
//! everything.
//!
//! The crate is split along the pipeline:
//!
//! - [`display`]: monitor enumeration and topology fingerprinting
//! - [`window`]: window enumeration, filtering, placement math
//! - [`resolver`]: document detection (title parsing, jump lists, search)
//! - [`snapshot`]: the capture engine and the persisted data model
//! - [`restore`]: the five-phase restore state machine
//! - [`store`]: on-disk workspaces and the one-time legacy migration
//! - [`platform`]: the trait seam every OS call goes through
//!
//! All Win32 access lives behind [`platform`] traits; the engines and every
//! parser are platform-independent and tested against in-memory fakes.

pub mod config;
pub mod display;
pub mod logging;
pub mod platform;
pub mod progress;
pub mod resolver;
pub mod restore;
pub mod snapshot;
pub mod store;
pub mod window;

pub use config::AppPaths;
pub use logging::FileLogger;
pub use progress::{Progress, ProgressSink};
pub use restore::{RestoreEngine, RestoreOutcome, RestoreStatus};
pub use snapshot::{SnapshotEngine, SnapshotRequest, WorkspaceSnapshot};
pub use store::WorkspaceStore;
