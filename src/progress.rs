//! Progress reporting seam.
//!
//! The engines report progress through a single-method sink supplied by the
//! integrator; the UI side decides how to surface it. The core never calls
//! upward into UI code.

/// Progress events emitted by the snapshot and restore pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The jump-list index is being built, before any per-window work.
    IndexingRecentFiles,
    /// About to resolve one window. Emitted before resolution starts.
    Window {
        current: usize,
        total: usize,
        process_name: String,
        title: String,
    },
    /// The snapshot is being written to disk.
    Saving,
    /// A restore phase (1..=5) is starting.
    RestorePhase { phase: u8 },
    /// A context switch is waiting for windows to close.
    ClosingWindows { remaining: usize },
}

/// Capability contract for progress reporting.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Forward to an optional sink.
pub(crate) fn emit(sink: Option<&dyn ProgressSink>, progress: Progress) {
    if let Some(sink) = sink {
        sink.report(progress);
    }
}

/// Sink that collects events, for tests.
#[derive(Default)]
pub struct CollectingSink {
    events: std::sync::Mutex<Vec<Progress>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Progress> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn report(&self, progress: Progress) {
        self.events.lock().unwrap().push(progress);
    }
}
