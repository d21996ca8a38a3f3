//! Five-phase restore pipeline.
//!
//! 1. Match already-live windows and reposition them.
//! 2. Open documents and launch missing applications.
//! 3. Wait for launched applications to initialize.
//! 4. Match and reposition newly-appeared windows.
//! 5. One more wait for slow starters, then a final match pass.
//!
//! Cancellation is checked at every phase boundary and before every wait; a
//! cancelled restore leaves whatever was already repositioned in place. The
//! context-switch variant first closes every user window and only proceeds
//! once the desktop is empty.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::platform::{Launcher, WindowSystem};
use crate::progress::{emit, Progress, ProgressSink};
use crate::snapshot::models::{WorkspaceEntry, WorkspaceSnapshot};
use crate::window;

use super::matching::{self, LiveWindow, MatchState};

/// Wait after Phase 2 for launched applications to create their windows.
const APP_INIT_WAIT: Duration = Duration::from_secs(3);
/// Extra wait before the final pass; IDEs and Office are slow starters.
const SLOW_START_WAIT: Duration = Duration::from_secs(2);
/// Poll interval of the context-switch close loop.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Total time the context switch waits for the desktop to empty.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(120);

/// Browsers that reopen their last tab set when asked.
const SESSION_RESTORE_BROWSERS: &[&str] = &["chrome", "msedge", "opera", "brave", "brave_browser"];
const SESSION_RESTORE_ARG: &str = "--restore-last-session";

/// Code editors are launched directly with the workspace directory as an
/// argument instead of through shell association.
const DIRECT_LAUNCH_EDITORS: &[&str] = &["code", "cursor"];

/// How a restore run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStatus {
    Completed,
    Cancelled,
    /// Context switch gave up with user windows still open; no restore ran.
    SwitchTimedOut,
}

/// Summary handed back to the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub matched: usize,
    pub launched: usize,
    pub closed: usize,
    pub status: RestoreStatus,
}

impl RestoreOutcome {
    fn new() -> Self {
        Self {
            matched: 0,
            launched: 0,
            closed: 0,
            status: RestoreStatus::Completed,
        }
    }

    fn with_status(mut self, status: RestoreStatus) -> Self {
        self.status = status;
        self
    }
}

/// Drives matching, launching, and repositioning against a live desktop.
pub struct RestoreEngine {
    windows: Arc<dyn WindowSystem>,
    launcher: Arc<dyn Launcher>,
}

impl RestoreEngine {
    pub fn new(windows: Arc<dyn WindowSystem>, launcher: Arc<dyn Launcher>) -> Self {
        Self { windows, launcher }
    }

    /// Run the five-phase restore for a snapshot.
    pub async fn restore(
        &self,
        snapshot: &mut WorkspaceSnapshot,
        cancel: &CancellationToken,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RestoreOutcome> {
        let mut outcome = RestoreOutcome::new();
        let mut state = MatchState::default();

        // Phase 1: windows that are already on screen.
        if cancel.is_cancelled() {
            return Ok(outcome.with_status(RestoreStatus::Cancelled));
        }
        emit(progress, Progress::RestorePhase { phase: 1 });
        let live = self.live_windows();
        let pairs = matching::run_pass(&snapshot.entries, &live, &mut state);
        outcome.matched += self.reposition_pairs(snapshot, &pairs);

        // Phase 2: open documents, launch missing applications.
        if cancel.is_cancelled() {
            return Ok(outcome.with_status(RestoreStatus::Cancelled));
        }
        emit(progress, Progress::RestorePhase { phase: 2 });
        outcome.launched = self.launch_missing(&snapshot.entries, &live, &mut state);
        if outcome.launched == 0 {
            return Ok(outcome);
        }

        // Phase 3: give launched applications time to create windows.
        emit(progress, Progress::RestorePhase { phase: 3 });
        if !wait(cancel, APP_INIT_WAIT).await {
            return Ok(outcome.with_status(RestoreStatus::Cancelled));
        }

        // Phase 4: match whatever appeared.
        emit(progress, Progress::RestorePhase { phase: 4 });
        let live = self.live_windows();
        let pairs = matching::run_pass(&snapshot.entries, &live, &mut state);
        outcome.matched += self.reposition_pairs(snapshot, &pairs);

        // Phase 5: slow starters get one more chance.
        emit(progress, Progress::RestorePhase { phase: 5 });
        if !wait(cancel, SLOW_START_WAIT).await {
            return Ok(outcome.with_status(RestoreStatus::Cancelled));
        }
        let live = self.live_windows();
        let pairs = matching::run_pass(&snapshot.entries, &live, &mut state);
        outcome.matched += self.reposition_pairs(snapshot, &pairs);

        Ok(outcome)
    }

    /// Close everything, wait for the desktop to empty, then restore.
    ///
    /// Aborts without restoring when windows are still open at the timeout
    /// (a save-confirmation dialog, usually).
    pub async fn switch(
        &self,
        snapshot: &mut WorkspaceSnapshot,
        cancel: &CancellationToken,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RestoreOutcome> {
        let mut outcome = RestoreOutcome::new();
        if cancel.is_cancelled() {
            return Ok(outcome.with_status(RestoreStatus::Cancelled));
        }

        outcome.closed = window::close_user_windows(self.windows.as_ref());
        log::info!("context switch: close requested for {} windows", outcome.closed);

        let mut remaining_polls = (CLOSE_TIMEOUT.as_millis() / CLOSE_POLL_INTERVAL.as_millis()) as u32;
        let mut last_reported = usize::MAX;
        loop {
            let remaining = window::count_user_windows(self.windows.as_ref());
            if remaining != last_reported {
                emit(progress, Progress::ClosingWindows { remaining });
                last_reported = remaining;
            }
            if remaining == 0 {
                break;
            }
            if remaining_polls == 0 {
                log::warn!(
                    "context switch aborted: {} window(s) still open after {:?}",
                    remaining,
                    CLOSE_TIMEOUT
                );
                return Ok(outcome.with_status(RestoreStatus::SwitchTimedOut));
            }
            remaining_polls -= 1;
            if !wait(cancel, CLOSE_POLL_INTERVAL).await {
                return Ok(outcome.with_status(RestoreStatus::Cancelled));
            }
        }

        let restored = self.restore(snapshot, cancel, progress).await?;
        Ok(RestoreOutcome {
            closed: outcome.closed,
            ..restored
        })
    }

    /// Projection of a snapshot onto a monitor-id subset. `None` keeps
    /// everything.
    pub fn select_monitors(
        snapshot: &WorkspaceSnapshot,
        monitor_ids: Option<&HashSet<String>>,
    ) -> WorkspaceSnapshot {
        let Some(ids) = monitor_ids else {
            return snapshot.clone();
        };
        let mut projected = snapshot.clone();
        projected.monitors.retain(|m| ids.contains(&m.monitor_id));
        projected.entries.retain(|e| ids.contains(&e.monitor_id));
        projected
    }

    fn live_windows(&self) -> Vec<LiveWindow> {
        window::list_user_windows(self.windows.as_ref())
            .iter()
            .map(LiveWindow::from_raw)
            .collect()
    }

    fn reposition_pairs(
        &self,
        snapshot: &mut WorkspaceSnapshot,
        pairs: &[(usize, crate::platform::WindowHandle)],
    ) -> usize {
        for (index, handle) in pairs {
            let entry = &mut snapshot.entries[*index];
            entry.was_restored = true;
            if let Err(err) = window::apply_record(self.windows.as_ref(), *handle, &entry.position)
            {
                log::warn!(
                    "repositioning '{}' failed: {}",
                    entry.position.title_snippet,
                    err
                );
            }
        }
        pairs.len()
    }

    /// Phase 2. Documents go through the shell association; bare
    /// applications are spawned directly. A bare application whose
    /// executable also has a document entry pending is not launched at all:
    /// the document open would be routed into the bare instance and consume
    /// its window slot.
    fn launch_missing(
        &self,
        entries: &[WorkspaceEntry],
        live: &[LiveWindow],
        state: &mut MatchState,
    ) -> usize {
        // Pre-scan: which executables still owe us a document window?
        let mut pending_doc_exes: HashSet<String> = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if state.restored.contains(&index) || entry.launch_arg.is_none() {
                continue;
            }
            if matching::document_open_anywhere(entry, live) {
                // Right document already open somewhere; nothing to launch.
                state.doc_matched.insert(index);
                continue;
            }
            if !entry.executable_path.is_empty() {
                pending_doc_exes.insert(entry.executable_path.to_lowercase());
            }
        }

        let mut launched = 0;

        // Documents, in snapshot order.
        for (index, entry) in entries.iter().enumerate() {
            if state.restored.contains(&index) || state.doc_matched.contains(&index) {
                continue;
            }
            let Some(arg) = &entry.launch_arg else {
                continue;
            };
            if entry.executable_path.is_empty() {
                log::info!(
                    "skipping launch for '{}': executable path unknown",
                    entry.position.title_snippet
                );
                continue;
            }
            let result = if DIRECT_LAUNCH_EDITORS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&entry.process_name))
            {
                self.launcher
                    .spawn(&entry.executable_path, &[arg.clone()])
            } else {
                self.launcher.shell_open(arg)
            };
            match result {
                Ok(()) => launched += 1,
                Err(err) => log::warn!("opening '{}' failed: {}", arg, err),
            }
        }

        // Bare applications.
        for (index, entry) in entries.iter().enumerate() {
            if state.restored.contains(&index) || entry.launch_arg.is_some() {
                continue;
            }
            if entry.executable_path.is_empty() {
                log::info!(
                    "skipping launch for '{}': executable path unknown",
                    entry.position.title_snippet
                );
                continue;
            }
            let exe_lc = entry.executable_path.to_lowercase();
            let already_running = live
                .iter()
                .any(|w| w.executable_path.eq_ignore_ascii_case(&entry.executable_path));
            if already_running {
                continue;
            }
            if pending_doc_exes.contains(&exe_lc) {
                // The document launch will produce this executable's window.
                continue;
            }
            let args = session_restore_args(&entry.process_name);
            match self.launcher.spawn(&entry.executable_path, &args) {
                Ok(()) => launched += 1,
                Err(err) => {
                    log::warn!("launching '{}' failed: {}", entry.executable_path, err)
                }
            }
        }
        launched
    }
}

/// Browsers relaunched without a document get their last session back.
fn session_restore_args(process_name: &str) -> Vec<String> {
    if SESSION_RESTORE_BROWSERS
        .iter()
        .any(|b| b.eq_ignore_ascii_case(process_name))
    {
        vec![SESSION_RESTORE_ARG.to_string()]
    } else {
        Vec::new()
    }
}

/// Cancellation-aware sleep. Returns `false` when cancelled.
async fn wait(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
