//! Display-change debouncing.
//!
//! Docking events arrive as bursts of display-change notifications. The
//! debouncer holds each burst for a settle interval; a new event cancels and
//! supersedes any pending or in-flight handler, so only the final topology
//! gets handled.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Interval a display event is held before its handler runs.
pub const DISPLAY_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Cancel-and-replace debouncer for display-change events.
pub struct DisplayChangeDebouncer {
    delay: Duration,
    current: Mutex<Option<CancellationToken>>,
}

impl DisplayChangeDebouncer {
    pub fn new() -> Self {
        Self::with_delay(DISPLAY_SETTLE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            current: Mutex::new(None),
        }
    }

    /// Register a display-change event.
    ///
    /// Cancels whatever the previous event scheduled, including a handler
    /// that already started running, then schedules `handler` after the
    /// settle delay.
    pub fn trigger<F, Fut>(&self, handler: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut current = self.current.lock().unwrap();
            if let Some(previous) = current.replace(token.clone()) {
                previous.cancel();
            }
        }
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = async {
                    tokio::time::sleep(delay).await;
                    handler().await;
                } => {}
            }
        });
    }

    /// Cancel any pending handler without scheduling a new one.
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().unwrap().take() {
            token.cancel();
        }
    }
}

impl Default for DisplayChangeDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
