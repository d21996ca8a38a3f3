//! Workspace restoration: matching, launching, repositioning.

pub mod engine;
pub mod matching;

pub use engine::{RestoreEngine, RestoreOutcome, RestoreStatus};
pub use matching::{LiveWindow, MatchState};
