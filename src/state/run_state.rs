//! Lifecycle of a single crawl run
//!
//! A run starts `Running`, moves to `Draining` once it stops accepting new
//! work, and ends `Done` after the already-reported results have been
//! collected.

use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Visit tasks are outstanding or new work may still be dispatched
    Running,

    /// No new work is dispatched; in-flight results are being collected
    Draining,

    /// Terminal: pages and errors have been handed back to the caller
    Done,
}

/// Why a run left the `Running` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionReason {
    /// No page was reported for one full quiescence window
    Idle,

    /// Every dispatched visit task finished and nothing is left to dispatch
    Exhausted,

    /// The caller's cancellation signal was raised
    Cancelled,
}

impl RunState {
    /// Returns true if the transition from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Draining) | (Self::Draining, Self::Done)
        )
    }

    /// Moves the run to `next`, returning false if the transition is invalid
    pub fn advance(&mut self, next: RunState) -> bool {
        if !self.can_transition_to(next) {
            tracing::warn!("Invalid run state transition: {} -> {}", self, next);
            return false;
        }

        tracing::debug!("Run state: {} -> {}", self, next);
        *self = next;
        true
    }

    /// Returns true while new visit tasks may be dispatched
    pub fn accepts_work(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle window elapsed",
            Self::Exhausted => "no outstanding work",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
