//! Duration budgets and cooperative cancellation

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Cooperative stop request shared between a run and its caller
///
/// The run checks the signal between stages and while waiting for section
/// reviews; a stage that has started is never interrupted half way.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the run to stop
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether a stop was requested
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop is requested
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft and hard deadlines of one run
#[derive(Debug, Clone, Copy)]
pub struct RunBudget {
    started: Instant,
    soft: Duration,
    hard: Duration,
}

impl RunBudget {
    /// Start the clock
    pub fn start(soft: Duration, hard: Duration) -> Self {
        Self {
            started: Instant::now(),
            soft,
            hard,
        }
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the soft budget is spent
    pub fn soft_exceeded(&self) -> bool {
        self.elapsed() > self.soft
    }

    /// Whether the hard budget is spent
    pub fn hard_exceeded(&self) -> bool {
        self.elapsed() >= self.hard
    }

    /// Time left before the hard deadline
    pub fn remaining(&self) -> Duration {
        self.hard.saturating_sub(self.elapsed())
    }

    /// Instant of the hard deadline
    pub fn hard_deadline(&self) -> tokio::time::Instant {
        tokio::time::Instant::from_std(self.started + self.hard)
    }
}
