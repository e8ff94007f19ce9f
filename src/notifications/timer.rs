//! Cancellable correlation timer.
//!
//! Each pending gift correlation owns one [`CorrelationTimer`]. The timer
//! only records a deadline and its lifecycle; the owning driver sleeps
//! until the earliest deadline and asks which timers are due.

use tokio::time::Instant;

/// Lifecycle of a correlation timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// Waiting for its deadline.
    Armed(Instant),
    /// The deadline passed and the entry was finalized.
    Fired,
    /// Stopped before the deadline.
    Cancelled,
}

/// A rearmable, cancellable deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrelationTimer {
    state: TimerState,
}

impl CorrelationTimer {
    /// A timer armed for `deadline`.
    #[must_use]
    pub fn armed(deadline: Instant) -> Self {
        Self {
            state: TimerState::Armed(deadline),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// The deadline, while armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Armed(deadline) => Some(deadline),
            _ => None,
        }
    }

    /// Move the deadline. Has no effect once fired or cancelled.
    pub fn rearm(&mut self, deadline: Instant) {
        if let TimerState::Armed(_) = self.state {
            self.state = TimerState::Armed(deadline);
        }
    }

    /// Stop the timer. Returns `true` if it was armed.
    pub fn cancel(&mut self) -> bool {
        let was_armed = matches!(self.state, TimerState::Armed(_));
        if was_armed {
            self.state = TimerState::Cancelled;
        }
        was_armed
    }

    /// Whether the timer is armed and its deadline has passed.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.state, TimerState::Armed(deadline) if deadline <= now)
    }

    /// Mark the timer fired if it is due. Returns `true` exactly once.
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.state = TimerState::Fired;
            true
        } else {
            false
        }
    }
}
