use std::time::{Duration, Instant};

/// Quiet period observed on the search box before a term becomes active
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Delays raw input until no further input has arrived for `quiet`.
///
/// Each `input` restarts the timer and replaces the pending value, so only the
/// last value of a burst is ever emitted. The caller drives time explicitly
/// through `poll`, typically once per loop iteration.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<T>,
    last_input_time: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            last_input_time: None,
        }
    }

    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.last_input_time = Some(now);
    }

    /// Emit the pending value once the quiet period has fully elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.last_input_time = None;
        self.pending.take()
    }

    /// When the pending value will be emitted, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_input_time.map(|t| t + self.quiet)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_input_time = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}
