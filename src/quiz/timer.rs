//! Countdown timer.
//!
//! The countdown is a schedulable task rather than a background thread: the
//! event loop asks [`Countdown::due_ticks`] how many one-second periods have
//! elapsed and applies each with [`Countdown::tick`]. Every start hands out a
//! fresh [`CancelToken`]; starting again or calling [`Countdown::stop`]
//! cancels the previous token, so a stray tick after a stop is a no-op.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use timed_quiz::quiz::timer::{Countdown, TickOutcome};
//!
//! let mut countdown = Countdown::new();
//! let mut remaining = 2;
//! let start = Instant::now();
//! countdown.start(start);
//!
//! assert_eq!(countdown.due_ticks(start + Duration::from_secs(1)), 1);
//! assert_eq!(countdown.tick(&mut remaining), TickOutcome::Running(1));
//! assert_eq!(countdown.tick(&mut remaining), TickOutcome::Expired);
//! assert_eq!(countdown.tick(&mut remaining), TickOutcome::Idle);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Cancellation token shared between a countdown run and its observers.
///
/// Clones share the same flag. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the run this token belongs to. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is not running; nothing changed.
    Idle,
    /// The clock was decremented and still has this many seconds left.
    Running(u32),
    /// The clock reached zero on this tick. The countdown has stopped itself.
    Expired,
}

impl TickOutcome {
    /// Whether the tick changed the clock (and therefore needs a redraw and a save).
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// A single repeating one-second countdown.
#[derive(Debug)]
pub struct Countdown {
    period: Duration,
    token: Option<CancelToken>,
    next_due: Option<Instant>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    /// Create a stopped countdown with the default one-second period.
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    /// Create a stopped countdown with a custom period.
    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            token: None,
            next_due: None,
        }
    }

    /// Start ticking from `now`. Any previous run is cancelled first.
    pub fn start(&mut self, now: Instant) -> CancelToken {
        self.stop();
        let token = CancelToken::new();
        self.token = Some(token.clone());
        self.next_due = Some(now + self.period);
        log::debug!("Countdown started");
        token
    }

    /// Cancel the current run. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
            log::debug!("Countdown stopped");
        }
        self.next_due = None;
    }

    /// Whether a run is active and not cancelled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Number of ticks that became due by `now`. Advances the schedule.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        if !self.is_running() {
            return 0;
        }
        let Some(due) = self.next_due else {
            return 0;
        };
        if now < due {
            return 0;
        }
        let behind = now.duration_since(due).as_nanos() / self.period.as_nanos();
        let ticks = u32::try_from(behind.saturating_add(1)).unwrap_or(u32::MAX);
        self.next_due = Some(due + self.period.saturating_mul(ticks));
        ticks
    }

    /// Time until the next tick, or `None` when stopped.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Apply one tick to `remaining`.
    ///
    /// Decrements the clock by one second. When it reaches zero the countdown
    /// stops itself and reports [`TickOutcome::Expired`], which therefore
    /// happens at most once per [`start`](Self::start).
    pub fn tick(&mut self, remaining: &mut u32) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        *remaining = remaining.saturating_sub(1);
        log::trace!("Countdown tick: {} s remaining", *remaining);
        if *remaining == 0 {
            self.stop();
            TickOutcome::Expired
        } else {
            TickOutcome::Running(*remaining)
        }
    }
}

/// Format seconds as a zero-padded `MM:SS` readout.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
