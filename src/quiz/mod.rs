//! Quiz core: questions, the session state machine and the countdown.
//!
//! Nothing in here performs I/O. The [`crate::controller`] wires these pieces
//! to the question supply, the session store and the terminal.
//!
//! * [`question`]: decoding and shuffling raw supply records.
//! * [`session`]: the `Loading -> Active -> Finished` state machine.
//! * [`timer`]: a cancellable one-second countdown.

pub mod question;
pub mod session;
pub mod timer;

pub use question::{normalize, normalize_all, normalize_with, Question, RawQuestion};
pub use session::{Advance, Phase, QuizSession};
pub use timer::{format_clock, CancelToken, Countdown, TickOutcome, TICK_PERIOD};
