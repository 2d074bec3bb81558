//! Incremental re-evaluation of a statement-oriented document.
//!
//! The engine keeps one [`Checkpoint`] per statement terminator and, after an
//! edit, re-runs only the statements that can have changed:
//!
//! 1. [`DebounceScheduler`] coalesces edit bursts into one pass position.
//! 2. [`Session::begin_pass`] resolves the anchor (the last safe, non-error
//!    checkpoint before the edit), truncates everything after it and names
//!    the position the host should send source text from.
//! 3. [`Session::complete_pass`] scans that text, replays new statements
//!    against the [`Evaluator`] and streams formatted output.
//!
//! Everything here is sans-IO. The worker owns the timers and the host
//! round-trip between the two pass halves.

pub mod anchor;
pub mod boundary;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod marker;
pub mod outbox;
pub mod scan;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use anchor::Anchor;
pub use cache::{CacheEpoch, Checkpoint, CheckpointCache, CheckpointKind};
pub use error::{PassError, SettingsError};
pub use evaluator::{Binding, EvalError, Evaluator, Outcome, Warning, WarningKind};
pub use marker::MarkerPool;
pub use outbox::Outbox;
pub use scan::{TERMINATOR, Terminator, TerminatorScanner};
pub use scheduler::{DEFAULT_DEBOUNCE, DebounceScheduler, EditDecision};
pub use session::{PassPlan, PassReport, Session};
pub use settings::{FaultPolicy, Settings};
