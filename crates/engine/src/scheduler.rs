//! Debounced scheduling of re-evaluation passes.
//!
//! The scheduler is sans-IO: callers pass in the current time and own the
//! actual timer. The worker sleeps until [`DebounceScheduler::deadline`] and
//! then calls [`DebounceScheduler::take_due`].
//!
//! # Coalescing
//!
//! The first relevant edit arms the quiescence timer. Every later edit, while
//! the timer is armed, re-arms it and lowers the recorded minimum position;
//! such edits are not relevance-checked because an earlier edit already
//! committed to a pass. When the timer expires the pass runs once, from the
//! smallest position seen.
//!
//! # Relevance
//!
//! With no pass pending, an edit that neither inserts nor removes a terminator
//! and lies strictly after the last known terminator cannot change any cached
//! statement. It is answered with a ping instead.

use std::time::{Duration, Instant};

use reval_primitives::{EditNotice, Position};
use tracing::trace;

use crate::TERMINATOR;

/// Default quiescence window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// What the scheduler did with an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditDecision {
	/// No re-evaluation needed; answer with a liveness ping.
	Ping,
	/// A pass is pending and will be due at `deadline`.
	Scheduled { deadline: Instant },
}

/// Coalesces edit bursts into single pass positions.
#[derive(Debug)]
pub struct DebounceScheduler {
	delay: Duration,
	deadline: Option<Instant>,
	min_pos: Option<Position>,
	/// Position of an abandoned pass, folded into the next scheduled one.
	backlog: Option<Position>,
}

impl Default for DebounceScheduler {
	fn default() -> Self {
		Self::new(DEFAULT_DEBOUNCE)
	}
}

impl DebounceScheduler {
	/// Creates an idle scheduler that waits `delay` after the last edit.
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			deadline: None,
			min_pos: None,
			backlog: None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// True while the quiescence timer is armed.
	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	/// When the pending pass becomes due.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Smallest position recorded for the pending pass.
	pub fn pending_position(&self) -> Option<Position> {
		self.min_pos
	}

	/// Records an edit.
	///
	/// `last_boundary` is the last terminator position currently cached.
	pub fn note_edit(&mut self, edit: &EditNotice, last_boundary: Option<Position>, now: Instant) -> EditDecision {
		if !self.is_pending() {
			let backlog = self.backlog.take();
			if backlog.is_none() && !is_relevant(edit, last_boundary) {
				trace!(pos = %edit.pos, "scheduler.irrelevant_edit");
				return EditDecision::Ping;
			}
			self.min_pos = backlog;
		}
		self.arm(edit.pos, now)
	}

	/// Schedules a pass from `pos` regardless of relevance.
	pub fn schedule(&mut self, pos: Position, now: Instant) -> EditDecision {
		if !self.is_pending() {
			self.min_pos = self.backlog.take();
		}
		self.arm(pos, now)
	}

	/// Returns the pass position once the timer has expired, clearing the
	/// scheduling state.
	pub fn take_due(&mut self, now: Instant) -> Option<Position> {
		let deadline = self.deadline?;
		if now < deadline {
			return None;
		}
		self.deadline = None;
		self.min_pos.take()
	}

	/// Hands back the position of a pass that was abandoned before it
	/// could rebuild the cache.
	///
	/// The next edit is then treated as relevant and the pass it triggers
	/// starts no later than `pos`.
	pub fn requeue(&mut self, pos: Position) {
		if self.is_pending() {
			self.min_pos = Some(lowest(self.min_pos, pos));
		} else {
			self.backlog = Some(lowest(self.backlog, pos));
		}
	}

	/// Drops any pending pass and backlog.
	pub fn reset(&mut self) {
		self.deadline = None;
		self.min_pos = None;
		self.backlog = None;
	}

	fn arm(&mut self, pos: Position, now: Instant) -> EditDecision {
		self.min_pos = Some(lowest(self.min_pos, pos));
		let deadline = now + self.delay;
		self.deadline = Some(deadline);
		trace!(min_pos = ?self.min_pos, "scheduler.armed");
		EditDecision::Scheduled { deadline }
	}
}

fn lowest(current: Option<Position>, pos: Position) -> Position {
	current.map_or(pos, |cur| cur.min(pos))
}

/// Returns true if `edit` can affect cached statements ending at or before `last_boundary`.
pub fn is_relevant(edit: &EditNotice, last_boundary: Option<Position>) -> bool {
	if edit.touches(TERMINATOR) {
		return true;
	}
	last_boundary.is_some_and(|last| edit.pos <= last)
}
