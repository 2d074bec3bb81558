//! Per-statement checkpoint cache.
//!
//! One append/truncate-only sequence of [`Checkpoint`]s, each carrying the
//! terminator position it ends at. Boundaries and cached results cannot drift
//! out of alignment because they live in the same record.

use std::fmt;

use reval_primitives::{MarkerId, Position};

use crate::boundary;

/// Generation counter for the cache contents.
///
/// Advanced whenever a pass is planned or the cache is cleared, so results
/// computed against an older generation can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct CacheEpoch(u64);

impl CacheEpoch {
	pub(crate) fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}
}

impl fmt::Display for CacheEpoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// How the statement ending at a checkpoint fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
	/// Evaluated successfully; `ordinal` counts successes for alternating styling.
	Success { ordinal: u64 },
	/// The terminator did not end a full statement. Placeholder without output.
	Incomplete,
	/// The evaluated program raised.
	Fault,
	/// The evaluator failed on this statement.
	Failure,
	/// Skipped because an earlier statement in the same pass failed.
	Poisoned,
}

/// Cached result for one statement.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
	/// Position of the terminator closing the statement.
	pub boundary: Position,
	/// Evaluation state after the statement. Present only for successes.
	pub state: Option<S>,
	/// Annotation covering the statement, if one was requested.
	pub marker: Option<MarkerId>,
	/// Host-ready output for the statement.
	pub output: String,
	/// How the statement fared.
	pub kind: CheckpointKind,
}

impl<S> Checkpoint<S> {
	/// Creates the record of a successful statement and the state it produced.
	pub fn success(boundary: Position, state: S, marker: Option<MarkerId>, output: String, ordinal: u64) -> Self {
		Self {
			boundary,
			state: Some(state),
			marker,
			output,
			kind: CheckpointKind::Success { ordinal },
		}
	}

	/// Creates a placeholder for a terminator that did not close a statement.
	pub fn incomplete(boundary: Position) -> Self {
		Self {
			boundary,
			state: None,
			marker: None,
			output: String::new(),
			kind: CheckpointKind::Incomplete,
		}
	}

	/// Creates an error record of the given kind.
	///
	/// # Panics
	///
	/// Debug builds panic if `kind` is not an error kind.
	pub fn error(kind: CheckpointKind, boundary: Position, marker: Option<MarkerId>, output: String) -> Self {
		debug_assert!(matches!(
			kind,
			CheckpointKind::Fault | CheckpointKind::Failure | CheckpointKind::Poisoned
		));
		Self {
			boundary,
			state: None,
			marker,
			output,
			kind,
		}
	}

	/// True for faults, failures and poisoned statements.
	pub fn is_error(&self) -> bool {
		matches!(
			self.kind,
			CheckpointKind::Fault | CheckpointKind::Failure | CheckpointKind::Poisoned
		)
	}

	/// Alternation ordinal of a success, `None` for every other kind.
	pub fn success_ordinal(&self) -> Option<u64> {
		match self.kind {
			CheckpointKind::Success { ordinal } => Some(ordinal),
			_ => None,
		}
	}
}

/// Ordered checkpoints for the statements of one document.
#[derive(Debug)]
pub struct CheckpointCache<S> {
	entries: Vec<Checkpoint<S>>,
	epoch: CacheEpoch,
}

impl<S> Default for CheckpointCache<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S> CheckpointCache<S> {
	/// Creates an empty cache at the initial epoch.
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
			epoch: CacheEpoch::default(),
		}
	}

	/// Number of cached checkpoints, one per terminator seen.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Checkpoint at `index`, if cached.
	pub fn get(&self, index: usize) -> Option<&Checkpoint<S>> {
		self.entries.get(index)
	}

	/// Every cached checkpoint in document order.
	pub fn entries(&self) -> &[Checkpoint<S>] {
		&self.entries
	}

	/// Current generation of the contents.
	pub fn epoch(&self) -> CacheEpoch {
		self.epoch
	}

	/// Terminator position of the last cached statement.
	pub fn last_boundary(&self) -> Option<Position> {
		self.entries.last().map(|cp| cp.boundary)
	}

	/// Index of the last checkpoint strictly before `pos`.
	pub fn locate(&self, pos: Position) -> Option<usize> {
		boundary::locate(&self.entries, pos, |cp| cp.boundary)
	}

	/// Appends a checkpoint at the tail.
	///
	/// # Panics
	///
	/// Debug builds panic if `checkpoint` does not end after the current tail.
	pub fn push(&mut self, checkpoint: Checkpoint<S>) {
		debug_assert!(
			self.last_boundary().is_none_or(|last| last < checkpoint.boundary),
			"checkpoint boundaries must be strictly increasing"
		);
		self.entries.push(checkpoint);
	}

	/// Keeps the first `len` checkpoints and returns the removed tail.
	pub fn truncate(&mut self, len: usize) -> Vec<Checkpoint<S>> {
		if len >= self.entries.len() {
			return Vec::new();
		}
		self.entries.split_off(len)
	}

	/// Removes every checkpoint and advances the epoch.
	pub fn clear(&mut self) -> Vec<Checkpoint<S>> {
		self.advance_epoch();
		std::mem::take(&mut self.entries)
	}

	/// Concatenated output of every cached checkpoint.
	pub fn known_output(&self) -> String {
		self.entries.iter().map(|cp| cp.output.as_str()).collect()
	}

	pub(crate) fn advance_epoch(&mut self) -> CacheEpoch {
		self.epoch = self.epoch.next();
		self.epoch
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn success(line: u32, column: u32, ordinal: u64) -> Checkpoint<u32> {
		Checkpoint::success(Position::new(line, column), 0, None, format!("out{ordinal}"), ordinal)
	}

	#[test]
	fn truncate_returns_tail_in_order() {
		let mut cache = CheckpointCache::new();
		for i in 0..4 {
			cache.push(success(0, i * 2, u64::from(i)));
		}
		let removed = cache.truncate(1);
		assert_eq!(cache.len(), 1);
		let columns: Vec<_> = removed.iter().map(|cp| cp.boundary.column).collect();
		assert_eq!(columns, [2, 4, 6]);
		assert!(cache.truncate(5).is_empty());
	}

	#[test]
	fn clear_advances_epoch() {
		let mut cache = CheckpointCache::new();
		cache.push(success(0, 1, 0));
		let before = cache.epoch();
		assert_eq!(cache.clear().len(), 1);
		assert!(cache.is_empty());
		assert_ne!(cache.epoch(), before);
	}

	#[test]
	fn error_kinds() {
		let p = Position::ZERO;
		assert!(Checkpoint::<u32>::error(CheckpointKind::Fault, p, None, String::new()).is_error());
		assert!(Checkpoint::<u32>::error(CheckpointKind::Poisoned, p, None, String::new()).is_error());
		assert!(!Checkpoint::<u32>::incomplete(p).is_error());
		assert!(!success(0, 0, 3).is_error());
		assert_eq!(success(0, 0, 3).success_ordinal(), Some(3));
	}

	#[test]
	fn known_output_concatenates() {
		let mut cache = CheckpointCache::new();
		cache.push(success(0, 1, 0));
		cache.push(Checkpoint::incomplete(Position::new(0, 3)));
		cache.push(success(1, 0, 1));
		assert_eq!(cache.known_output(), "out0out1");
	}
}
