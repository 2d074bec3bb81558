//! Anchor resolution after an edit.
//!
//! The anchor is the last checkpoint that survives an edit unchanged; the base
//! is the checkpoint whose state the next evaluation starts from. Error
//! checkpoints are never either.

use reval_primitives::Position;

use crate::Checkpoint;
use crate::boundary::locate;

/// Result of resolving an edit position against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
	/// Last checkpoint to keep. `None` re-evaluates from the document start.
	pub anchor: Option<usize>,
	/// Nearest checkpoint at or before `anchor` holding a state. `None` starts
	/// from the evaluator's initial state.
	pub base: Option<usize>,
}

/// Walks back from `from` to the nearest non-error checkpoint.
pub fn find_non_error_anchor<S>(entries: &[Checkpoint<S>], from: Option<usize>) -> Option<usize> {
	from.and_then(|i| entries.get(..=i)?.iter().rposition(|cp| !cp.is_error()))
}

/// Walks back from `from` to the nearest checkpoint holding a state.
pub fn find_base_index<S>(entries: &[Checkpoint<S>], from: Option<usize>) -> Option<usize> {
	from.and_then(|i| entries.get(..=i)?.iter().rposition(|cp| cp.state.is_some()))
}

/// Resolves the anchor and base for an edit at `pos`.
///
/// Checkpoints between base and anchor are incomplete placeholders whose text
/// is re-read and folded into the next statement. That only works if nothing
/// between them changed the state, so a fault in that stretch pulls the anchor
/// back to the base.
pub fn resolve<S>(entries: &[Checkpoint<S>], pos: Position) -> Anchor {
	let raw = locate(entries, pos, |cp| cp.boundary);
	let mut anchor = find_non_error_anchor(entries, raw);
	let base = find_base_index(entries, anchor);

	if let Some(a) = anchor {
		let first_open = base.map_or(0, |b| b + 1);
		if entries[first_open..=a].iter().any(Checkpoint::is_error) {
			anchor = base;
		}
	}

	Anchor { anchor, base }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::CheckpointKind;

	fn at(column: u32) -> Position {
		Position::new(0, column)
	}

	fn ok(column: u32) -> Checkpoint<u8> {
		Checkpoint::success(at(column), 0, None, String::new(), 0)
	}

	fn err(column: u32, kind: CheckpointKind) -> Checkpoint<u8> {
		Checkpoint::error(kind, at(column), None, String::new())
	}

	#[test]
	fn empty_cache_starts_from_scratch() {
		let entries: Vec<Checkpoint<u8>> = Vec::new();
		assert_eq!(resolve(&entries, at(5)), Anchor { anchor: None, base: None });
	}

	#[test]
	fn skips_back_over_errors() {
		let entries = vec![
			ok(1),
			ok(3),
			err(5, CheckpointKind::Failure),
			err(7, CheckpointKind::Poisoned),
		];
		assert_eq!(
			resolve(&entries, at(20)),
			Anchor {
				anchor: Some(1),
				base: Some(1)
			}
		);
	}

	#[test]
	fn edit_on_terminator_discards_its_statement() {
		let entries = vec![ok(1), ok(3), ok(5)];
		assert_eq!(resolve(&entries, at(3)).anchor, Some(0));
		assert_eq!(resolve(&entries, at(4)).anchor, Some(1));
	}

	#[test]
	fn incomplete_placeholders_stay_anchored_on_earlier_base() {
		let entries = vec![ok(1), Checkpoint::incomplete(at(4)), Checkpoint::incomplete(at(6))];
		assert_eq!(
			resolve(&entries, at(10)),
			Anchor {
				anchor: Some(2),
				base: Some(0)
			}
		);
	}

	#[test]
	fn fault_between_base_and_anchor_pulls_anchor_back() {
		let entries = vec![ok(1), err(3, CheckpointKind::Fault), Checkpoint::incomplete(at(6))];
		assert_eq!(
			resolve(&entries, at(10)),
			Anchor {
				anchor: Some(0),
				base: Some(0)
			}
		);
	}

	#[test]
	fn leading_placeholder_without_base() {
		let entries = vec![Checkpoint::<u8>::incomplete(at(2))];
		assert_eq!(
			resolve(&entries, at(9)),
			Anchor {
				anchor: Some(0),
				base: None
			}
		);
	}
}
