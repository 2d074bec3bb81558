//! Statement boundary lookup.

use reval_primitives::Position;

/// Returns the index of the last boundary strictly before `pos`.
///
/// A boundary exactly at `pos` is not counted: an edit touching a terminator
/// invalidates the statement that terminator closes. `None` means no
/// statement ends before `pos`.
///
/// `entries` must be sorted by `boundary`.
pub fn locate<T>(entries: &[T], pos: Position, boundary: impl Fn(&T) -> Position) -> Option<usize> {
	entries.partition_point(|entry| boundary(entry) < pos).checked_sub(1)
}
