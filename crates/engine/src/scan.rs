//! Terminator scanning.
//!
//! This is a conservative first pass: every terminator character is reported,
//! including ones inside strings or comments. The evaluator decides whether the
//! text up to a terminator is a complete statement.

use std::str::CharIndices;

use reval_primitives::Position;

/// Statement terminator.
pub const TERMINATOR: char = ';';

/// A terminator found in scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminator {
	/// Byte offset of the terminator within the scanned text.
	pub offset: usize,
	/// Document position of the terminator.
	pub at: Position,
}

/// Yields every terminator in `text`, which starts at document position `start`.
#[derive(Debug, Clone)]
pub struct TerminatorScanner<'a> {
	chars: CharIndices<'a>,
	line: u32,
	column: u32,
}

impl<'a> TerminatorScanner<'a> {
	pub fn new(text: &'a str, start: Position) -> Self {
		Self {
			chars: text.char_indices(),
			line: start.line,
			column: start.column,
		}
	}
}

impl Iterator for TerminatorScanner<'_> {
	type Item = Terminator;

	fn next(&mut self) -> Option<Terminator> {
		for (offset, ch) in self.chars.by_ref() {
			match ch {
				'\n' => {
					self.line += 1;
					self.column = 0;
				}
				TERMINATOR => {
					let at = Position::new(self.line, self.column);
					self.column += 1;
					return Some(Terminator { offset, at });
				}
				_ => self.column += 1,
			}
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scan(text: &str, start: Position) -> Vec<(usize, Position)> {
		TerminatorScanner::new(text, start).map(|t| (t.offset, t.at)).collect()
	}

	#[test]
	fn single_line() {
		assert_eq!(
			scan("1;2;3;", Position::ZERO),
			[(1, Position::new(0, 1)), (3, Position::new(0, 3)), (5, Position::new(0, 5))]
		);
	}

	#[test]
	fn start_column_applies_to_first_line_only() {
		assert_eq!(
			scan("a;\nbb;", Position::new(4, 10)),
			[(1, Position::new(4, 11)), (5, Position::new(5, 2))]
		);
	}

	#[test]
	fn columns_count_chars_not_bytes() {
		assert_eq!(scan("\"é\";", Position::ZERO), [(4, Position::new(0, 3))]);
	}

	#[test]
	fn no_terminator() {
		assert!(scan("val x = 1\n", Position::ZERO).is_empty());
	}
}
