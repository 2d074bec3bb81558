use std::fmt;

use serde::{Deserialize, Serialize};

/// A document coordinate in line/column form.
///
/// Ordering compares `line` first, then `column`, which is exactly the order
/// of the characters in the document. Columns count Unicode scalar values
/// within the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
	/// Zero-based line index.
	pub line: u32,
	/// Zero-based column within the line.
	#[serde(rename = "ch")]
	pub column: u32,
}

impl Position {
	/// The start of the document.
	pub const ZERO: Self = Self::new(0, 0);

	/// Creates a new position.
	pub const fn new(line: u32, column: u32) -> Self {
		Self { line, column }
	}

	/// Returns the position `n` columns further along the same line.
	#[must_use]
	pub const fn advance_columns(self, n: u32) -> Self {
		Self {
			line: self.line,
			column: self.column.saturating_add(n),
		}
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}
