use serde::{Deserialize, Serialize};

use crate::Position;

/// An edit reported by the host.
///
/// `added` and `removed` hold the affected text split into lines, the way
/// editor change events report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditNotice {
	/// Start of the edit.
	pub pos: Position,
	/// Inserted text, one entry per line.
	#[serde(default)]
	pub added: Vec<String>,
	/// Removed text, one entry per line.
	#[serde(default)]
	pub removed: Vec<String>,
}

impl EditNotice {
	/// Creates a notice for a single-line insertion.
	pub fn insert(pos: Position, text: impl Into<String>) -> Self {
		Self {
			pos,
			added: vec![text.into()],
			removed: Vec::new(),
		}
	}

	/// Creates a notice for a single-line removal.
	pub fn remove(pos: Position, text: impl Into<String>) -> Self {
		Self {
			pos,
			added: Vec::new(),
			removed: vec![text.into()],
		}
	}

	/// Returns true if the inserted or removed text contains `ch`.
	pub fn touches(&self, ch: char) -> bool {
		self.added.iter().chain(&self.removed).any(|line| line.contains(ch))
	}
}
