//! Persistent evaluation states.
//!
//! A state is a chain of frames, newest first, each binding one name. Frames
//! are shared between states through `Arc`, so extending a state never copies
//! it and cloning one is a pointer copy. Frame ids grow monotonically, which
//! lets [`State::since`] find where a derived state branched off its base.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
	Int,
	Str,
	Unit,
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Int => "int",
			Self::Str => "string",
			Self::Unit => "unit",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	Int(i64),
	Str(String),
	Unit,
}

impl Value {
	pub fn ty(&self) -> Type {
		match self {
			Self::Int(_) => Type::Int,
			Self::Str(_) => Type::Str,
			Self::Unit => Type::Unit,
		}
	}

	/// Text written by `print`.
	pub fn printed(&self) -> String {
		match self {
			Self::Str(s) => s.clone(),
			other => other.to_string(),
		}
	}
}

/// Source-like rendering: negative numbers use `~`, strings are quoted.
impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(n) if *n < 0 => write!(f, "~{}", n.unsigned_abs()),
			Self::Int(n) => write!(f, "{n}"),
			Self::Str(s) => {
				f.write_str("\"")?;
				for c in s.chars() {
					match c {
						'"' => f.write_str("\\\"")?,
						'\\' => f.write_str("\\\\")?,
						'\n' => f.write_str("\\n")?,
						'\t' => f.write_str("\\t")?,
						c => write!(f, "{c}")?,
					}
				}
				f.write_str("\"")
			}
			Self::Unit => f.write_str("()"),
		}
	}
}

/// What a name is bound to.
#[derive(Debug, Clone)]
pub enum Item {
	/// `ty` is absent without elaboration, `value` without evaluation.
	Value { ty: Option<Type>, value: Option<Value> },
	Structure(State),
}

#[derive(Debug)]
struct Frame {
	id: u64,
	name: String,
	item: Item,
	parent: State,
}

/// Bindings in scope after a statement.
#[derive(Debug, Clone, Default)]
pub struct State {
	head: Option<Arc<Frame>>,
}

impl State {
	/// Id of the newest frame, 0 for the empty state.
	pub fn id(&self) -> u64 {
		self.head.as_ref().map_or(0, |frame| frame.id)
	}

	pub fn is_empty(&self) -> bool {
		self.head.is_none()
	}

	pub(crate) fn bind(&self, id: u64, name: impl Into<String>, item: Item) -> Self {
		Self {
			head: Some(Arc::new(Frame {
				id,
				name: name.into(),
				item,
				parent: self.clone(),
			})),
		}
	}

	/// Newest binding of `name`.
	pub fn lookup(&self, name: &str) -> Option<&Item> {
		self.frames().find(|frame| frame.name == name).map(|frame| &frame.item)
	}

	/// Bindings added on top of `base`, oldest first.
	///
	/// If `base` is not an ancestor the whole chain is returned.
	pub fn since(&self, base: &State) -> Vec<(&str, &Item)> {
		let stop = base.id();
		let mut added: Vec<_> = self
			.frames()
			.take_while(|frame| frame.id != stop)
			.map(|frame| (frame.name.as_str(), &frame.item))
			.collect();
		added.reverse();
		added
	}

	fn frames(&self) -> impl Iterator<Item = &Frame> {
		std::iter::successors(self.head.as_deref(), |frame| frame.parent.head.as_deref())
	}
}

/// Unlinks uniquely owned frames one at a time so long chains do not drop
/// recursively.
impl Drop for State {
	fn drop(&mut self) {
		let mut next = self.head.take();
		while let Some(frame) = next {
			next = Arc::into_inner(frame).and_then(|mut frame| frame.parent.head.take());
		}
	}
}
