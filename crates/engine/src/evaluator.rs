//! Capability interface for the language being evaluated.
//!
//! The engine knows nothing about the language itself. It hands statement
//! text and a prior state to an [`Evaluator`] and classifies what comes back:
//!
//! | Result | Meaning |
//! |---|---|
//! | `Err(EvalError::Incomplete)` | the fragment needs more text; keep accumulating |
//! | `Ok(Outcome::Success { .. })` | the statement ran; its state is a valid base |
//! | `Ok(Outcome::Fault { .. })` | the program raised; shown as an error |
//! | `Err(EvalError::Failure { .. })` | lexing/elaboration/etc. failed; poisons the rest of the pass |

use thiserror::Error;

use crate::Settings;

/// An external interpreter driven statement by statement.
pub trait Evaluator {
	/// Accumulated bindings after a statement.
	///
	/// States are cloned into checkpoints and reused as bases, so cloning
	/// should be cheap (typically an `Arc`).
	type State: Clone;

	/// Applies new settings and rebuilds the initial state.
	fn configure(&mut self, settings: &Settings);

	/// Evaluates `source` (terminator included) on top of `base`, or on top of
	/// the initial state when `base` is `None`.
	fn evaluate(&mut self, base: Option<&Self::State>, source: &str) -> Result<Outcome<Self::State>, EvalError>;

	/// Describes what `state` introduced on top of `base` (the initial state when `None`).
	fn bindings_since(&self, base: Option<&Self::State>, state: &Self::State) -> Vec<Binding>;
}

/// A statement that ran to completion, successfully or not.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<S> {
	/// The statement evaluated without raising.
	Success {
		/// State including this statement's bindings.
		state: S,
		/// Warnings and printed output.
		warnings: Vec<Warning>,
	},
	/// The evaluated program raised an uncaught exception.
	Fault {
		/// State after the fault, if the evaluator can report one.
		state: Option<S>,
		/// Rendered exception.
		message: String,
		/// Warnings and printed output produced before the fault.
		warnings: Vec<Warning>,
	},
}

/// Failures raised by the evaluator itself rather than by the evaluated program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
	/// The fragment is not a full statement yet.
	#[error("incomplete statement")]
	Incomplete,

	/// Lexing, parsing, elaboration or another evaluator-side failure.
	#[error("{kind}: {message}")]
	Failure {
		/// Short failure class, e.g. `ParseError`.
		kind: String,
		/// Human readable detail.
		message: String,
	},
}

impl EvalError {
	/// Creates a failure.
	pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Failure {
			kind: kind.into(),
			message: message.into(),
		}
	}
}

/// Non-fatal diagnostics attached to a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
	/// Whether this is a diagnostic or printed output.
	pub kind: WarningKind,
	/// Text shown after the kind's label.
	pub message: String,
}

/// Label a [`Warning`] is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
	/// A diagnostic about the statement.
	Warn,
	/// Output the statement printed.
	Printed,
}

impl Warning {
	/// A `WARN:` diagnostic.
	pub fn warn(message: impl Into<String>) -> Self {
		Self {
			kind: WarningKind::Warn,
			message: message.into(),
		}
	}

	/// A `Printed:` line.
	pub fn printed(message: impl Into<String>) -> Self {
		Self {
			kind: WarningKind::Printed,
			message: message.into(),
		}
	}
}

/// One entry introduced by a statement, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
	/// A single name, e.g. `val x = 1 : int`.
	Value {
		/// Introducing keyword (`val`, `con`, `exn`, `type`, ...).
		keyword: String,
		/// Bound name.
		name: String,
		/// Rendered value, absent when evaluation is disabled or not applicable.
		value: Option<String>,
		/// Rendered type, absent when elaboration is disabled.
		ty: Option<String>,
	},
	/// A named group of bindings, e.g. a structure.
	Group {
		/// Introducing keyword, e.g. `structure`.
		keyword: String,
		/// Name of the group.
		name: String,
		/// Bindings inside the group, rendered indented.
		members: Vec<Binding>,
	},
}

impl Binding {
	/// Shorthand for a `val` binding.
	pub fn val(name: impl Into<String>, value: Option<String>, ty: Option<String>) -> Self {
		Self::Value {
			keyword: "val".into(),
			name: name.into(),
			value,
			ty,
		}
	}
}
