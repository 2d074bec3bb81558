//! Evaluator-side failures.

use reval_engine::EvalError;
use thiserror::Error;

/// Why a statement could not be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// More text is needed before the statement can be parsed.
	#[error("incomplete statement")]
	Incomplete,

	#[error("{0}")]
	Lex(String),

	#[error("{0}")]
	Parse(String),

	/// Static checking rejected the statement.
	#[error("{0}")]
	Elaboration(String),

	/// A name or type problem found while running with elaboration disabled.
	#[error("{0}")]
	Evaluation(String),
}

impl Error {
	/// Failure class shown to the user.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Incomplete => "Incomplete",
			Self::Lex(_) => "LexerError",
			Self::Parse(_) => "ParseError",
			Self::Elaboration(_) => "ElaborationError",
			Self::Evaluation(_) => "EvaluationError",
		}
	}
}

impl From<Error> for EvalError {
	fn from(err: Error) -> Self {
		match err {
			Error::Incomplete => EvalError::Incomplete,
			other => EvalError::failure(other.kind(), other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
