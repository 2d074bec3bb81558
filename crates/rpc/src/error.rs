//! Error types for the message channel.

use thiserror::Error;

/// Errors raised while reading, writing or decoding messages.
#[derive(Debug, Error)]
pub enum Error {
	/// The underlying stream failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// A frame was not valid JSON or did not match the expected shape.
	#[error("malformed message: {0}")]
	Json(#[from] serde_json::Error),

	/// A well-formed frame carried a payload its type does not allow.
	#[error("protocol violation: {0}")]
	Protocol(String),
}

impl Error {
	/// Returns true if the error means the peer went away.
	pub fn is_disconnect(&self) -> bool {
		match self {
			Self::Io(err) => matches!(
				err.kind(),
				std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
			),
			_ => false,
		}
	}

	/// Returns true if the error concerns a single frame and the stream is still usable.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::Json(_) | Self::Protocol(_))
	}
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;
