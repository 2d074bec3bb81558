//! Typed messages for both directions of the host channel.
//!
//! Every frame is an [`Envelope`]. Payload-less messages carry an empty
//! string as `data`, which is also what is accepted from the host.

use reval_primitives::{EditNotice, MarkerId, MarkerStyle, Position};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Error, Result};

/// Raw wire frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	/// Message type tag.
	#[serde(rename = "type")]
	pub kind: String,
	/// Type-specific payload.
	#[serde(default)]
	pub data: Value,
}

impl Envelope {
	/// Creates an envelope.
	pub fn new(kind: impl Into<String>, data: Value) -> Self {
		Self { kind: kind.into(), data }
	}

	/// Creates an envelope without payload.
	pub fn bare(kind: impl Into<String>) -> Self {
		Self::new(kind, Value::String(String::new()))
	}
}

/// Messages sent by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
	/// Replacement evaluator settings, either a JSON string or an inline object.
	Settings(Value),
	/// An edit happened in the document.
	Interpret(EditNotice),
	/// Drop every cached checkpoint and marker.
	Clear,
	/// Response to a [`CoreMessage::GetCode`] request.
	Code(String),
	/// Resume reacting to edits.
	Enable,
	/// Stop reacting to edits and drop the cache.
	Disable,
}

impl HostMessage {
	/// Decodes a host frame.
	///
	/// Unknown message types decode to `Ok(None)` so newer hosts can talk to
	/// older workers.
	pub fn decode(env: Envelope) -> Result<Option<Self>> {
		let msg = match env.kind.as_str() {
			"settings" => Self::Settings(env.data),
			"interpret" => Self::Interpret(serde_json::from_value(env.data)?),
			"clear" => Self::Clear,
			"code" => match env.data {
				Value::String(code) => Self::Code(code),
				Value::Null => Self::Code(String::new()),
				other => return Err(Error::Protocol(format!("code payload must be a string, got {other}"))),
			},
			"enable" => Self::Enable,
			"disable" => Self::Disable,
			other => {
				tracing::debug!(kind = other, "rpc.host.unknown_type");
				return Ok(None);
			}
		};
		Ok(Some(msg))
	}

	/// Encodes the message into a frame.
	pub fn encode(&self) -> Envelope {
		match self {
			Self::Settings(settings) => Envelope::new("settings", settings.clone()),
			Self::Interpret(edit) => Envelope::new(
				"interpret",
				json!({ "pos": edit.pos, "added": edit.added, "removed": edit.removed }),
			),
			Self::Clear => Envelope::bare("clear"),
			Self::Code(code) => Envelope::new("code", Value::String(code.clone())),
			Self::Enable => Envelope::bare("enable"),
			Self::Disable => Envelope::bare("disable"),
		}
	}
}

/// Request to annotate a document range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkText {
	/// Start of the range (inclusive).
	pub from: Position,
	/// End of the range, just past the terminator.
	pub to: Position,
	/// Visual class.
	pub style: MarkerStyle,
	/// Handle used to clear the annotation later.
	pub id: MarkerId,
}

/// Messages sent to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreMessage {
	/// Ask for the document text from a position to the end.
	GetCode(Position),
	/// A batch of formatted output.
	Partial(String),
	/// A re-evaluation pass is complete.
	Finished,
	/// Annotate a range.
	MarkText(MarkText),
	/// Remove a previously requested annotation.
	ClearMarker(MarkerId),
	/// Liveness signal for edits that needed no re-evaluation.
	Ping,
}

#[derive(Deserialize)]
struct ClearMarkerData {
	id: MarkerId,
}

impl CoreMessage {
	/// Wire type tag of this message.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::GetCode(_) => "getcode",
			Self::Partial(_) => "partial",
			Self::Finished => "finished",
			Self::MarkText(_) => "markText",
			Self::ClearMarker(_) => "clearMarker",
			Self::Ping => "ping",
		}
	}

	/// Encodes the message into a frame.
	pub fn encode(&self) -> Envelope {
		let data = match self {
			Self::GetCode(pos) => json!(pos),
			Self::Partial(text) => Value::String(text.clone()),
			Self::Finished | Self::Ping => Value::String(String::new()),
			Self::MarkText(mark) => json!(mark),
			Self::ClearMarker(id) => json!({ "id": id }),
		};
		Envelope::new(self.kind(), data)
	}

	/// Decodes a frame produced by [`Self::encode`].
	pub fn decode(env: Envelope) -> Result<Option<Self>> {
		let msg = match env.kind.as_str() {
			"getcode" => Self::GetCode(serde_json::from_value(env.data)?),
			"partial" => match env.data {
				Value::String(text) => Self::Partial(text),
				other => return Err(Error::Protocol(format!("partial payload must be a string, got {other}"))),
			},
			"finished" => Self::Finished,
			"markText" => Self::MarkText(serde_json::from_value(env.data)?),
			"clearMarker" => Self::ClearMarker(serde_json::from_value::<ClearMarkerData>(env.data)?.id),
			"ping" => Self::Ping,
			_ => return Ok(None),
		};
		Ok(Some(msg))
	}
}
