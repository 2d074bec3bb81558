//! Evaluator settings as sent by the host.
//!
//! Settings are replaced wholesale by every `settings` message and owned by
//! the [`crate::Session`]; nothing here is process-global.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SettingsError;

/// What a runtime fault does to the statements after it in the same pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
	/// Keep evaluating from the state the fault left behind.
	#[default]
	Continue,
	/// Treat the fault like an evaluator failure and poison the rest of the pass.
	Poison,
}

/// Options forwarded to the evaluator and the output formatter.
///
/// Unknown keys are kept in [`Settings::extra`] so evaluator-specific flags
/// reach the evaluator untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	pub allow_unicode_in_strings: bool,
	/// Dialect extensions.
	#[serde(rename = "allowSuccessorML")]
	pub allow_successor_ml: bool,
	pub disable_elaboration: bool,
	pub disable_evaluation: bool,
	pub allow_long_function_names: bool,
	/// Statements at least this slow get a timing line in their output.
	pub timing_threshold_ms: Option<u64>,
	pub fault_policy: FaultPolicy,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Settings {
	/// Decodes a `settings` payload.
	///
	/// Hosts send either the JSON text of the settings object or the object
	/// itself. Empty payloads mean "no change" and decode to `Ok(None)`.
	pub fn from_payload(payload: &Value) -> Result<Option<Self>, SettingsError> {
		match payload {
			Value::Null => Ok(None),
			Value::String(text) if text.trim().is_empty() => Ok(None),
			Value::String(text) => Ok(Some(serde_json::from_str(text)?)),
			Value::Object(_) => Ok(Some(Self::deserialize(payload)?)),
			other => Err(SettingsError::Shape(other.to_string())),
		}
	}

	/// Timing display threshold, if enabled.
	pub fn timing_threshold(&self) -> Option<Duration> {
		self.timing_threshold_ms.map(Duration::from_millis)
	}
}
