//! Error types for passes and settings.

use thiserror::Error;

use crate::CacheEpoch;

/// Reasons a planned pass cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassError {
	/// The cache changed (cleared, reconfigured or re-planned) after the pass was planned.
	#[error("pass planned at cache epoch {planned} but the cache is at epoch {current}")]
	Stale {
		/// Epoch recorded in the plan.
		planned: CacheEpoch,
		/// Epoch of the cache at completion time.
		current: CacheEpoch,
	},
}

/// Errors that can occur when decoding evaluator settings.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// The settings text was not valid JSON for [`crate::Settings`].
	#[error("invalid settings: {0}")]
	Json(#[from] serde_json::Error),

	/// The payload was neither a JSON string nor an object.
	#[error("settings payload must be a JSON string or object, got {0}")]
	Shape(String),
}
