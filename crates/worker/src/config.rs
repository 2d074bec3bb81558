//! Worker configuration.

use std::path::Path;
use std::time::Duration;

use reval_engine::{DEFAULT_DEBOUNCE, Settings};
use serde_json::Value;

use crate::error::{Error, Result};

/// How long the host gets to answer a `getcode` request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
	/// Quiescence window before a pass starts.
	pub debounce: Duration,
	/// Deadline for the host's `code` response.
	pub fetch_timeout: Duration,
	/// Evaluator settings until the host sends its own.
	pub settings: Settings,
}

impl Default for WorkerConfig {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
			fetch_timeout: DEFAULT_FETCH_TIMEOUT,
			settings: Settings::default(),
		}
	}
}

impl WorkerConfig {
	/// Replaces the initial settings with the JSON object stored at `path`.
	pub fn load_settings(&mut self, path: &Path) -> Result<()> {
		let text = std::fs::read_to_string(path).map_err(|source| Error::SettingsFile {
			path: path.to_path_buf(),
			source,
		})?;
		let parsed = Settings::from_payload(&Value::String(text)).map_err(|source| Error::Settings {
			path: path.to_path_buf(),
			source,
		})?;
		if let Some(settings) = parsed {
			self.settings = settings;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use reval_engine::FaultPolicy;

	use super::*;

	#[test]
	fn settings_file_overrides_defaults() {
		let dir = tempfile::tempdir().expect("create tempdir");
		let path = dir.path().join("settings.json");
		std::fs::write(&path, r#"{"disableElaboration": true, "faultPolicy": "poison"}"#).unwrap();

		let mut config = WorkerConfig::default();
		config.load_settings(&path).unwrap();
		assert!(config.settings.disable_elaboration);
		assert_eq!(config.settings.fault_policy, FaultPolicy::Poison);
		assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
	}

	#[test]
	fn bad_settings_file_names_the_path() {
		let dir = tempfile::tempdir().expect("create tempdir");
		let path = dir.path().join("bad.json");
		std::fs::write(&path, "{ nope").unwrap();

		let err = WorkerConfig::default().load_settings(&path).unwrap_err();
		assert!(matches!(err, Error::Settings { .. }));
		assert!(err.to_string().contains("bad.json"));

		let missing = dir.path().join("missing.json");
		assert!(matches!(
			WorkerConfig::default().load_settings(&missing),
			Err(Error::SettingsFile { .. })
		));
	}

	#[test]
	fn empty_settings_file_keeps_defaults() {
		let dir = tempfile::tempdir().expect("create tempdir");
		let path = dir.path().join("empty.json");
		std::fs::write(&path, "\n").unwrap();

		let mut config = WorkerConfig::default();
		config.load_settings(&path).unwrap();
		assert_eq!(config.settings, Settings::default());
	}
}
