use std::path::PathBuf;

use reval_engine::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Rpc(#[from] reval_rpc::Error),

	#[error("failed to read settings from {path}: {source}")]
	SettingsFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid settings in {path}: {source}")]
	Settings {
		path: PathBuf,
		#[source]
		source: SettingsError,
	},
}

pub type Result<T> = std::result::Result<T, Error>;
