//! Re-evaluation worker binary.
//!
//! Speaks line-delimited JSON on stdin/stdout. Logs go to stderr, or to a
//! file under `REVAL_LOG_DIR` when set.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reval_calc::Calc;
use reval_worker::WorkerConfig;
use tokio::io::BufReader;
use tracing::info;

/// Worker command line arguments.
#[derive(Parser, Debug)]
#[command(name = "reval-worker")]
#[command(about = "Incremental statement re-evaluation over stdio")]
struct Args {
	/// Quiescence window before re-evaluating, in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 400)]
	debounce_ms: u64,

	/// How long the host gets to answer a getcode request, in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 1000)]
	fetch_timeout_ms: u64,

	/// Initial evaluator settings (JSON object)
	#[arg(long, value_name = "FILE")]
	settings: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let mut config = WorkerConfig {
		debounce: Duration::from_millis(args.debounce_ms),
		fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
		..WorkerConfig::default()
	};
	if let Some(path) = &args.settings {
		config.load_settings(path)?;
		info!(path = %path.display(), "worker.settings_loaded");
	}

	let input = BufReader::new(tokio::io::stdin());
	reval_worker::serve(Calc::new(), config, input, tokio::io::stdout()).await?;
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("REVAL_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| EnvFilter::new(if verbose { "reval=debug" } else { "reval=info" }))
	};

	if let Some(log_dir) = std::env::var("REVAL_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("reval-worker.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.init();

			info!(path = ?log_path, "worker tracing initialized");
			return;
		}
	}

	// stdout carries the protocol
	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
