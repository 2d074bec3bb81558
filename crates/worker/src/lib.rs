//! The re-evaluation worker.
//!
//! Reads one JSON envelope per line, drives a [`reval_engine::Session`] and
//! writes the resulting messages back, one per line.

pub mod config;
pub mod error;
pub mod fetch;
pub mod pump;

pub use config::{DEFAULT_FETCH_TIMEOUT, WorkerConfig};
pub use error::{Error, Result};
pub use pump::Worker;
use reval_engine::Evaluator;
use tokio::io::{AsyncBufRead, AsyncWrite};

/// Runs a worker until `input` reaches end of file.
pub async fn serve<E, R, W>(evaluator: E, config: WorkerConfig, input: R, output: W) -> Result<()>
where
	E: Evaluator,
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	Worker::new(evaluator, config, output).run(input).await
}
