//! Line-delimited JSON transport.
//!
//! One [`Envelope`] per line in both directions. Reading goes through
//! [`tokio::io::Lines::next_line`], which is cancellation safe, so
//! [`JsonLinesReader::next`] can sit in a `select!` next to timers without
//! losing partially read frames.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::{Envelope, Result};

/// Reads envelopes, one per line.
#[derive(Debug)]
pub struct JsonLinesReader<R> {
	lines: Lines<R>,
}

impl<R> JsonLinesReader<R>
where
	R: AsyncBufRead + Unpin,
{
	/// Wraps a buffered input stream.
	pub fn new(input: R) -> Self {
		Self { lines: input.lines() }
	}

	/// Reads the next envelope.
	///
	/// Blank lines are skipped. Returns `Ok(None)` at end of input. A line
	/// that fails to decode yields [`crate::Error::Json`] and the stream
	/// stays usable.
	pub async fn next(&mut self) -> Result<Option<Envelope>> {
		loop {
			let Some(line) = self.lines.next_line().await? else {
				return Ok(None);
			};
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			return Ok(Some(serde_json::from_str(line)?));
		}
	}
}

/// Writes envelopes, one per line, flushing after each frame.
#[derive(Debug)]
pub struct JsonLinesWriter<W> {
	output: W,
	buf: Vec<u8>,
}

impl<W> JsonLinesWriter<W>
where
	W: AsyncWrite + Unpin,
{
	/// Wraps an output stream.
	pub fn new(output: W) -> Self {
		Self { output, buf: Vec::new() }
	}

	/// Writes one envelope.
	pub async fn send(&mut self, env: &Envelope) -> Result<()> {
		self.buf.clear();
		serde_json::to_writer(&mut self.buf, env)?;
		self.buf.push(b'\n');
		self.output.write_all(&self.buf).await?;
		self.output.flush().await?;
		Ok(())
	}

	/// Returns the wrapped stream.
	pub fn into_inner(self) -> W {
		self.output
	}
}

#[cfg(test)]
mod tests {
	use tokio::io::BufReader;

	use super::*;
	use crate::Error;

	#[tokio::test]
	async fn reads_frames_and_skips_blank_lines() {
		let input = b"{\"type\":\"clear\"}\n\n  \n{\"type\":\"code\",\"data\":\"1;\"}\n";
		let mut reader = JsonLinesReader::new(BufReader::new(&input[..]));
		assert_eq!(reader.next().await.unwrap().unwrap().kind, "clear");
		let code = reader.next().await.unwrap().unwrap();
		assert_eq!(code.data, serde_json::json!("1;"));
		assert!(reader.next().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn malformed_line_is_recoverable() {
		let input = b"not json\n{\"type\":\"ping\"}\n";
		let mut reader = JsonLinesReader::new(BufReader::new(&input[..]));
		let err = reader.next().await.unwrap_err();
		assert!(matches!(err, Error::Json(_)));
		assert!(err.is_recoverable());
		assert_eq!(reader.next().await.unwrap().unwrap().kind, "ping");
	}

	#[tokio::test]
	async fn writer_emits_one_line_per_frame() {
		let mut writer = JsonLinesWriter::new(Vec::new());
		writer.send(&Envelope::bare("finished")).await.unwrap();
		writer.send(&Envelope::bare("ping")).await.unwrap();
		let text = String::from_utf8(writer.into_inner()).unwrap();
		assert_eq!(text, "{\"type\":\"finished\",\"data\":\"\"}\n{\"type\":\"ping\",\"data\":\"\"}\n");
	}
}
