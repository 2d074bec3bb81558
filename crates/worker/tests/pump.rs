//! End-to-end tests of the message pump over in-memory pipes.
//!
//! Time is paused: whenever both sides are blocked the runtime jumps to the
//! next timer, so debounce windows and fetch timeouts elapse instantly and
//! deterministically.

use std::time::Duration;

use pretty_assertions::assert_eq;
use reval_calc::Calc;
use reval_primitives::{EditNotice, MarkerId, MarkerStyle, Position};
use reval_rpc::{CoreMessage, HostMessage, JsonLinesReader, JsonLinesWriter, MarkText};
use reval_worker::{WorkerConfig, serve};
use serde_json::json;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

const DEBOUNCE: Duration = Duration::from_millis(400);

struct Host {
	writer: JsonLinesWriter<DuplexStream>,
	reader: JsonLinesReader<BufReader<DuplexStream>>,
	doc: String,
	worker: JoinHandle<reval_worker::Result<()>>,
}

impl Host {
	fn start() -> Self {
		let (host_tx, worker_rx) = duplex(64 * 1024);
		let (worker_tx, host_rx) = duplex(64 * 1024);
		let worker = tokio::spawn(serve(
			Calc::new(),
			WorkerConfig::default(),
			BufReader::new(worker_rx),
			worker_tx,
		));
		Self {
			writer: JsonLinesWriter::new(host_tx),
			reader: JsonLinesReader::new(BufReader::new(host_rx)),
			doc: String::new(),
			worker,
		}
	}

	async fn send(&mut self, msg: HostMessage) {
		self.writer.send(&msg.encode()).await.unwrap();
	}

	async fn recv(&mut self) -> CoreMessage {
		let env = self.reader.next().await.unwrap().expect("worker closed its output");
		CoreMessage::decode(env).unwrap().expect("known message type")
	}

	/// Replaces the document and reports the edit.
	async fn edit(&mut self, doc: &str, edit: EditNotice) {
		self.doc = doc.to_string();
		self.send(HostMessage::Interpret(edit)).await;
	}

	/// Waits for `getcode` and answers it from the current document.
	async fn serve_code(&mut self) -> Position {
		let pos = self.expect_getcode().await;
		let text = text_from(&self.doc, pos).to_string();
		self.send(HostMessage::Code(text)).await;
		pos
	}

	async fn expect_getcode(&mut self) -> Position {
		match self.recv().await {
			CoreMessage::GetCode(pos) => pos,
			other => panic!("expected getcode, got {other:?}"),
		}
	}

	/// Collects messages up to and including `finished`.
	async fn until_finished(&mut self) -> Vec<CoreMessage> {
		let mut out = Vec::new();
		loop {
			let msg = self.recv().await;
			let done = msg == CoreMessage::Finished;
			out.push(msg);
			if done {
				return out;
			}
		}
	}

	async fn shutdown(self) {
		drop(self.writer);
		self.worker.await.unwrap().unwrap();
	}
}

fn text_from(doc: &str, pos: Position) -> &str {
	let mut at = Position::ZERO;
	for (i, ch) in doc.char_indices() {
		if at == pos {
			return &doc[i..];
		}
		at = if ch == '\n' {
			Position::new(at.line + 1, 0)
		} else {
			at.advance_columns(1)
		};
	}
	""
}

fn partials(out: &[CoreMessage]) -> Vec<&str> {
	out.iter()
		.filter_map(|m| match m {
			CoreMessage::Partial(text) => Some(text.as_str()),
			_ => None,
		})
		.collect()
}

const DOC: &str = "val a = 1;\nval b = a + 1;\n";

async fn populated() -> Host {
	let mut host = Host::start();
	host.edit(DOC, EditNotice::insert(Position::ZERO, "val a = 1;")).await;
	host.serve_code().await;
	host.until_finished().await;
	host
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn debounced_pass_streams_results() {
	let mut host = Host::start();
	let started = Instant::now();
	host.edit(DOC, EditNotice::insert(Position::ZERO, "val a = 1;")).await;

	assert_eq!(host.serve_code().await, Position::ZERO);
	assert!(started.elapsed() >= DEBOUNCE);

	assert_eq!(
		host.until_finished().await,
		vec![
			CoreMessage::MarkText(MarkText {
				from: Position::new(0, 0),
				to: Position::new(0, 10),
				style: MarkerStyle::Success,
				id: MarkerId(1),
			}),
			CoreMessage::Partial("\\1> val \\*a = 1\\*: \\_int\\_;\n".into()),
			CoreMessage::MarkText(MarkText {
				from: Position::new(0, 10),
				to: Position::new(1, 14),
				style: MarkerStyle::SuccessOdd,
				id: MarkerId(2),
			}),
			CoreMessage::Partial("\\2> val \\*b = 2\\*: \\_int\\_;\n".into()),
			CoreMessage::Finished,
		]
	);
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn irrelevant_edit_pings_immediately() {
	let mut host = populated().await;
	let started = Instant::now();
	host.edit(&format!("{DOC}x"), EditNotice::insert(Position::new(2, 0), "x")).await;
	assert_eq!(host.recv().await, CoreMessage::Ping);
	assert_eq!(started.elapsed(), Duration::ZERO);
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn burst_runs_one_pass_from_the_earliest_edit() {
	let mut host = populated().await;
	let doc = "val a = 1;\nval b = a + 2;\n";
	host.edit(doc, EditNotice::insert(Position::new(1, 12), "2")).await;
	sleep(Duration::from_millis(100)).await;
	host.edit(doc, EditNotice::remove(Position::new(1, 12), "1")).await;
	sleep(Duration::from_millis(100)).await;
	host.edit(doc, EditNotice::insert(Position::new(1, 4), "")).await;

	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(2)));
	assert_eq!(host.serve_code().await, Position::new(0, 9));
	assert_eq!(
		partials(&host.until_finished().await),
		["\\1> val \\*a = 1\\*: \\_int\\_;\n", "\\2> val \\*b = 3\\*: \\_int\\_;\n"]
	);
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn fetch_timeout_then_recovery() {
	let mut host = populated().await;
	let doc = "val a = 7;\nval b = a + 1;\n";
	host.edit(doc, EditNotice::insert(Position::new(0, 8), "7")).await;

	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(1)));
	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(2)));
	assert_eq!(host.expect_getcode().await, Position::ZERO);

	// Never answered in time; a late answer is ignored.
	sleep(Duration::from_secs(2)).await;
	host.send(HostMessage::Code(doc.to_string())).await;

	// An edit that would otherwise only ping repairs the truncated cache.
	let doc = "val a = 7;\nval b = a + 1;\n ";
	host.edit(doc, EditNotice::insert(Position::new(2, 0), " ")).await;
	assert_eq!(host.serve_code().await, Position::ZERO);
	assert_eq!(
		partials(&host.until_finished().await),
		["\\1> val \\*a = 7\\*: \\_int\\_;\n", "\\2> val \\*b = 8\\*: \\_int\\_;\n"]
	);
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn settings_reset_and_reevaluate() {
	let mut host = populated().await;
	host.send(HostMessage::Settings(json!("{\"disableEvaluation\": true}"))).await;

	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(1)));
	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(2)));
	assert_eq!(host.serve_code().await, Position::ZERO);
	assert_eq!(
		partials(&host.until_finished().await),
		["\\1> val \\*a\\*: \\_int\\_;\n", "\\2> val \\*b\\*: \\_int\\_;\n"]
	);
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disabled_worker_ignores_edits() {
	let mut host = populated().await;
	host.send(HostMessage::Disable).await;
	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(1)));
	assert_eq!(host.recv().await, CoreMessage::ClearMarker(MarkerId(2)));

	host.edit(DOC, EditNotice::insert(Position::ZERO, ";")).await;
	sleep(Duration::from_secs(2)).await;

	host.send(HostMessage::Enable).await;
	host.edit(DOC, EditNotice::insert(Position::ZERO, ";")).await;
	assert_eq!(host.serve_code().await, Position::ZERO, "nothing was sent while disabled");
	host.until_finished().await;
	host.shutdown().await;
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn garbage_lines_are_skipped() {
	let Host {
		writer,
		reader,
		doc,
		worker,
	} = populated().await;
	let mut raw = writer.into_inner();
	raw.write_all(b"not json\n\n{\"type\":\"mystery\",\"data\":1}\n").await.unwrap();
	let mut host = Host {
		writer: JsonLinesWriter::new(raw),
		reader,
		doc,
		worker,
	};

	host.edit(&format!("{DOC}x"), EditNotice::insert(Position::new(2, 0), "x")).await;
	assert_eq!(host.recv().await, CoreMessage::Ping);
	host.shutdown().await;
}
