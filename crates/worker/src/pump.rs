//! The worker's message pump.
//!
//! One task owns the session and reacts to three kinds of wakeups: an inbound
//! host frame, the debounce deadline and the `getcode` deadline. The debounce
//! deadline is ignored while a fetch is in flight, so a pass that comes due
//! during a fetch starts right after the fetch resolves or times out.

use std::time::{Duration, Instant};

use reval_engine::{DebounceScheduler, EditDecision, Evaluator, PassPlan, Session, Settings};
use reval_primitives::{EditNotice, Position};
use reval_rpc::{CoreMessage, Envelope, HostMessage, JsonLinesReader, JsonLinesWriter};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::config::WorkerConfig;
use crate::error::Result;
use crate::fetch::FetchSlot;

/// Session state plus the timers and transport around it.
pub struct Worker<E: Evaluator, W> {
	session: Session<E>,
	scheduler: DebounceScheduler,
	fetch: FetchSlot<PassPlan>,
	fetch_timeout: Duration,
	outbox: Vec<CoreMessage>,
	writer: JsonLinesWriter<W>,
}

impl<E, W> Worker<E, W>
where
	E: Evaluator,
	W: AsyncWrite + Unpin,
{
	pub fn new(evaluator: E, config: WorkerConfig, output: W) -> Self {
		Self {
			session: Session::new(evaluator, config.settings),
			scheduler: DebounceScheduler::new(config.debounce),
			fetch: FetchSlot::default(),
			fetch_timeout: config.fetch_timeout,
			outbox: Vec::new(),
			writer: JsonLinesWriter::new(output),
		}
	}

	/// Processes host frames until the input closes.
	pub async fn run<R>(mut self, input: R) -> Result<()>
	where
		R: AsyncBufRead + Unpin,
	{
		let mut reader = JsonLinesReader::new(input);
		info!(
			debounce_ms = self.scheduler.delay().as_millis() as u64,
			fetch_timeout_ms = self.fetch_timeout.as_millis() as u64,
			"worker.started"
		);

		loop {
			let pass_due = self.pass_deadline();
			let fetch_due = self.fetch.deadline();

			tokio::select! {
				inbound = reader.next() => match inbound {
					Ok(Some(envelope)) => self.dispatch(envelope),
					Ok(None) => {
						info!("worker.input_closed");
						return Ok(());
					}
					Err(err) if err.is_recoverable() => warn!(error = %err, "worker.bad_frame"),
					Err(err) => return Err(err.into()),
				},
				() = sleep_until(pass_due) => self.start_pass(),
				() = sleep_until(fetch_due) => self.expire_fetch(),
			}

			match self.flush().await {
				Ok(()) => {}
				Err(err) if err.is_disconnect() => {
					info!("worker.output_closed");
					return Ok(());
				}
				Err(err) => return Err(err.into()),
			}
		}
	}

	/// When the next pass may start. None while a fetch is in flight.
	fn pass_deadline(&self) -> Option<Instant> {
		if self.fetch.is_busy() {
			return None;
		}
		self.scheduler.deadline()
	}

	fn dispatch(&mut self, envelope: Envelope) {
		let msg = match HostMessage::decode(envelope) {
			Ok(Some(msg)) => msg,
			Ok(None) => return,
			Err(err) => {
				warn!(error = %err, "worker.bad_message");
				return;
			}
		};

		match msg {
			HostMessage::Interpret(edit) => self.on_edit(&edit),
			HostMessage::Code(text) => self.on_code(&text),
			HostMessage::Settings(payload) => match Settings::from_payload(&payload) {
				Ok(Some(settings)) => {
					self.session.reconfigure(settings, &mut self.outbox);
					if self.session.is_enabled() {
						self.scheduler.schedule(Position::ZERO, now());
					}
				}
				Ok(None) => debug!("worker.settings.empty"),
				Err(err) => warn!(error = %err, "worker.settings.invalid"),
			},
			HostMessage::Clear => {
				self.session.clear(&mut self.outbox);
				self.scheduler.reset();
			}
			HostMessage::Enable => {
				self.session.enable();
				debug!("worker.enabled");
			}
			HostMessage::Disable => {
				self.session.disable(&mut self.outbox);
				self.scheduler.reset();
				debug!("worker.disabled");
			}
		}
	}

	fn on_edit(&mut self, edit: &EditNotice) {
		if !self.session.is_enabled() {
			trace!(pos = %edit.pos, "worker.edit.disabled");
			return;
		}
		match self.scheduler.note_edit(edit, self.session.last_boundary(), now()) {
			EditDecision::Ping => self.outbox.push(CoreMessage::Ping),
			EditDecision::Scheduled { .. } => {}
		}
	}

	fn start_pass(&mut self) {
		let now = now();
		let Some(pos) = self.scheduler.take_due(now) else {
			return;
		};
		let plan = self.session.begin_pass(pos, &mut self.outbox);
		self.outbox.push(CoreMessage::GetCode(plan.fetch_from()));
		self.fetch.begin(plan, now + self.fetch_timeout);
	}

	fn on_code(&mut self, text: &str) {
		let Some(plan) = self.fetch.resolve() else {
			debug!(len = text.len(), "worker.code.unsolicited");
			return;
		};
		match self.session.complete_pass(plan, text, &mut self.outbox) {
			Ok(report) if report.poisoned => {
				debug!(requested = %plan.requested(), appended = report.appended, "worker.pass.poisoned");
			}
			Ok(report) => {
				trace!(requested = %plan.requested(), evaluated = report.evaluated, "worker.pass.done");
			}
			Err(err) => {
				warn!(error = %err, "worker.pass.abandoned");
				self.scheduler.requeue(plan.requested());
			}
		}
	}

	fn expire_fetch(&mut self) {
		if let Some(plan) = self.fetch.expire(now()) {
			warn!(
				requested = %plan.requested(),
				timeout_ms = self.fetch_timeout.as_millis() as u64,
				"pass.fetch_timeout"
			);
			self.scheduler.requeue(plan.requested());
		}
	}

	async fn flush(&mut self) -> reval_rpc::Result<()> {
		for msg in std::mem::take(&mut self.outbox) {
			trace!(kind = msg.kind(), "worker.send");
			self.writer.send(&msg.encode()).await?;
		}
		Ok(())
	}
}

/// Current time on the runtime clock, which tests can pause and advance.
fn now() -> Instant {
	time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => time::sleep_until(time::Instant::from_std(deadline)).await,
		None => std::future::pending().await,
	}
}
