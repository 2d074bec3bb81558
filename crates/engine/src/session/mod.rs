//! The re-evaluation driver.
//!
//! A pass is split at its only suspension point, the host round-trip for
//! source text:
//!
//! 1. [`Session::begin_pass`] resolves the anchor, truncates the cache and
//!    returns a [`PassPlan`] naming the position to fetch text from.
//! 2. The caller sends `getcode` and waits for `code`.
//! 3. [`Session::complete_pass`] replays the new statements and streams their
//!    output.
//!
//! If the round-trip times out the plan is simply dropped. The cache then
//! holds exactly the truncated prefix, which is a valid state to resume from.

use std::time::Instant;

use reval_primitives::{MarkerId, MarkerStyle, Position};
use reval_rpc::{CoreMessage, MarkText};
use tracing::{debug, trace, warn};

use crate::anchor::{Anchor, resolve};
use crate::format::{format_failure, format_fault, format_success};
use crate::{
	CacheEpoch, Checkpoint, CheckpointCache, CheckpointKind, EvalError, Evaluator, FaultPolicy, MarkerPool, Outbox,
	Outcome, PassError, Settings, TerminatorScanner,
};


/// Everything one document's evaluation depends on.
pub struct Session<E: Evaluator> {
	evaluator: E,
	settings: Settings,
	cache: CheckpointCache<E::State>,
	markers: MarkerPool,
	enabled: bool,
}

/// A pass that has truncated the cache and is waiting for source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassPlan {
	epoch: CacheEpoch,
	requested: Position,
	anchor: Option<usize>,
	base: Option<usize>,
	fetch_from: Position,
}

impl PassPlan {
	/// Position the pass was scheduled for.
	pub fn requested(&self) -> Position {
		self.requested
	}

	/// Position the host should send text from.
	pub fn fetch_from(&self) -> Position {
		self.fetch_from
	}

	/// Last checkpoint kept by the truncation.
	pub fn anchor(&self) -> Option<usize> {
		self.anchor
	}

	/// Checkpoint whose state the pass resumes from.
	pub fn base(&self) -> Option<usize> {
		self.base
	}

	/// Cache generation the plan was made against.
	pub fn epoch(&self) -> CacheEpoch {
		self.epoch
	}
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
	/// Statements handed to the evaluator.
	pub evaluated: usize,
	/// Checkpoints appended.
	pub appended: usize,
	/// Whether an evaluator failure poisoned the tail of the pass.
	pub poisoned: bool,
}

impl<E: Evaluator> Session<E> {
	/// Configures `evaluator` with `settings` and starts from an empty cache.
	pub fn new(mut evaluator: E, settings: Settings) -> Self {
		evaluator.configure(&settings);
		Self {
			evaluator,
			settings,
			cache: CheckpointCache::new(),
			markers: MarkerPool::new(),
			enabled: true,
		}
	}

	pub fn evaluator(&self) -> &E {
		&self.evaluator
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn cache(&self) -> &CheckpointCache<E::State> {
		&self.cache
	}

	pub fn markers(&self) -> &MarkerPool {
		&self.markers
	}

	/// False between `disable` and `enable`.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Terminator position of the last cached statement.
	pub fn last_boundary(&self) -> Option<Position> {
		self.cache.last_boundary()
	}

	/// Replaces the settings.
	///
	/// Every cached state derives from the old initial state, so the cache is
	/// cleared. The caller schedules a full pass.
	pub fn reconfigure(&mut self, settings: Settings, out: &mut impl Outbox) {
		self.clear(out);
		self.evaluator.configure(&settings);
		self.settings = settings;
		debug!(policy = ?self.settings.fault_policy, "session.reconfigured");
	}

	/// Drops every checkpoint and releases its marker.
	pub fn clear(&mut self, out: &mut impl Outbox) {
		let removed = self.cache.clear();
		debug!(removed = removed.len(), epoch = %self.cache.epoch(), "session.cleared");
		self.release_all(removed, out);
	}

	/// Stops reacting to edits and clears the cache.
	pub fn disable(&mut self, out: &mut impl Outbox) {
		self.enabled = false;
		self.clear(out);
	}

	/// Resumes reacting to edits. The cache stays empty until the next pass.
	pub fn enable(&mut self) {
		self.enabled = true;
	}

	/// Starts a pass for an edit at `pos`.
	///
	/// Truncates the cache after the anchor and releases the markers of the
	/// dropped checkpoints. The returned plan must be passed to
	/// [`Self::complete_pass`] together with the host's text from
	/// [`PassPlan::fetch_from`].
	pub fn begin_pass(&mut self, pos: Position, out: &mut impl Outbox) -> PassPlan {
		let Anchor { anchor, base } = resolve(self.cache.entries(), pos);
		let removed = self.cache.truncate(anchor.map_or(0, |a| a + 1));
		let dropped = removed.len();
		self.release_all(removed, out);

		let epoch = self.cache.advance_epoch();
		let fetch_from = base
			.and_then(|b| self.cache.get(b))
			.map_or(Position::ZERO, |cp| cp.boundary);

		debug!(%pos, ?anchor, ?base, %fetch_from, dropped, %epoch, "pass.begin");
		PassPlan {
			epoch,
			requested: pos,
			anchor,
			base,
			fetch_from,
		}
	}

	/// Finishes a pass with the host's source text.
	///
	/// `source` is the document text starting at [`PassPlan::fetch_from`].
	/// Fails only if the cache changed since the plan was made, in which case
	/// nothing is sent and nothing is mutated.
	pub fn complete_pass(
		&mut self,
		plan: PassPlan,
		source: &str,
		out: &mut impl Outbox,
	) -> Result<PassReport, PassError> {
		let current = self.cache.epoch();
		if plan.epoch != current {
			warn!(planned = %plan.epoch, %current, "pass.stale");
			return Err(PassError::Stale {
				planned: plan.epoch,
				current,
			});
		}

		let known = self.cache.known_output();
		if !known.is_empty() {
			out.post(CoreMessage::Partial(known));
		}

		// The base checkpoint's own terminator is already accounted for.
		let (text, start) = match plan.base {
			Some(_) => {
				let mut chars = source.chars();
				chars.next();
				(chars.as_str(), plan.fetch_from.advance_columns(1))
			}
			None => (source, plan.fetch_from),
		};

		// Placeholders between base and anchor are kept; their terminators
		// come round again in `text` and are only accumulated over.
		let mut kept = plan.anchor.map_or(0, |a| a + 1) - plan.base.map_or(0, |b| b + 1);

		let mut state = plan.base.and_then(|b| self.cache.get(b)).and_then(|cp| cp.state.clone());
		let mut shown_from = state.clone();
		let mut ordinal = self
			.cache
			.entries()
			.iter()
			.rev()
			.find_map(Checkpoint::success_ordinal)
			.map_or(0, |o| o + 1);

		let mut report = PassReport::default();
		let mut stmt_start = 0;
		let mut mark_from = start;

		for term in TerminatorScanner::new(text, start) {
			if kept > 0 {
				kept -= 1;
				continue;
			}
			if self.cache.last_boundary().is_some_and(|last| term.at <= last) {
				warn!(at = %term.at, "pass.boundary_regression");
				continue;
			}

			let to = term.at.advance_columns(1);
			let statement = &text[stmt_start..=term.offset];

			if report.poisoned {
				let marker = self.mark(mark_from, to, MarkerStyle::Fail, out);
				self.cache
					.push(Checkpoint::error(CheckpointKind::Poisoned, term.at, Some(marker), String::new()));
				report.appended += 1;
			} else {
				report.evaluated += 1;
				let started = Instant::now();
				let result = self.evaluator.evaluate(state.as_ref(), statement);
				let elapsed = started.elapsed();

				let checkpoint = match result {
					Err(EvalError::Incomplete) => {
						trace!(at = %term.at, "pass.incomplete");
						self.cache.push(Checkpoint::incomplete(term.at));
						report.appended += 1;
						continue;
					}
					Ok(Outcome::Success { state: next, warnings }) => {
						let bindings = self.evaluator.bindings_since(shown_from.as_ref(), &next);
						let timing = self
							.settings
							.timing_threshold()
							.filter(|threshold| elapsed >= *threshold)
							.map(|_| elapsed);
						let output = format_success(&bindings, &warnings, ordinal, timing);
						let marker = self.mark(mark_from, to, MarkerStyle::for_success(ordinal), out);
						let cp = Checkpoint::success(term.at, next.clone(), Some(marker), output, ordinal);
						ordinal += 1;
						state = Some(next.clone());
						shown_from = Some(next);
						cp
					}
					Ok(Outcome::Fault {
						state: after,
						message,
						warnings,
					}) => {
						debug!(at = %term.at, %message, "pass.fault");
						match self.settings.fault_policy {
							FaultPolicy::Continue => {
								if after.is_some() {
									state = after;
								}
							}
							FaultPolicy::Poison => report.poisoned = true,
						}
						let marker = self.mark(mark_from, to, MarkerStyle::Fail, out);
						Checkpoint::error(CheckpointKind::Fault, term.at, Some(marker), format_fault(&message, &warnings))
					}
					Err(EvalError::Failure { kind, message }) => {
						debug!(at = %term.at, %kind, "pass.failure");
						report.poisoned = true;
						let marker = self.mark(mark_from, to, MarkerStyle::Fail, out);
						Checkpoint::error(CheckpointKind::Failure, term.at, Some(marker), format_failure(&kind, &message))
					}
				};

				out.post(CoreMessage::Partial(checkpoint.output.clone()));
				self.cache.push(checkpoint);
				report.appended += 1;
			}

			stmt_start = term.offset + 1;
			mark_from = to;
		}

		out.post(CoreMessage::Finished);
		debug!(
			evaluated = report.evaluated,
			appended = report.appended,
			poisoned = report.poisoned,
			total = self.cache.len(),
			"pass.finished"
		);
		Ok(report)
	}

	fn mark(&mut self, from: Position, to: Position, style: MarkerStyle, out: &mut impl Outbox) -> MarkerId {
		let id = self.markers.allocate();
		out.post(CoreMessage::MarkText(MarkText { from, to, style, id }));
		id
	}

	fn release_all(&mut self, removed: Vec<Checkpoint<E::State>>, out: &mut impl Outbox) {
		for id in removed.into_iter().filter_map(|cp| cp.marker) {
			if self.markers.release(id) {
				out.post(CoreMessage::ClearMarker(id));
			}
		}
	}
}
