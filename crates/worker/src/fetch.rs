//! The single in-flight `getcode` request.

use std::time::Instant;

/// Holds at most one request waiting for the host, together with its deadline.
#[derive(Debug)]
pub struct FetchSlot<T> {
	pending: Option<(T, Instant)>,
}

impl<T> Default for FetchSlot<T> {
	fn default() -> Self {
		Self { pending: None }
	}
}

impl<T> FetchSlot<T> {
	pub fn is_busy(&self) -> bool {
		self.pending.is_some()
	}

	/// When the pending request times out.
	pub fn deadline(&self) -> Option<Instant> {
		self.pending.as_ref().map(|(_, deadline)| *deadline)
	}

	/// Parks `request` until its response arrives or `deadline` passes.
	///
	/// # Panics
	///
	/// Debug builds panic if a request is already pending.
	pub fn begin(&mut self, request: T, deadline: Instant) {
		debug_assert!(self.pending.is_none(), "getcode requests are single-flight");
		self.pending = Some((request, deadline));
	}

	/// Takes the pending request when its response arrives.
	pub fn resolve(&mut self) -> Option<T> {
		self.pending.take().map(|(request, _)| request)
	}

	/// Takes the pending request if its deadline has passed.
	pub fn expire(&mut self, now: Instant) -> Option<T> {
		if self.deadline().is_some_and(|deadline| now >= deadline) {
			self.resolve()
		} else {
			None
		}
	}
}
