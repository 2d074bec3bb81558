//! Marker id allocation.

use std::collections::BTreeSet;

use reval_primitives::MarkerId;
use tracing::warn;

/// Hands out marker ids, reusing released ones smallest first.
///
/// Ids start at 1. An id is either outstanding (allocated and not yet
/// released) or free; it is never handed out twice while outstanding.
#[derive(Debug)]
pub struct MarkerPool {
	next: u32,
	free: BTreeSet<MarkerId>,
}

impl Default for MarkerPool {
	fn default() -> Self {
		Self::new()
	}
}

impl MarkerPool {
	/// Creates a pool with no outstanding ids.
	pub fn new() -> Self {
		Self {
			next: 1,
			free: BTreeSet::new(),
		}
	}

	/// Returns the smallest released id, or a fresh one.
	pub fn allocate(&mut self) -> MarkerId {
		if let Some(id) = self.free.pop_first() {
			return id;
		}
		let id = MarkerId(self.next);
		self.next += 1;
		id
	}

	/// Returns `id` to the pool.
	///
	/// Releasing an id that is not outstanding is a no-op and returns `false`.
	pub fn release(&mut self, id: MarkerId) -> bool {
		if !self.is_outstanding(id) {
			warn!(%id, "marker.release.not_outstanding");
			return false;
		}
		self.free.insert(id)
	}

	/// True if `id` was allocated and not released since.
	pub fn is_outstanding(&self, id: MarkerId) -> bool {
		id.0 != 0 && id.0 < self.next && !self.free.contains(&id)
	}

	/// Number of ids currently allocated.
	pub fn outstanding(&self) -> usize {
		(self.next as usize - 1) - self.free.len()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use proptest::prelude::*;

	use super::*;

	#[test]
	fn fresh_ids_are_sequential() {
		let mut pool = MarkerPool::new();
		assert_eq!(pool.allocate(), MarkerId(1));
		assert_eq!(pool.allocate(), MarkerId(2));
		assert_eq!(pool.allocate(), MarkerId(3));
		assert_eq!(pool.outstanding(), 3);
	}

	#[test]
	fn released_id_is_reused() {
		let mut pool = MarkerPool::new();
		let ids: Vec<_> = (0..4).map(|_| pool.allocate()).collect();
		assert!(pool.release(ids[1]));
		assert_eq!(pool.allocate(), ids[1]);
		assert_eq!(pool.allocate(), MarkerId(5));
	}

	#[test]
	fn smallest_released_first() {
		let mut pool = MarkerPool::new();
		let ids: Vec<_> = (0..5).map(|_| pool.allocate()).collect();
		pool.release(ids[3]);
		pool.release(ids[0]);
		pool.release(ids[2]);
		assert_eq!(pool.allocate(), MarkerId(1));
		assert_eq!(pool.allocate(), MarkerId(3));
		assert_eq!(pool.allocate(), MarkerId(4));
	}

	#[test]
	fn double_release_is_ignored() {
		let mut pool = MarkerPool::new();
		let id = pool.allocate();
		assert!(pool.release(id));
		assert!(!pool.release(id));
		assert!(!pool.release(MarkerId(42)));
		assert_eq!(pool.allocate(), id);
		assert_eq!(pool.allocate(), MarkerId(2));
	}

	proptest! {
		/// Outstanding ids are always distinct, whatever the allocate/release order.
		#[test]
		fn prop_no_double_allocation(ops in prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..200)) {
			let mut pool = MarkerPool::new();
			let mut live: Vec<MarkerId> = Vec::new();
			for op in ops {
				match op {
					Some(index) if !live.is_empty() => {
						let id = live.swap_remove(index.index(live.len()));
						prop_assert!(pool.release(id));
					}
					_ => {
						let id = pool.allocate();
						prop_assert!(!live.contains(&id));
						live.push(id);
					}
				}
				let unique: HashSet<_> = live.iter().collect();
				prop_assert_eq!(unique.len(), live.len());
				prop_assert_eq!(pool.outstanding(), live.len());
			}
		}
	}
}
