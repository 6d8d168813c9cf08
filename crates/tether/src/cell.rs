use std::sync::Arc;

use arc_swap::ArcSwap;

/// Always-fresh value cell for long-lived callbacks.
///
/// The owner overwrites the cell on every state change; callbacks read
/// through the cell instead of capturing a snapshot, so a callback created
/// long before the latest write still observes it. Clones share the same
/// storage. No coupling to cancellation.
pub struct LatestValueCell<T> {
	inner: Arc<ArcSwap<T>>,
}

impl<T> LatestValueCell<T> {
	/// Creates a cell holding `value`.
	pub fn new(value: T) -> Self {
		Self {
			inner: Arc::new(ArcSwap::from_pointee(value)),
		}
	}

	/// Unconditionally overwrites the stored value.
	pub fn write(&self, value: T) {
		self.inner.store(Arc::new(value));
	}

	/// Returns the most recently written value.
	pub fn read(&self) -> Arc<T> {
		self.inner.load_full()
	}
}

impl<T: Clone> LatestValueCell<T> {
	/// Returns a clone of the most recently written value.
	pub fn get(&self) -> T {
		T::clone(&self.read())
	}
}

impl<T> Clone for LatestValueCell<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T: Default> Default for LatestValueCell<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}
