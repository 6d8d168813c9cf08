use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::TaskClass;
use crate::error::TaskError;
use crate::slot::TaskSlot;
use crate::token::{GenerationClock, ScopeToken};

/// Supersession coordinator binding async operations to a changing scope key.
///
/// Exactly one non-cancelled [`TaskSlot`] exists at a time. Each scope-key
/// change cancels the previous slot before starting the next, so results are
/// delivered in key-supersession order regardless of completion order, and
/// [`ScopedTaskController::on_scope_end`] guarantees that no prior operation
/// ever delivers afterwards.
///
/// Keys compare by semantic equality (`PartialEq`), never identity: a
/// redundant notification carrying an equal key while a slot is still active
/// is a no-op.
///
/// All mutators take `&mut self`; a multi-threaded caller must serialize
/// scope-change and scope-end notifications through a single owner.
pub struct ScopedTaskController<K> {
	name: String,
	class: TaskClass,
	clock: GenerationClock,
	generation: u64,
	current: Option<TaskSlot>,
	last_key: Option<K>,
	ended: bool,
}

impl<K> ScopedTaskController<K>
where
	K: PartialEq + fmt::Debug,
{
	/// Creates a controller for one logical owner.
	pub fn new(name: impl Into<String>, class: TaskClass) -> Self {
		Self {
			name: name.into(),
			class,
			clock: GenerationClock::new(),
			generation: 0,
			current: None,
			last_key: None,
			ended: false,
		}
	}

	/// Returns the generation of the most recently started slot.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns `true` while a non-cancelled slot exists.
	pub fn is_in_flight(&self) -> bool {
		self.current.as_ref().is_some_and(TaskSlot::is_active)
	}

	/// Notifies the controller that the scope key is now `key`.
	///
	/// Equivalent to [`Self::on_scope_change_debounced`] with a zero debounce.
	pub fn on_scope_change<T, E, F, Fut, S, H>(&mut self, key: K, factory: F, on_success: S, on_error: H)
	where
		T: Send + 'static,
		E: Send + 'static,
		F: FnOnce(ScopeToken) -> Result<Fut, E>,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
		S: FnOnce(T) + Send + 'static,
		H: FnOnce(TaskError<E>) + Send + 'static,
	{
		self.on_scope_change_debounced(key, Duration::ZERO, factory, on_success, on_error);
	}

	/// Notifies the controller that the scope key is now `key`, starting the
	/// operation after `debounce`.
	///
	/// A redundant notification (equal key, slot still active) is a no-op.
	/// Otherwise the current slot is cancelled before the new one starts, so
	/// at most one slot can deliver at any time. Handlers never run inline
	/// here; delivery always happens later, on the spawned task. A slot
	/// superseded during its debounce window never starts its operation.
	pub fn on_scope_change_debounced<T, E, F, Fut, S, H>(
		&mut self,
		key: K,
		debounce: Duration,
		factory: F,
		on_success: S,
		on_error: H,
	) where
		T: Send + 'static,
		E: Send + 'static,
		F: FnOnce(ScopeToken) -> Result<Fut, E>,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
		S: FnOnce(T) + Send + 'static,
		H: FnOnce(TaskError<E>) + Send + 'static,
	{
		if self.ended {
			tracing::warn!(controller = %self.name, key = ?key, "scope.change_after_end");
			return;
		}

		if self.last_key.as_ref() == Some(&key) && self.is_in_flight() {
			tracing::trace!(controller = %self.name, key = ?key, "scope.redundant_change");
			return;
		}

		if let Some(slot) = self.current.take() {
			tracing::trace!(controller = %self.name, generation = slot.generation(), "scope.supersede");
			slot.cancel();
		}

		self.generation = self.clock.next();
		tracing::debug!(
			controller = %self.name,
			class = self.class.as_str(),
			generation = self.generation,
			key = ?key,
			"scope.start"
		);

		let slot = TaskSlot::start(&self.name, self.class, self.generation, debounce, factory, on_success, on_error);
		self.current = Some(slot);
		self.last_key = Some(key);
	}

	/// Cancels the in-flight slot without ending the scope.
	///
	/// The next scope change restarts work even for an equal key.
	pub fn cancel(&mut self) {
		if let Some(slot) = self.current.take() {
			slot.cancel();
		}
	}

	/// Ends the scope: cancels the current slot and refuses further changes.
	///
	/// After this returns, no previously started operation can deliver.
	/// Idempotent.
	pub fn on_scope_end(&mut self) {
		if let Some(slot) = self.current.take() {
			slot.cancel();
		}
		if !self.ended {
			tracing::debug!(controller = %self.name, "scope.end");
		}
		self.ended = true;
		self.last_key = None;
	}
}

impl<K> Drop for ScopedTaskController<K> {
	fn drop(&mut self) {
		if let Some(slot) = self.current.take() {
			slot.cancel();
		}
	}
}
