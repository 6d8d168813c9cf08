use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::TaskError;
use crate::token::ScopeToken;
use crate::{TaskClass, spawn};

/// One in-flight operation bound to a single scope instance.
///
/// The slot owns the operation's [`ScopeToken`] and gates every observable
/// effect on it: a result arriving after [`TaskSlot::cancel`] is dropped
/// without touching the caller's handlers. Success does not revoke the token;
/// only cancellation does.
#[derive(Debug)]
pub struct TaskSlot {
	class: TaskClass,
	token: ScopeToken,
	handle: JoinHandle<()>,
}

impl TaskSlot {
	/// Starts one operation under a freshly minted token for `generation`.
	///
	/// The factory runs synchronously and receives a child token so it can
	/// wire cooperative preemption into the operation itself. A factory
	/// failure is delivered through the same spawned, token-gated path as an
	/// async failure; nothing is ever delivered inline from this call.
	pub fn start<T, E, F, Fut, S, H>(
		name: &str,
		class: TaskClass,
		generation: u64,
		debounce: Duration,
		factory: F,
		on_success: S,
		on_error: H,
	) -> Self
	where
		T: Send + 'static,
		E: Send + 'static,
		F: FnOnce(ScopeToken) -> Result<Fut, E>,
		Fut: Future<Output = Result<T, E>> + Send + 'static,
		S: FnOnce(T) + Send + 'static,
		H: FnOnce(TaskError<E>) + Send + 'static,
	{
		let token = ScopeToken::new(generation);
		let fut = match factory(token.child()) {
			Ok(fut) => fut,
			Err(err) => {
				tracing::debug!(slot = name, generation, "slot.factory_failed");
				let gate = token.clone();
				let handle = spawn(class, async move {
					if gate.is_active() {
						on_error(TaskError::Factory(err));
					}
				});
				return Self { class, token, handle };
			}
		};

		let gate = token.clone();
		let slot_name = name.to_owned();
		let handle = spawn(class, async move {
			if debounce > Duration::ZERO {
				tokio::select! {
					_ = gate.cancelled() => return,
					_ = sleep(debounce) => {}
				}
			}

			let result = tokio::select! {
				_ = gate.cancelled() => {
					tracing::trace!(slot = %slot_name, generation, "slot.cancelled");
					return;
				}
				result = fut => result,
			};

			// The operation may have completed in the same poll as a revoke.
			if !gate.is_active() {
				tracing::trace!(slot = %slot_name, generation, "slot.stale_drop");
				return;
			}

			match result {
				Ok(value) => on_success(value),
				Err(err) => on_error(TaskError::Operation(err)),
			}
		});

		Self { class, token, handle }
	}

	/// Returns the generation of the slot's token.
	pub fn generation(&self) -> u64 {
		self.token.generation()
	}

	/// Returns `true` while the slot has not been cancelled.
	pub fn is_active(&self) -> bool {
		self.token.is_active()
	}

	/// Returns `true` once the delivery task has finished, whether it
	/// delivered a result or dropped a stale one.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Cancels the slot: revokes the token so no handler ever fires.
	///
	/// Idempotent. Cooperative only — the underlying work keeps running
	/// unless the operation races its token itself.
	pub fn cancel(&self) {
		if self.token.is_active() {
			tracing::trace!(generation = self.token.generation(), "slot.cancel");
		}
		self.token.revoke();
	}

	/// Arms a competing timeout that cancels this slot when it fires first.
	pub fn cancel_after(&self, timeout: Duration) {
		let gate = self.token.clone();
		spawn(self.class, async move {
			tokio::select! {
				_ = gate.cancelled() => {}
				_ = sleep(timeout) => {
					tracing::trace!(generation = gate.generation(), "slot.timeout");
					gate.revoke();
				}
			}
		});
	}
}
