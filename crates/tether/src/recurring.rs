use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::token::{GenerationClock, ScopeToken};
use crate::{TaskClass, spawn};

/// Self-rescheduling polling driver.
///
/// Instead of a fixed-period repeating timer, a single driver task runs one
/// tick operation, waits for it to complete, then arms exactly one delayed
/// invocation for the next tick. Two pending invocations can never coexist
/// and ticks can never overlap. [`RecurringTaskDriver::stop`] revokes the
/// driver token, so an already armed delay resolves into a no-op.
pub struct RecurringTaskDriver {
	name: String,
	class: TaskClass,
	interval: Duration,
	clock: GenerationClock,
	current: Option<ScopeToken>,
}

impl RecurringTaskDriver {
	/// Creates a stopped driver that ticks every `interval` once started.
	pub fn new(name: impl Into<String>, class: TaskClass, interval: Duration) -> Self {
		Self {
			name: name.into(),
			class,
			interval,
			clock: GenerationClock::new(),
			current: None,
		}
	}

	/// Returns `true` while the driver is in the scheduled state.
	pub fn is_scheduled(&self) -> bool {
		self.current.as_ref().is_some_and(ScopeToken::is_active)
	}

	/// Moves the driver to the scheduled state and runs the first tick
	/// immediately. No-op when already scheduled.
	///
	/// Each tick receives a child [`ScopeToken`] so a long-running tick body
	/// can gate its own effects; the interval separates a tick's completion
	/// from the next tick's start.
	pub fn start<F, Fut>(&mut self, op: F)
	where
		F: Fn(ScopeToken) -> Fut + Send + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		if self.is_scheduled() {
			tracing::trace!(driver = %self.name, "driver.already_scheduled");
			return;
		}

		let token = ScopeToken::new(self.clock.next());
		self.current = Some(token.clone());

		let name = self.name.clone();
		let interval = self.interval;
		tracing::debug!(driver = %name, class = self.class.as_str(), generation = token.generation(), "driver.start");

		spawn(self.class, async move {
			let mut tick = 0u64;
			loop {
				if !token.is_active() {
					break;
				}
				tick = tick.wrapping_add(1);
				tracing::trace!(driver = %name, tick, "driver.tick");
				op(token.child()).await;

				if !token.is_active() {
					break;
				}
				tokio::select! {
					_ = token.cancelled() => break,
					_ = sleep(interval) => {}
				}
			}
			tracing::trace!(driver = %name, ticks = tick, "driver.exit");
		});
	}

	/// Moves the driver to the stopped state. Idempotent.
	///
	/// Any pending delayed invocation becomes a no-op; an in-flight tick's
	/// child token is revoked so its remaining effects are suppressed.
	pub fn stop(&mut self) {
		if let Some(token) = self.current.take() {
			if token.is_active() {
				tracing::debug!(driver = %self.name, generation = token.generation(), "driver.stop");
			}
			token.revoke();
		}
	}
}

impl Drop for RecurringTaskDriver {
	fn drop(&mut self) {
		self.stop();
	}
}
