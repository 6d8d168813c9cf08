use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock for scope supersession.
#[derive(Debug, Default, Clone)]
pub(crate) struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Generation-scoped cancellation token handed to operation factories.
///
/// The token transitions active → revoked exactly once and never back.
/// Revocation is the only mechanism that suppresses result delivery; it is
/// cooperative and does not preempt the underlying work unless the operation
/// races [`ScopeToken::cancelled`] itself.
#[derive(Debug, Clone)]
pub struct ScopeToken {
	generation: u64,
	cancel: CancellationToken,
}

impl ScopeToken {
	pub(crate) fn new(generation: u64) -> Self {
		Self {
			generation,
			cancel: CancellationToken::new(),
		}
	}

	/// Returns the generation this token belongs to.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns `true` while the token has not been revoked.
	pub fn is_active(&self) -> bool {
		!self.cancel.is_cancelled()
	}

	/// Revokes the token. Idempotent; a revoked token never reactivates.
	pub fn revoke(&self) {
		self.cancel.cancel();
	}

	/// Future resolving once the token is revoked.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child token in the same generation.
	///
	/// Revoking the parent revokes the child; revoking the child leaves the
	/// parent active.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			cancel: self.cancel.child_token(),
		}
	}
}
