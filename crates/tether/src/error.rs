/// Failure taxonomy delivered to `on_error` handlers.
///
/// Cancellation is deliberately absent: a revoked token suppresses delivery
/// entirely instead of surfacing an error, so handlers only ever see failures
/// that belong to still-current work.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskError<E> {
	/// The async operation failed while its scope was still current.
	#[error("operation failed: {0}")]
	Operation(#[source] E),
	/// The operation factory failed before the operation started.
	#[error("operation factory failed: {0}")]
	Factory(#[source] E),
}

impl<E> TaskError<E> {
	/// Returns the underlying operation error.
	pub fn into_inner(self) -> E {
		match self {
			Self::Operation(err) | Self::Factory(err) => err,
		}
	}

	/// Returns `true` when the factory itself failed, before any async work ran.
	pub fn is_factory(&self) -> bool {
		matches!(self, Self::Factory(_))
	}
}
