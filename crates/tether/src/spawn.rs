use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("tether-global")
			.build()
			.expect("failed to build tether global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an async task with execution-class metadata.
///
/// Uses the ambient tokio runtime when one is active, otherwise a lazily
/// built process-global runtime, so spawning never panics off-runtime.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(task_class = class.as_str(), "tether.spawn");
	runtime_handle().spawn(fut)
}
