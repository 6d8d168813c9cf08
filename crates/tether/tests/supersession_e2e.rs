//! End-to-end supersession scenarios: delivery follows key order, never
//! completion order, and teardown is terminal.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

use tether::{ScopeToken, ScopedTaskController, TaskClass};

type Log = Arc<Mutex<Vec<u32>>>;
type OpFut = Pin<Box<dyn Future<Output = Result<u32, String>> + Send>>;

fn record(log: &Log) -> impl FnOnce(u32) + Send + 'static {
	let log = Arc::clone(log);
	move |value| log.lock().unwrap().push(value)
}

fn op(value: u32, delay: Duration) -> impl FnOnce(ScopeToken) -> Result<OpFut, String> {
	move |_token| {
		Ok(Box::pin(async move {
			sleep(delay).await;
			Ok(value)
		}) as OpFut)
	}
}

/// Key A (600ms) immediately superseded by key B (250ms): only B delivers,
/// at ~250ms, and A's later completion is dropped.
#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn slower_superseded_operation_never_delivers() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let mut ctrl = ScopedTaskController::new("fetch", TaskClass::Interactive);

	ctrl.on_scope_change("A", op(1, Duration::from_millis(600)), record(&log), |_err| {});
	ctrl.on_scope_change("B", op(2, Duration::from_millis(250)), record(&log), |_err| {});

	sleep(Duration::from_millis(260)).await;
	assert_eq!(*log.lock().unwrap(), vec![2], "B should deliver at ~250ms");

	sleep(Duration::from_millis(500)).await;
	assert_eq!(*log.lock().unwrap(), vec![2], "A's late completion must stay dropped");
}

/// Randomized completion latencies: a key's result is delivered iff it was
/// still the current key when the result arrived. With changes 10ms apart,
/// that means exactly the keys whose latency beat the next change, plus the
/// final key.
#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn delivery_follows_key_order_under_random_latencies() {
	const GAP_MS: u64 = 10;
	const KEYS: u32 = 8;

	// Deterministic xorshift so failures reproduce.
	let mut state = 0x9e37_79b9_u64;
	let mut next_latency = move || {
		state ^= state << 13;
		state ^= state >> 7;
		state ^= state << 17;
		let mut ms = state % 30 + 1;
		if ms == GAP_MS {
			ms += 1;
		}
		ms
	};

	for round in 0..16 {
		let log: Log = Arc::new(Mutex::new(Vec::new()));
		let mut ctrl = ScopedTaskController::new("fetch", TaskClass::Background);
		let latencies: Vec<u64> = (0..KEYS).map(|_| next_latency()).collect();

		for (key, &latency) in latencies.iter().enumerate() {
			ctrl.on_scope_change(
				key,
				op(key as u32, Duration::from_millis(latency)),
				record(&log),
				|_err| {},
			);
			sleep(Duration::from_millis(GAP_MS)).await;
		}
		sleep(Duration::from_millis(100)).await;

		let mut expected: Vec<u32> = (0..KEYS - 1).filter(|&k| latencies[k as usize] < GAP_MS).collect();
		expected.push(KEYS - 1);
		assert_eq!(
			*log.lock().unwrap(),
			expected,
			"round {round}: latencies {latencies:?}"
		);

		ctrl.on_scope_end();
	}
}

/// At most one non-cancelled slot exists at any point in a change sequence,
/// observed through the tokens handed to the operation factories.
#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn at_most_one_token_is_active_across_changes() {
	let tokens: Arc<Mutex<Vec<ScopeToken>>> = Arc::new(Mutex::new(Vec::new()));
	let mut ctrl = ScopedTaskController::new("fetch", TaskClass::Background);

	for key in 0..10u32 {
		let tokens_in_factory = Arc::clone(&tokens);
		ctrl.on_scope_change(
			key,
			move |token| {
				tokens_in_factory.lock().unwrap().push(token);
				Ok::<_, String>(Box::pin(async move {
					sleep(Duration::from_millis(25)).await;
					Ok(key)
				}) as OpFut)
			},
			|_value| {},
			|_err| {},
		);

		let active = tokens.lock().unwrap().iter().filter(|t| t.is_active()).count();
		assert!(active <= 1, "{active} active tokens after change to key {key}");

		sleep(Duration::from_millis(5)).await;
	}

	ctrl.on_scope_end();
	let active = tokens.lock().unwrap().iter().filter(|t| t.is_active()).count();
	assert_eq!(active, 0, "scope end must revoke the last token");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn teardown_outlives_every_pending_operation() {
	let log: Log = Arc::new(Mutex::new(Vec::new()));
	let errors = Arc::new(Mutex::new(Vec::new()));
	let mut ctrl = ScopedTaskController::new("fetch", TaskClass::Background);

	ctrl.on_scope_change("slow", op(1, Duration::from_secs(3600)), record(&log), {
		let errors = Arc::clone(&errors);
		move |err| errors.lock().unwrap().push(err)
	});
	ctrl.on_scope_change("failing", |_token: ScopeToken| {
		Ok::<_, String>(Box::pin(async move {
			sleep(Duration::from_millis(40)).await;
			Err("late failure".to_owned())
		}) as OpFut)
	}, record(&log), {
		let errors = Arc::clone(&errors);
		move |err| errors.lock().unwrap().push(err)
	});

	ctrl.on_scope_end();

	sleep(Duration::from_secs(7200)).await;
	assert!(log.lock().unwrap().is_empty(), "no success may fire after teardown");
	assert!(errors.lock().unwrap().is_empty(), "no error may fire after teardown");
}

/// A factory that wires the token through can stop the work itself, not just
/// its delivery.
#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cooperative_factory_observes_revocation() {
	let reached_end = Arc::new(Mutex::new(false));
	let mut ctrl = ScopedTaskController::new("fetch", TaskClass::Background);

	let reached = Arc::clone(&reached_end);
	ctrl.on_scope_change(
		"A",
		move |token: ScopeToken| {
			Ok::<_, String>(Box::pin(async move {
				tokio::select! {
					_ = token.cancelled() => return Err("preempted".to_owned()),
					_ = sleep(Duration::from_millis(500)) => {}
				}
				*reached.lock().unwrap() = true;
				Ok(0u32)
			}) as OpFut)
		},
		|_value| {},
		|_err| panic!("cancellation must never surface as an error"),
	);

	sleep(Duration::from_millis(100)).await;
	ctrl.on_scope_end();
	sleep(Duration::from_secs(1)).await;

	assert!(!*reached_end.lock().unwrap(), "operation body should stop at the preemption point");
}
