//! Scoped cancellable task orchestration primitives.
//!
//! `tether` binds asynchronous operations to a *scope* whose identity changes
//! over time (a filter value, a subscription channel, a component instance)
//! and guarantees that:
//!
//! * only the most recent operation's result is ever observed,
//! * superseded operations are cancelled or their results discarded,
//! * no result is delivered after the scope has been torn down,
//! * callbacks that need "the current value of X" never read a stale
//!   captured snapshot.
//!
//! The pieces, leaf first:
//!
//! * [`ScopeToken`] — generation-scoped cancellation capability; revocation
//!   is one-way and idempotent.
//! * [`TaskSlot`] — owns at most one in-flight operation and gates its
//!   delivery on the token.
//! * [`ScopedTaskController`] — supersedes the current slot on every scope
//!   key change and terminally on scope end.
//! * [`LatestValueCell`] — freshest-value cell for long-lived callbacks.
//! * [`RecurringTaskDriver`] — self-rescheduling polling with a single
//!   pending invocation, built on the same tokens.
//!
//! Cancellation is cooperative: revoking a token suppresses *effects*
//! (handler invocation) but only stops the underlying work early when the
//! operation races [`ScopeToken::cancelled`] itself.

mod cell;
mod class;
mod controller;
mod error;
mod recurring;
mod slot;
mod spawn;
mod token;

pub use cell::LatestValueCell;
pub use class::TaskClass;
pub use controller::ScopedTaskController;
pub use error::TaskError;
pub use recurring::RecurringTaskDriver;
pub use slot::TaskSlot;
pub use spawn::spawn;
pub use token::ScopeToken;
