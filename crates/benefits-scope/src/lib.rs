//! Request-scoped visibility context.
//!
//! # Purpose
//! Carries "who is calling, and how much may they see" through deep and
//! asynchronous call chains without threading it through every signature.
//!
//! # How it fits
//! The authorization boundary installs a [`ScopeContext`] for the lifetime of
//! a request with [`ScopeContextHolder::run_async`]. The scoped repository
//! reads it back with [`ScopeContextHolder::get_required`] on every call.
//!
//! # Key invariants
//! - A context is attached to the logical task (the future), not to the OS
//!   thread: tasks interleaved on one worker never observe each other's
//!   context, and a task keeps its context across every `.await`.
//! - Nested `run`/`run_async` restore the outer context when they finish,
//!   panic, or are cancelled.
//! - Spawned tasks start without a context unless it is handed over with
//!   [`ScopeContextHolder::propagate`].
//!
//! # Examples
//! ```rust
//! use benefits_scope::{ScopeContext, ScopeContextHolder, ScopeTier};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let context = ScopeContext::unit(Some("u1".to_string()), "g1").expect("context");
//! let tier = ScopeContextHolder::run_async(context, async {
//!     tokio::task::yield_now().await;
//!     ScopeContextHolder::get_required().expect("installed").tier()
//! })
//! .await;
//! assert_eq!(tier, ScopeTier::Unit);
//! assert!(!ScopeContextHolder::has_context());
//! # }
//! ```
//!
//! # Common pitfalls
//! - Pairing `set`/`clear` by hand around code that may return early or
//!   panic; prefer `run`/`run_async`, which restore automatically.
//! - Calling `set` on a runtime worker outside any task scope installs
//!   nothing; the call is logged and later lookups see no context. Wrap the
//!   request future in [`ScopeContextHolder::isolate`] first.

mod context;
mod errors;
mod holder;

pub use context::{ScopeContext, ScopeTier};
pub use errors::{ScopeError, ScopeResult};
pub use holder::ScopeContextHolder;
