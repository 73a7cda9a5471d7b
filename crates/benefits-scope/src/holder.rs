//! Task-local holder for the active [`ScopeContext`].
//!
//! # Purpose
//! Stores the context in a slot that follows the logical task. Async code gets
//! its slot from `run_async`/`isolate`/`propagate`, which bind a slot to the
//! future itself; the slot is only visible while that future is being polled.
//!
//! # Slots
//! - Task slot: a `tokio::task_local!` cell installed by the scoping helpers
//!   (and by `run`, for the duration of its closure).
//! - Thread slot: fallback for plain synchronous callers on threads with no
//!   tokio runtime. A runtime worker multiplexes unrelated tasks, so the
//!   thread slot is never used there.
//!
//! Lookups use the innermost task slot when one exists. Off-runtime threads
//! fall back to the thread slot. On a runtime thread outside any task scope
//! there is no slot: `get` sees nothing and `set` is refused with an error log.
//! Clearing a task slot does not reveal the thread slot underneath.
use crate::{ScopeContext, ScopeError, ScopeResult};
use std::cell::RefCell;
use std::future::Future;

type Slot = RefCell<Option<ScopeContext>>;

tokio::task_local! {
    static TASK_SCOPE: Slot;
}

thread_local! {
    static THREAD_SCOPE: Slot = const { RefCell::new(None) };
}

fn in_task_scope() -> bool {
    TASK_SCOPE.try_with(|_| ()).is_ok()
}

fn on_runtime_thread() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

/// Run `f` against the slot owned by the current execution, or return `None`
/// when the caller is on a runtime thread outside any task scope.
fn with_slot<R>(f: impl FnOnce(&Slot) -> R) -> Option<R> {
    if in_task_scope() {
        Some(TASK_SCOPE.with(f))
    } else if on_runtime_thread() {
        None
    } else {
        Some(THREAD_SCOPE.with(f))
    }
}

/// Process-wide entry point for installing and reading the scope context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeContextHolder;

impl ScopeContextHolder {
    /// Install `context` for the current execution, replacing whatever it had.
    ///
    /// Other tasks are never affected. On a runtime thread outside any task
    /// scope nothing is installed and the call is logged as an error; wrap the
    /// future in [`ScopeContextHolder::isolate`] first.
    pub fn set(context: ScopeContext) {
        let tier = context.tier();
        let installed = with_slot(|slot| {
            *slot.borrow_mut() = Some(context);
        });
        if installed.is_none() {
            tracing::error!(
                %tier,
                "scope context set outside a task scope on a runtime thread; ignored"
            );
        }
    }

    pub fn get() -> Option<ScopeContext> {
        with_slot(|slot| slot.borrow().clone()).flatten()
    }

    /// Return the installed context.
    ///
    /// # Errors
    /// - [`ScopeError::ContextRequired`] when nothing is installed.
    pub fn get_required() -> ScopeResult<ScopeContext> {
        Self::get().ok_or(ScopeError::ContextRequired)
    }

    pub fn has_context() -> bool {
        with_slot(|slot| slot.borrow().is_some()).unwrap_or(false)
    }

    /// Remove the context for the current execution. No-op when empty.
    pub fn clear() {
        with_slot(|slot| {
            slot.borrow_mut().take();
        });
    }

    /// Run `body` with `context` installed, restoring the previous state
    /// (including "none") afterwards, also when `body` panics.
    pub fn run<R>(context: ScopeContext, body: impl FnOnce() -> R) -> R {
        TASK_SCOPE.sync_scope(RefCell::new(Some(context)), body)
    }

    /// Bind `context` to `future`.
    ///
    /// The context is visible only while the returned future is polled, so it
    /// survives every suspension inside `future`, never leaks into tasks that
    /// share the worker thread, and is gone once the future completes or is
    /// dropped.
    pub fn run_async<F>(context: ScopeContext, future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        TASK_SCOPE.scope(RefCell::new(Some(context)), future)
    }

    /// Give `future` its own empty slot.
    ///
    /// Used by boundaries that install the context with `set` at request start
    /// and `clear` at request end.
    pub fn isolate<F>(future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        TASK_SCOPE.scope(RefCell::new(None), future)
    }

    /// Bind the caller's current context (if any) to `future`, typically
    /// before handing it to `tokio::spawn`.
    pub fn propagate<F>(future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        TASK_SCOPE.scope(RefCell::new(Self::get()), future)
    }
}
