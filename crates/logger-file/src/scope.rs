//! Nested logging scopes
//!
//! Scopes form a stack per logical execution context. Synchronous code pushes
//! onto a thread-local stack through [`begin_scope`] and pops when the
//! returned guard drops; async code wraps a future with [`in_scope`] so the
//! scope follows the task across worker threads.

use std::cell::RefCell;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

thread_local! {
    static THREAD_SCOPES: RefCell<Vec<Arc<str>>> = const { RefCell::new(Vec::new()) };
}

tokio::task_local! {
    static TASK_SCOPES: Arc<[Arc<str>]>;
}

/// Guard for one scope level; the level is popped when the guard drops.
///
/// Guards are bound to the thread that created them.
#[must_use = "the scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    depth: usize,
    _thread_bound: PhantomData<Rc<()>>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // Also discards inner levels whose guards were leaked.
        let _ = THREAD_SCOPES.try_with(|scopes| scopes.borrow_mut().truncate(self.depth));
    }
}

/// Push `value` onto the current thread's scope stack.
pub fn begin_scope(value: impl Display) -> ScopeGuard {
    let value: Arc<str> = value.to_string().into();
    THREAD_SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        let depth = scopes.len();
        scopes.push(value);
        ScopeGuard {
            depth,
            _thread_bound: PhantomData,
        }
    })
}

/// Snapshot of the scopes active on the calling context, outermost first.
pub fn current_scopes() -> Vec<Arc<str>> {
    let mut scopes = TASK_SCOPES
        .try_with(|scopes| scopes.to_vec())
        .unwrap_or_default();
    THREAD_SCOPES.with(|thread| scopes.extend(thread.borrow().iter().cloned()));
    scopes
}

/// Run `future` with `value` pushed on top of the caller's scopes.
pub async fn in_scope<F: Future>(value: impl Display, future: F) -> F::Output {
    let mut scopes = current_scopes();
    scopes.push(value.to_string().into());
    TASK_SCOPES.scope(scopes.into(), future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        current_scopes().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_nested_guards() {
        assert!(names().is_empty());
        {
            let _outer = begin_scope("SCOPE");
            {
                let _inner = begin_scope("NESTED SCOPE");
                assert_eq!(names(), ["SCOPE", "NESTED SCOPE"]);
            }
            assert_eq!(names(), ["SCOPE"]);
        }
        assert!(names().is_empty());
    }

    #[test]
    fn test_pop_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _guard = begin_scope("doomed");
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(names().is_empty());
    }

    #[test]
    fn test_threads_do_not_share_scopes() {
        let _guard = begin_scope("main");
        let other = std::thread::spawn(names).join().unwrap();
        assert!(other.is_empty());
        assert_eq!(names(), ["main"]);
    }

    #[tokio::test]
    async fn test_task_scope_nesting() {
        in_scope("request", async {
            in_scope(42, async {
                let _sync = begin_scope("step");
                assert_eq!(names(), ["request", "42", "step"]);
            })
            .await;
            assert_eq!(names(), ["request"]);
        })
        .await;
        assert!(names().is_empty());
    }
}
