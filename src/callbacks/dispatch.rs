/*!
 * Dispatcher
 * Services signaled entries once per cooperative tick
 */

use super::table::CallbackTable;
use super::types::{CallbackEntry, NativeFn, PostHook, PreHook, ServiceReport};
use crate::core::errors::{CallbackError, CallbackResult};
use crate::core::id::Handle;
use crate::core::types::Context;
use crate::monitoring::PassSpan;
use crate::script::{Retained, ScriptEngine};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Everything needed to run one entry, detached from table storage
enum Invocation<V> {
    Scripted {
        function: Retained<V>,
        context: Context,
        pre: Option<PreHook<V>>,
        post: Option<PostHook<V>>,
    },
    Native {
        context: Context,
        function: NativeFn,
    },
}

enum Outcome {
    Invoked,
    Skipped,
}

impl<E: ScriptEngine> CallbackTable<E> {
    /// Run every signaled entry once, in ascending handle order
    ///
    /// The signaled set is taken when the pass starts: every raised flag is
    /// cleared up front, and signals raised while the pass runs (including an
    /// entry signaling itself or a sibling) wait for the next pass. Entries
    /// removed before their turn are skipped. A failing hook or handler is
    /// logged and counted; the pass continues with the next entry.
    pub fn service(&self) -> ServiceReport {
        let span = PassSpan::new(self.stats.next_pass());
        let report = {
            let _entered = span.enter();
            self.run_pass()
        };
        span.finish(report.invoked, report.skipped, report.failed);
        report
    }

    fn run_pass(&self) -> ServiceReport {
        let mut report = ServiceReport::default();
        let signaled = self.inner.borrow().store.take_signaled();

        for (handle, flag) in signaled {
            // Re-read the slot every time; earlier handlers may have removed it
            let Some(invocation) = self.prepare(handle, &flag) else {
                continue;
            };

            match self.dispatch(handle, invocation) {
                Ok(Outcome::Invoked) => {
                    report.invoked += 1;
                    self.stats.inc_invocations();
                }
                Ok(Outcome::Skipped) => {
                    report.skipped += 1;
                    self.stats.inc_skipped();
                }
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Callback failed");
                    report.failed += 1;
                    self.stats.inc_failures();
                }
            }
        }
        report
    }

    /// Copy out what the call needs, if the signaled entry still occupies its slot
    ///
    /// The table borrow ends before any hook runs.
    fn prepare(&self, handle: Handle, flag: &Arc<AtomicBool>) -> Option<Invocation<E::Value>> {
        let inner = self.inner.borrow();
        let slot = inner.store.get(handle)?;
        if !Arc::ptr_eq(&slot.signaled, flag) {
            trace!(handle = %handle, "Signaled entry replaced during pass");
            return None;
        }

        Some(match &slot.entry {
            CallbackEntry::Scripted(cb) => Invocation::Scripted {
                function: Retained::acquire(&self.engine, cb.function.get()),
                context: cb.context.clone(),
                pre: cb.pre.clone(),
                post: cb.post.clone(),
            },
            CallbackEntry::Native(cb) => Invocation::Native {
                context: cb.context.clone(),
                function: cb.function.clone(),
            },
        })
    }

    fn dispatch(&self, handle: Handle, invocation: Invocation<E::Value>) -> CallbackResult<Outcome> {
        match invocation {
            Invocation::Native { context, function } => {
                trace!(handle = %handle, "Calling native callback");
                isolate(handle, || function(&context))?;
                Ok(Outcome::Invoked)
            }
            Invocation::Scripted {
                function,
                context,
                pre,
                post,
            } => {
                let outcome = isolate(handle, || {
                    self.call_scripted(handle, function.get(), &context, pre, post)
                })
                .and_then(|result| result);
                // The in-flight reference outlives the call even if the entry
                // was removed or updated meanwhile
                function.release(&self.engine);
                outcome
            }
        }
    }

    fn call_scripted(
        &self,
        handle: Handle,
        function: &E::Value,
        context: &Context,
        pre: Option<PreHook<E::Value>>,
        post: Option<PostHook<E::Value>>,
    ) -> CallbackResult<Outcome> {
        if !self.engine.is_function(function) {
            trace!(handle = %handle, "Skipping non-callable callback");
            return Ok(Outcome::Skipped);
        }

        let args = pre.map(|pre| pre(context)).unwrap_or_default();
        debug!(handle = %handle, args = args.len(), "Calling scripted callback");

        let this = self.engine.undefined();
        let ret = self
            .engine
            .call(function, &this, &args)
            .map_err(|e| CallbackError::HandlerFailed {
                handle,
                reason: e.to_string(),
            })?;

        if let Some(post) = post {
            post(context, &ret);
        }
        Ok(Outcome::Invoked)
    }
}

/// Run `f`, turning a panic into a per-entry failure
fn isolate<T>(handle: Handle, f: impl FnOnce() -> T) -> CallbackResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| CallbackError::HandlerFailed {
        handle,
        reason: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{LocalEngine, LocalValue, ScriptError};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<u32>>>, id: u32) -> NativeFn {
        let log = log.clone();
        Rc::new(move |_: &Context| log.borrow_mut().push(id))
    }

    #[test]
    fn test_empty_pass() {
        let table = CallbackTable::with_defaults(LocalEngine::new()).unwrap();
        assert_eq!(table.service(), ServiceReport::default());
        assert_eq!(table.stats().passes, 1);
    }

    #[test]
    fn test_flag_cleared_before_invocation() {
        let table = Rc::new(CallbackTable::with_defaults(LocalEngine::new()).unwrap());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&table);
        let seen_in = seen.clone();
        let handle = table
            .register_native(
                Context::empty(),
                Rc::new(move |_: &Context| {
                    let table = weak.upgrade().unwrap();
                    let me = table.highest_handle().unwrap();
                    seen_in.borrow_mut().push(table.is_signaled(me));
                    table.signal(me);
                }),
            )
            .unwrap();

        table.signal(handle);
        assert_eq!(table.service().invoked, 1);
        assert_eq!(*seen.borrow(), vec![false]);
        // Self re-signal waits for the next pass
        assert!(table.is_signaled(handle));
        assert_eq!(table.service().invoked, 1);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_scan_reaches_entries_above_gap() {
        let table = CallbackTable::with_defaults(LocalEngine::new()).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = table.register_native(Context::empty(), recorder(&log, 0)).unwrap();
        let b = table.register_native(Context::empty(), recorder(&log, 1)).unwrap();
        let c = table.register_native(Context::empty(), recorder(&log, 2)).unwrap();
        table.remove(a);
        table.remove(b);

        // One live entry at handle 2: a count-bounded scan would stop at 0
        table.signal(c);
        table.service();
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let table = CallbackTable::with_defaults(LocalEngine::new()).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let bad = table
            .register_native(Context::empty(), Rc::new(|_: &Context| panic!("sensor gone")))
            .unwrap();
        let good = table.register_native(Context::empty(), recorder(&log, 1)).unwrap();

        table.signal(bad);
        table.signal(good);
        let report = table.service();

        assert_eq!(report.failed, 1);
        assert_eq!(report.invoked, 1);
        assert_eq!(*log.borrow(), vec![1]);
        assert_eq!(table.stats().failures, 1);
    }

    #[test]
    fn test_script_error_skips_post_hook() {
        let engine = Rc::new(LocalEngine::new());
        let table = CallbackTable::with_defaults(engine.clone()).unwrap();
        let posted = Rc::new(RefCell::new(0));

        let throws = LocalValue::function("throws", |_| Err(ScriptError::Thrown("bad".into())));
        let posted_in = posted.clone();
        let handle = table
            .register_scripted(
                &throws,
                Context::empty(),
                None,
                Some(Rc::new(move |_: &Context, _: &LocalValue| {
                    *posted_in.borrow_mut() += 1
                })),
            )
            .unwrap();

        table.signal(handle);
        let report = table.service();
        assert_eq!(report.failed, 1);
        assert_eq!(*posted.borrow(), 0);
        // Only the entry's own reference remains
        assert_eq!(engine.live_references(), 1);
    }

    #[test]
    fn test_non_callable_is_skipped() {
        let engine = Rc::new(LocalEngine::new());
        let table = CallbackTable::with_defaults(engine.clone()).unwrap();
        let pre_calls = Rc::new(RefCell::new(0));

        let f = LocalValue::function("f", |_| Ok(LocalValue::Undefined));
        let pre_in = pre_calls.clone();
        let handle = table
            .register_scripted(
                &f,
                Context::empty(),
                Some(Rc::new(move |_: &Context| {
                    *pre_in.borrow_mut() += 1;
                    Vec::new()
                })),
                None,
            )
            .unwrap();
        table.update_scripted_function(handle, &LocalValue::Null);

        table.signal(handle);
        let report = table.service();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(*pre_calls.borrow(), 0);
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panicked: boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panicked: bang");
    }
}
