/*!
 * Callback Table
 * Registration, removal, signaling, and teardown of deferred callbacks
 */

use super::signaler::Signaler;
use super::stats::{AtomicDispatchStats, DispatchStats};
use super::store::EntryStore;
use super::types::{
    CallbackEntry, CallbackKind, NativeCallback, NativeFn, PostHook, PreHook, ScriptedCallback,
    Slot,
};
use crate::core::config::TableConfig;
use crate::core::errors::{CallbackError, CallbackResult};
use crate::core::id::{Handle, HandleAllocator, SlotStorage};
use crate::core::types::Context;
use crate::script::{Retained, ScriptEngine};
use std::cell::RefCell;
use tracing::{debug, info, trace, warn};

pub(crate) struct TableInner<V> {
    pub(crate) allocator: HandleAllocator,
    pub(crate) store: EntryStore<V>,
}

/// Deferred callback dispatch table
///
/// Owned by the host's control thread. Registration, removal and `service()`
/// must run there; only `Signaler::signal` may run elsewhere. Methods take
/// `&self` so hooks and handlers can capture the table (e.g. through an
/// `Rc`/`Weak`) and register, remove or re-signal entries while a pass runs.
pub struct CallbackTable<E: ScriptEngine> {
    pub(crate) engine: E,
    config: TableConfig,
    pub(crate) inner: RefCell<TableInner<E::Value>>,
    pub(crate) stats: AtomicDispatchStats,
}

impl<E: ScriptEngine> CallbackTable<E> {
    /// Allocate the table's initial storage
    ///
    /// Failure here is the only fatal condition; the host decides whether to
    /// abort startup.
    pub fn init(engine: E, config: TableConfig) -> CallbackResult<Self> {
        config.validate()?;
        let store = EntryStore::with_capacity(config.initial_capacity, config.max_capacity)?;
        info!(
            capacity = config.initial_capacity,
            growth_chunk = config.growth_chunk,
            max_capacity = config.max_capacity,
            "Callback table initialized"
        );
        Ok(Self {
            engine,
            config,
            inner: RefCell::new(TableInner {
                allocator: HandleAllocator::new(config.growth_chunk),
                store,
            }),
            stats: AtomicDispatchStats::new(),
        })
    }

    /// Init with default sizing
    pub fn with_defaults(engine: E) -> CallbackResult<Self> {
        Self::init(engine, TableConfig::default())
    }

    /// Register a script function, taking a new reference to it
    pub fn register_scripted(
        &self,
        function: &E::Value,
        context: Context,
        pre: Option<PreHook<E::Value>>,
        post: Option<PostHook<E::Value>>,
    ) -> CallbackResult<Handle> {
        let function = Retained::acquire(&self.engine, function);
        match self.occupy(CallbackEntry::Scripted(ScriptedCallback {
            function,
            context,
            pre,
            post,
        })) {
            Ok(handle) => {
                debug!(handle = %handle, "Added scripted callback");
                Ok(handle)
            }
            Err((e, entry)) => {
                if let CallbackEntry::Scripted(cb) = entry {
                    cb.function.release(&self.engine);
                }
                Err(e)
            }
        }
    }

    /// Register a native function
    pub fn register_native(&self, context: Context, function: NativeFn) -> CallbackResult<Handle> {
        let handle = self
            .occupy(CallbackEntry::Native(NativeCallback { context, function }))
            .map_err(|(e, _)| e)?;
        debug!(handle = %handle, "Added native callback");
        Ok(handle)
    }

    /// Allocate a handle and store `entry` in its slot
    ///
    /// On failure the unstored entry is handed back so owned references can
    /// be released outside the borrow.
    fn occupy(
        &self,
        entry: CallbackEntry<E::Value>,
    ) -> Result<Handle, (CallbackError, CallbackEntry<E::Value>)> {
        let mut inner = self.inner.borrow_mut();
        let TableInner { allocator, store } = &mut *inner;

        let before = store.capacity();
        let handle = match allocator.allocate(store) {
            Ok(handle) => handle,
            Err(e) => return Err((e, entry)),
        };
        if store.capacity() != before {
            self.stats.inc_growths();
        }

        store.insert(handle, Slot::new(entry));
        self.stats.inc_registrations();
        Ok(handle)
    }

    /// Swap the function of a scripted entry, keeping handle and hooks
    ///
    /// No-op for the sentinel, free handles and native entries.
    pub fn update_scripted_function(&self, handle: Handle, function: &E::Value) {
        if self.kind(handle) != Some(CallbackKind::Scripted) {
            trace!(handle = %handle, "No scripted callback to update");
            return;
        }
        let replacement = Retained::acquire(&self.engine, function);

        let previous = {
            let mut inner = self.inner.borrow_mut();
            match inner.store.get_mut(handle).map(|slot| &mut slot.entry) {
                Some(CallbackEntry::Scripted(cb)) => {
                    Ok(std::mem::replace(&mut cb.function, replacement))
                }
                _ => Err(replacement),
            }
        };

        match previous {
            Ok(old) => {
                old.release(&self.engine);
                debug!(handle = %handle, "Replaced scripted callback function");
            }
            // Entry went away while the engine was acquiring
            Err(unused) => unused.release(&self.engine),
        }
    }

    /// Remove an entry and release what it owns
    ///
    /// Idempotent: the sentinel and free handles are ignored.
    pub fn remove(&self, handle: Handle) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let slot = inner.store.take(handle);
            if slot.is_some() {
                inner.allocator.reclaim();
            }
            slot
        };

        let Some(slot) = removed else {
            return;
        };
        if let CallbackEntry::Scripted(cb) = slot.entry {
            cb.function.release(&self.engine);
        }
        self.stats.inc_removals();
        debug!(handle = %handle, "Removed callback");
    }

    /// Mark an entry for the next `service()` pass
    ///
    /// Only writes the flag. No-op for the sentinel and free handles.
    pub fn signal(&self, handle: Handle) {
        if let Some(slot) = self.inner.borrow().store.get(handle) {
            slot.raise();
        }
    }

    /// Token for raising this entry's flag from another thread
    pub fn signaler(&self, handle: Handle) -> Option<Signaler> {
        self.inner
            .borrow()
            .store
            .get(handle)
            .map(|slot| Signaler::new(handle, slot.signaled.clone()))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.borrow().store.get(handle).is_some()
    }

    pub fn is_signaled(&self, handle: Handle) -> bool {
        self.inner
            .borrow()
            .store
            .get(handle)
            .map_or(false, |slot| slot.is_signaled())
    }

    pub fn kind(&self, handle: Handle) -> Option<CallbackKind> {
        self.inner
            .borrow()
            .store
            .get(handle)
            .map(|slot| slot.entry.kind())
    }

    /// Live entries
    pub fn len(&self) -> usize {
        self.inner.borrow().allocator.live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addressable slots
    pub fn capacity(&self) -> usize {
        self.inner.borrow().store.capacity()
    }

    /// Highest occupied handle
    pub fn highest_handle(&self) -> Option<Handle> {
        self.inner
            .borrow()
            .store
            .highest_occupied()
            .map(Handle::from_index)
    }

    pub fn stats(&self) -> DispatchStats {
        let inner = self.inner.borrow();
        self.stats
            .snapshot(inner.allocator.live(), inner.store.capacity())
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Release every live entry and the table itself
    ///
    /// Returns the number of entries released.
    pub fn teardown(mut self) -> usize {
        self.release_all()
    }

    fn release_all(&mut self) -> usize {
        let drained = {
            let inner = self.inner.get_mut();
            inner.allocator.reset();
            inner.store.drain()
        };

        let count = drained.len();
        for (handle, slot) in drained {
            if let CallbackEntry::Scripted(cb) = slot.entry {
                cb.function.release(&self.engine);
            }
            trace!(handle = %handle, "Released callback");
        }

        if count > 0 {
            info!(released = count, "Callback table torn down");
        }
        count
    }
}

impl<E: ScriptEngine> Drop for CallbackTable<E> {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            warn!(
                released,
                "Callback table dropped with live entries; call teardown() explicitly"
            );
        }
    }
}
