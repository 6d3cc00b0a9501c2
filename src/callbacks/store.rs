/*!
 * Entry Store
 * Growable, handle-indexed slot storage
 */

use super::types::Slot;
use crate::core::errors::{CallbackError, CallbackResult};
use crate::core::id::{Handle, SlotStorage};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, error};

pub(crate) struct EntryStore<V> {
    slots: Vec<Option<Slot<V>>>,
    max_capacity: usize,
}

impl<V> EntryStore<V> {
    /// Allocate `initial` empty slots
    pub(crate) fn with_capacity(initial: usize, max_capacity: usize) -> CallbackResult<Self> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(initial).map_err(|e| {
            CallbackError::InitFailed(format!("cannot allocate {} slots: {}", initial, e))
        })?;
        slots.resize_with(initial, || None);
        Ok(Self {
            slots,
            max_capacity,
        })
    }

    pub(crate) fn insert(&mut self, handle: Handle, slot: Slot<V>) {
        if let Some(index) = handle.index() {
            debug_assert!(self.slots[index].is_none(), "slot {} already occupied", index);
            self.slots[index] = Some(slot);
        }
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&Slot<V>> {
        self.slots.get(handle.index()?)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut Slot<V>> {
        self.slots.get_mut(handle.index()?)?.as_mut()
    }

    pub(crate) fn take(&mut self, handle: Handle) -> Option<Slot<V>> {
        self.slots.get_mut(handle.index()?)?.take()
    }

    /// Highest occupied slot index
    pub(crate) fn highest_occupied(&self) -> Option<usize> {
        self.slots.iter().rposition(Option::is_some)
    }

    /// Clear every raised flag, returning those entries in ascending order
    ///
    /// Each handle comes with the flag it was taken from, so a later
    /// occupant of the same slot can be told apart.
    pub(crate) fn take_signaled(&self) -> Vec<(Handle, Arc<AtomicBool>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let slot = slot.as_ref()?;
                slot.take_signal()
                    .then(|| (Handle::from_index(index), slot.signaled.clone()))
            })
            .collect()
    }

    /// Empty every slot, keeping capacity
    pub(crate) fn drain(&mut self) -> Vec<(Handle, Slot<V>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.take().map(|s| (Handle::from_index(index), s)))
            .collect()
    }
}

impl<V> SlotStorage for EntryStore<V> {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn is_vacant(&self, index: usize) -> bool {
        self.slots.get(index).map_or(false, Option::is_none)
    }

    fn grow(&mut self, additional: usize) -> CallbackResult<()> {
        let current = self.slots.len();
        let target = current + additional;
        if target > self.max_capacity {
            error!(
                capacity = current,
                limit = self.max_capacity,
                "Callback table cannot grow"
            );
            return Err(CallbackError::ResourceExhausted {
                capacity: current,
                limit: self.max_capacity,
            });
        }

        self.slots.try_reserve_exact(additional).map_err(|e| {
            error!(requested = additional, error = %e, "Callback table allocation failed");
            CallbackError::AllocationFailed {
                requested: additional,
            }
        })?;
        self.slots.resize_with(target, || None);
        debug!(from = current, to = target, "Callback table grown");
        Ok(())
    }
}
