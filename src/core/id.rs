/*!
 * Handle Allocation
 * Type-safe callback handles and lowest-free-first allocation over growable slots
 */

use super::errors::CallbackResult;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type-Safe Handle
// ============================================================================

/// Callback handle (32-bit slot index)
///
/// `Handle::NONE` is the "no handle" sentinel. Every table operation that
/// accepts a handle treats it as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Sentinel meaning "no registration"
    pub const NONE: Handle = Handle(u32::MAX);

    /// Build a handle from a slot index
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Handle(index as u32)
    }

    /// Slot index, or `None` for the sentinel
    #[inline]
    pub fn index(self) -> Option<usize> {
        if self.is_none() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Handle::NONE
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NONE
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ============================================================================
// Slot Storage Interface
// ============================================================================

/// Storage the allocator scans and asks to grow
pub trait SlotStorage {
    /// Number of addressable slots
    fn capacity(&self) -> usize;

    /// Whether the slot at `index` holds no entry
    fn is_vacant(&self, index: usize) -> bool;

    /// Add `additional` empty slots, keeping existing slots in place
    fn grow(&mut self, additional: usize) -> CallbackResult<()>;
}

// ============================================================================
// Lowest-Free Allocator
// ============================================================================

/// Handle allocator that always returns the lowest free slot
///
/// Tracks the live count so it knows when the storage is full and must be
/// grown by one chunk before scanning. The scan is linear; tables are small.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    live: usize,
    growth_chunk: usize,
}

impl HandleAllocator {
    pub fn new(growth_chunk: usize) -> Self {
        Self {
            live: 0,
            growth_chunk: growth_chunk.max(1),
        }
    }

    /// Reserve the lowest free handle in `storage`
    ///
    /// The caller must occupy the returned slot before the next allocation.
    pub fn allocate<S: SlotStorage>(&mut self, storage: &mut S) -> CallbackResult<Handle> {
        if self.live >= storage.capacity() {
            storage.grow(self.growth_chunk)?;
        }

        let index = match (0..storage.capacity()).find(|&i| storage.is_vacant(i)) {
            Some(index) => index,
            None => {
                // Live count disagreed with storage; grow and take the first new slot
                let first_new = storage.capacity();
                storage.grow(self.growth_chunk)?;
                first_new
            }
        };

        self.live += 1;
        Ok(Handle::from_index(index))
    }

    /// Return a handle's slot to the free pool
    pub fn reclaim(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    /// Forget every allocation (after teardown)
    pub fn reset(&mut self) {
        self.live = 0;
    }

    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn growth_chunk(&self) -> usize {
        self.growth_chunk
    }
}

// ============================================================================
// Tests
// ============================================================================
