/*!
 * Cross-Context Signaling
 * Send + Sync token that can only raise one entry's signaled flag
 */

use crate::core::id::Handle;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raises the signaled flag of one registration from any thread
///
/// `signal` is a single atomic store: no allocation, no logging, no engine
/// access. After the entry is removed the token keeps writing to a flag the
/// table no longer reads, even if the handle is reused.
#[derive(Clone)]
pub struct Signaler {
    handle: Handle,
    flag: Arc<AtomicBool>,
}

impl Signaler {
    pub(crate) fn new(handle: Handle, flag: Arc<AtomicBool>) -> Self {
        Self { handle, flag }
    }

    #[inline]
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl fmt::Debug for Signaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signaler")
            .field("handle", &self.handle)
            .field("pending", &self.flag.load(Ordering::Relaxed))
            .finish()
    }
}
