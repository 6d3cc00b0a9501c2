/*!
 * Callback Types
 * Entry variants, hook shapes, and pass results
 */

use crate::core::types::Context;
use crate::script::Retained;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Produces the argument list for a scripted call
pub type PreHook<V> = Rc<dyn Fn(&Context) -> Vec<V>>;

/// Receives the return value of a scripted call
pub type PostHook<V> = Rc<dyn Fn(&Context, &V)>;

/// Native handler invoked directly with its context
pub type NativeFn = Rc<dyn Fn(&Context)>;

/// Entry variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    Scripted,
    Native,
}

/// Script-function callback with optional marshalling hooks
pub struct ScriptedCallback<V> {
    pub(crate) function: Retained<V>,
    pub(crate) context: Context,
    pub(crate) pre: Option<PreHook<V>>,
    pub(crate) post: Option<PostHook<V>>,
}

/// Directly invoked callback
pub struct NativeCallback {
    pub(crate) context: Context,
    pub(crate) function: NativeFn,
}

/// One registered callback
pub enum CallbackEntry<V> {
    Scripted(ScriptedCallback<V>),
    Native(NativeCallback),
}

impl<V> CallbackEntry<V> {
    pub fn kind(&self) -> CallbackKind {
        match self {
            CallbackEntry::Scripted(_) => CallbackKind::Scripted,
            CallbackEntry::Native(_) => CallbackKind::Native,
        }
    }

    pub fn context(&self) -> &Context {
        match self {
            CallbackEntry::Scripted(cb) => &cb.context,
            CallbackEntry::Native(cb) => &cb.context,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CallbackEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackEntry::Scripted(cb) => f
                .debug_struct("Scripted")
                .field("function", cb.function.get())
                .field("pre", &cb.pre.is_some())
                .field("post", &cb.post.is_some())
                .finish(),
            CallbackEntry::Native(_) => f.debug_struct("Native").finish_non_exhaustive(),
        }
    }
}

/// Occupied table slot: an entry plus its signaled flag
///
/// The flag is allocated per registration, so a `Signaler` for a removed
/// entry writes to a flag nothing reads.
pub(crate) struct Slot<V> {
    pub(crate) entry: CallbackEntry<V>,
    pub(crate) signaled: Arc<AtomicBool>,
}

impl<V> Slot<V> {
    pub(crate) fn new(entry: CallbackEntry<V>) -> Self {
        Self {
            entry,
            signaled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub(crate) fn raise(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set
    #[inline]
    pub(crate) fn take_signal(&self) -> bool {
        self.signaled.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }
}

/// Outcome counts of one `service()` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReport {
    /// Entries whose handler ran to completion
    pub invoked: usize,
    /// Scripted entries skipped because their function was not callable
    pub skipped: usize,
    /// Entries whose hook or handler failed
    pub failed: usize,
}

impl ServiceReport {
    /// Entries that were signaled this pass
    pub fn serviced(&self) -> usize {
        self.invoked + self.skipped + self.failed
    }
}
