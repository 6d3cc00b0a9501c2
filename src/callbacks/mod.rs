/*!
 * Callbacks Module
 * Deferred callback dispatch: signal from anywhere, service on the main loop
 */

mod dispatch;
mod signaler;
mod stats;
mod store;
mod table;
pub mod types;

// Re-export public API
pub use signaler::Signaler;
pub use stats::{AtomicDispatchStats, DispatchStats};
pub use table::CallbackTable;
pub use types::{
    CallbackEntry, CallbackKind, NativeCallback, NativeFn, PostHook, PreHook, ScriptedCallback,
    ServiceReport,
};
