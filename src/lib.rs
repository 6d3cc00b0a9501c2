/*!
 * Deferred Callbacks Library
 * Callback dispatch table for cooperative main loops with a scripting engine
 *
 * Producers register a scripted or native callback and get a `Handle`. Later,
 * possibly from another thread through a `Signaler`, they signal it. The host
 * calls `CallbackTable::service()` once per loop iteration to run every
 * signaled callback on the thread that owns the engine.
 */

pub mod callbacks;
pub mod core;
pub mod monitoring;
pub mod script;

// Re-exports
pub use crate::core::{
    CallbackError, CallbackResult, Context, Handle, TableConfig,
};
pub use callbacks::{
    CallbackKind, CallbackTable, DispatchStats, NativeFn, PostHook, PreHook, ServiceReport,
    Signaler,
};
pub use monitoring::init_tracing;
pub use script::{LocalEngine, LocalValue, Retained, ScriptEngine, ScriptError};
