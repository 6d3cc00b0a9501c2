/*!
 * Script Module
 * Scripting engine boundary and a local closure-backed engine
 */

mod local;
pub mod traits;

// Re-export public API
pub use local::{LocalEngine, LocalFunction, LocalValue, ScriptError};
pub use traits::{Retained, ScriptEngine};
