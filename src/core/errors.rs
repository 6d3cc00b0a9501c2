/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::id::Handle;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for callback table operations
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Callback table errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CallbackError {
    #[error("Callback table exhausted: capacity {capacity} cannot grow past limit {limit}")]
    #[diagnostic(
        code(callbacks::resource_exhausted),
        help("Remove unused callbacks or raise max_capacity in the table config.")
    )]
    ResourceExhausted { capacity: usize, limit: usize },

    #[error("Failed to allocate storage for {requested} callback slots")]
    #[diagnostic(
        code(callbacks::allocation_failed),
        help("System may be low on memory. Consider freeing resources.")
    )]
    AllocationFailed { requested: usize },

    #[error("Callback table initialization failed: {0}")]
    #[diagnostic(
        code(callbacks::init_failed),
        help("The host should abort startup; no callbacks can be registered.")
    )]
    InitFailed(String),

    #[error("Invalid table configuration: {0}")]
    #[diagnostic(
        code(callbacks::invalid_config),
        help("Check DISPATCH_* environment variables and TableConfig values.")
    )]
    InvalidConfig(String),

    #[error("Callback {handle} failed: {reason}")]
    #[diagnostic(
        code(callbacks::handler_failed),
        help("The failure is isolated to this callback; servicing continued.")
    )]
    HandlerFailed { handle: Handle, reason: String },
}

impl CallbackError {
    /// Whether the error means a registration did not happen
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            CallbackError::ResourceExhausted { .. } | CallbackError::AllocationFailed { .. }
        )
    }
}
