/*!
 * Table Limits and Constants
 *
 * Centralized location for callback table sizing and environment knobs.
 */

// =============================================================================
// TABLE SIZING
// =============================================================================

/// Slots allocated at init (16)
/// Covers a typical set of bound peripherals without growing
pub const INITIAL_CALLBACK_CAPACITY: usize = 16;

/// Slots added each time the table is full (16)
/// Fixed increment keeps growth predictable on constrained targets
pub const CALLBACK_GROWTH_CHUNK: usize = 16;

/// Upper bound on table capacity (65,536)
/// Growth past this fails registration with ResourceExhausted
pub const MAX_CALLBACK_CAPACITY: usize = 64 * 1024;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides `initial_capacity`
pub const ENV_INITIAL_CAPACITY: &str = "DISPATCH_INITIAL_CAPACITY";

/// Overrides `growth_chunk`
pub const ENV_GROWTH_CHUNK: &str = "DISPATCH_GROWTH_CHUNK";

/// Overrides `max_capacity`
pub const ENV_MAX_CAPACITY: &str = "DISPATCH_MAX_CAPACITY";

/// Enables JSON log output when "1" or "true"
pub const ENV_TRACE_JSON: &str = "DISPATCH_TRACE_JSON";
