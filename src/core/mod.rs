/*!
 * Core Module
 * Handles, allocation, configuration, and error handling
 */

pub mod config;
pub mod errors;
pub mod id;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::TableConfig;
pub use errors::*;
pub use id::{Handle, HandleAllocator, SlotStorage};
pub use types::*;
