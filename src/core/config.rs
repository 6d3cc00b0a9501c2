/*!
 * Table Configuration
 * Sizing knobs with defaults from limits, builder setters, and env overrides
 */

use super::errors::{CallbackError, CallbackResult};
use super::limits::{
    CALLBACK_GROWTH_CHUNK, ENV_GROWTH_CHUNK, ENV_INITIAL_CAPACITY, ENV_MAX_CAPACITY,
    INITIAL_CALLBACK_CAPACITY, MAX_CALLBACK_CAPACITY,
};
use serde::{Deserialize, Serialize};

/// Callback table sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Slots allocated by `init`
    pub initial_capacity: usize,
    /// Slots added whenever the table is full
    pub growth_chunk: usize,
    /// Capacity the table may never exceed
    pub max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: INITIAL_CALLBACK_CAPACITY,
            growth_chunk: CALLBACK_GROWTH_CHUNK,
            max_capacity: MAX_CALLBACK_CAPACITY,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, slots: usize) -> Self {
        self.initial_capacity = slots;
        self
    }

    pub fn with_growth_chunk(mut self, slots: usize) -> Self {
        self.growth_chunk = slots;
        self
    }

    pub fn with_max_capacity(mut self, slots: usize) -> Self {
        self.max_capacity = slots;
        self
    }

    /// Defaults overlaid with `DISPATCH_*` environment variables
    pub fn from_env() -> CallbackResult<Self> {
        let mut config = Self::default();
        if let Some(value) = read_env(ENV_INITIAL_CAPACITY)? {
            config.initial_capacity = value;
        }
        if let Some(value) = read_env(ENV_GROWTH_CHUNK)? {
            config.growth_chunk = value;
        }
        if let Some(value) = read_env(ENV_MAX_CAPACITY)? {
            config.max_capacity = value;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CallbackResult<()> {
        if self.growth_chunk == 0 {
            return Err(CallbackError::InvalidConfig(
                "growth_chunk must be at least 1".into(),
            ));
        }
        if self.initial_capacity > self.max_capacity {
            return Err(CallbackError::InvalidConfig(format!(
                "initial_capacity {} exceeds max_capacity {}",
                self.initial_capacity, self.max_capacity
            )));
        }
        // u32::MAX is the sentinel handle
        if self.max_capacity >= u32::MAX as usize {
            return Err(CallbackError::InvalidConfig(format!(
                "max_capacity {} does not fit in a handle",
                self.max_capacity
            )));
        }
        Ok(())
    }
}

fn read_env(key: &str) -> CallbackResult<Option<usize>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| CallbackError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
