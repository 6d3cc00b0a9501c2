/*!
 * Configuration Tests
 * Environment overrides for table sizing
 */

use deferred_callbacks::core::limits::{ENV_GROWTH_CHUNK, ENV_INITIAL_CAPACITY, ENV_MAX_CAPACITY};
use deferred_callbacks::{CallbackError, CallbackTable, LocalEngine, TableConfig};
use pretty_assertions::assert_eq;
use serial_test::serial;

fn clear_env() {
    for key in [ENV_INITIAL_CAPACITY, ENV_GROWTH_CHUNK, ENV_MAX_CAPACITY] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_env_defaults() {
    clear_env();
    assert_eq!(TableConfig::from_env().unwrap(), TableConfig::default());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var(ENV_INITIAL_CAPACITY, "8");
    std::env::set_var(ENV_GROWTH_CHUNK, " 4 ");
    std::env::set_var(ENV_MAX_CAPACITY, "128");

    let config = TableConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.initial_capacity, 8);
    assert_eq!(config.growth_chunk, 4);
    assert_eq!(config.max_capacity, 128);

    let table = CallbackTable::init(LocalEngine::new(), config).unwrap();
    assert_eq!(table.capacity(), 8);
}

#[test]
#[serial]
fn test_env_rejects_garbage() {
    clear_env();
    std::env::set_var(ENV_GROWTH_CHUNK, "sixteen");
    let result = TableConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(CallbackError::InvalidConfig(_))));
}

#[test]
#[serial]
fn test_env_rejects_inconsistent_sizes() {
    clear_env();
    std::env::set_var(ENV_INITIAL_CAPACITY, "64");
    std::env::set_var(ENV_MAX_CAPACITY, "32");
    let result = TableConfig::from_env();
    clear_env();

    assert!(result.is_err());
}
