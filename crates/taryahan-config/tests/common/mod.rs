// crates/taryahan-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for taryahan-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use taryahan_config::ConfigError;
use taryahan_config::TaryahanConfig;

/// Result type for tests that report failures as strings.
pub type TestResult = Result<(), String>;

/// Returns a config with all defaults applied.
pub fn minimal_config() -> TaryahanConfig {
    TaryahanConfig::default()
}

/// Asserts that validation failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
