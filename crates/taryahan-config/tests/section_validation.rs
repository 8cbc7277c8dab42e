//! Section validation tests for taryahan-config.
// crates/taryahan-config/tests/section_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Validate server, store, rate limit, streamer, and admin rules.
// Purpose: Ensure invalid sections fail closed with clear messages.
// =============================================================================

use std::path::PathBuf;

use taryahan_config::AdminConfig;
use taryahan_config::ServerAuthMode;
use taryahan_config::StoreType;
use taryahan_config::StreamerConfig;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::minimal_config;

#[test]
fn defaults_are_valid() -> TestResult {
    minimal_config().validate().map_err(|err| err.to_string())
}

#[test]
fn public_bind_requires_bearer_auth() -> TestResult {
    let mut config = minimal_config();
    config.server.bind = "0.0.0.0:8080".to_string();
    assert_invalid(config.validate(), "non-loopback bind disallowed")?;
    config.server.auth.mode = ServerAuthMode::BearerToken;
    config.server.auth.bearer_tokens = vec!["s3cret-token".to_string()];
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn bad_bind_address_is_rejected() -> TestResult {
    let mut config = minimal_config();
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn bearer_mode_requires_tokens() -> TestResult {
    let mut config = minimal_config();
    config.server.auth.mode = ServerAuthMode::BearerToken;
    assert_invalid(config.validate(), "at least one token")?;
    config.server.auth.bearer_tokens = vec!["has space".to_string()];
    assert_invalid(config.validate(), "whitespace")
}

#[test]
fn local_only_rejects_tokens() -> TestResult {
    let mut config = minimal_config();
    config.server.auth.bearer_tokens = vec!["token".to_string()];
    assert_invalid(config.validate(), "bearer_tokens require bearer_token")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = minimal_config();
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = minimal_config();
    config.store.path = Some(PathBuf::from("taryahan.sqlite"));
    assert_invalid(config.validate(), "memory store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = minimal_config();
    config.store.store_type = StoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite store requires path")
}

#[test]
fn rate_limit_bounds_are_enforced() -> TestResult {
    let mut config = minimal_config();
    config.enquiry_rate_limit.max_attempts = 0;
    assert_invalid(config.validate(), "max_attempts")?;
    let mut config = minimal_config();
    config.enquiry_rate_limit.block_secs = 0;
    assert_invalid(config.validate(), "block_secs")?;
    let mut config = minimal_config();
    config.enquiry_rate_limit.max_entries = 1_000_000;
    assert_invalid(config.validate(), "max_entries")
}

#[test]
fn streamer_url_must_be_http() -> TestResult {
    let mut config = minimal_config();
    config.streamers.push(StreamerConfig {
        name: "Rina".to_string(),
        platform: "youtube".to_string(),
        channel_url: "ftp://example.com/rina".to_string(),
        live: true,
    });
    assert_invalid(config.validate(), "channel_url")
}

#[test]
fn admin_email_must_be_valid_and_unique() -> TestResult {
    let mut config = minimal_config();
    config.admins.push(AdminConfig { name: "Ops".to_string(), email: "not-an-email".to_string() });
    assert_invalid(config.validate(), "admins.email is invalid")?;
    let mut config = minimal_config();
    let admin = AdminConfig { name: "Ops".to_string(), email: "ops@taryahan.example".to_string() };
    config.admins.push(admin.clone());
    config.admins.push(AdminConfig { email: "OPS@taryahan.example".to_string(), ..admin });
    assert_invalid(config.validate(), "duplicate admin email")
}
