// crates/taryahan-config/src/config.rs
// ============================================================================
// Module: Taryahan Configuration
// Description: Configuration loading and validation for the Taryahan service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: taryahan-core, taryahan-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file yields a loopback-only server
//! over an in-memory store. Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use taryahan_core::is_valid_email;
use taryahan_store_sqlite::SqliteStoreConfig;
use taryahan_store_sqlite::SqliteStoreMode;
use taryahan_store_sqlite::SqliteSyncMode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "taryahan.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TARYAHAN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Largest accepted request body limit in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum number of server auth tokens.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Default busy timeout for the sqlite store (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default enquiry attempts allowed per window.
const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: u32 = 5;
/// Default enquiry attempt window in seconds.
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
/// Default enquiry block duration in seconds.
const DEFAULT_RATE_LIMIT_BLOCK_SECS: u64 = 15 * 60;
/// Default max tracked rate limit entries.
const DEFAULT_RATE_LIMIT_MAX_ENTRIES: usize = 4_096;
/// Maximum allowed attempts per window.
pub(crate) const MAX_RATE_LIMIT_ATTEMPTS: u32 = 10_000;
/// Maximum allowed window or block duration in seconds.
pub(crate) const MAX_RATE_LIMIT_SECS: u64 = 24 * 60 * 60;
/// Maximum number of tracked rate limit entries.
pub(crate) const MAX_RATE_LIMIT_ENTRIES: usize = 65_536;
/// Maximum number of configured streamers.
pub(crate) const MAX_STREAMERS: usize = 256;
/// Maximum number of configured admin accounts.
pub(crate) const MAX_ADMINS: usize = 64;
/// Maximum length of a display name or platform label.
const MAX_LABEL_LENGTH: usize = 255;
/// Maximum length of a channel URL.
const MAX_URL_LENGTH: usize = 2048;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Taryahan service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaryahanConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Public enquiry form rate limit.
    #[serde(default)]
    pub enquiry_rate_limit: EnquiryRateLimitConfig,
    /// Static streamer listing.
    #[serde(default)]
    pub streamers: Vec<StreamerConfig>,
    /// Admin accounts handed to the seed hook at startup.
    #[serde(default)]
    pub admins: Vec<AdminConfig>,
}

impl TaryahanConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `TARYAHAN_CONFIG`, then
    /// `taryahan.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.enquiry_rate_limit.validate()?;
        if self.streamers.len() > MAX_STREAMERS {
            return Err(ConfigError::Invalid("too many streamers".to_string()));
        }
        for streamer in &self.streamers {
            streamer.validate()?;
        }
        if self.admins.len() > MAX_ADMINS {
            return Err(ConfigError::Invalid("too many admins".to_string()));
        }
        let mut emails = BTreeSet::new();
        for admin in &self.admins {
            admin.validate()?;
            if !emails.insert(admin.email.to_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate admin email: {}",
                    admin.email
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Include internal error detail in 500 responses.
    #[serde(default)]
    pub expose_error_details: bool,
    /// Admin route authentication.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            expose_error_details: false,
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid("max_body_bytes too large".to_string()));
        }
        self.auth.validate()?;
        self.audit.validate()?;
        let addr = self.bind_addr()?;
        if !addr.ip().is_loopback() && self.auth.mode == ServerAuthMode::LocalOnly {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without auth policy".to_string(),
            ));
        }
        Ok(())
    }
}

/// Admin route auth modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Loopback peers only.
    #[default]
    LocalOnly,
    /// Bearer token authentication.
    BearerToken,
}

/// Admin route authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAuthConfig {
    /// Auth mode for admin routes.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Accepted bearer tokens (required for `bearer_token` mode).
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if !self.bearer_tokens.is_empty() {
                    return Err(ConfigError::Invalid(
                        "bearer_tokens require bearer_token auth mode".to_string(),
                    ));
                }
            }
            ServerAuthMode::BearerToken => {
                if self.bearer_tokens.is_empty() {
                    return Err(ConfigError::Invalid(
                        "bearer_token auth requires at least one token".to_string(),
                    ));
                }
                if self.bearer_tokens.len() > MAX_AUTH_TOKENS {
                    return Err(ConfigError::Invalid("too many bearer tokens".to_string()));
                }
                for token in &self.bearer_tokens {
                    if token.trim().is_empty() {
                        return Err(ConfigError::Invalid(
                            "bearer tokens must be non-empty".to_string(),
                        ));
                    }
                    if token.len() > MAX_AUTH_TOKEN_LENGTH {
                        return Err(ConfigError::Invalid("bearer token too long".to_string()));
                    }
                    if token.chars().any(char::is_whitespace) {
                        return Err(ConfigError::Invalid(
                            "bearer tokens must not contain whitespace".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self { enabled: default_audit_enabled(), path: None }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local store; rows vanish on restart.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite,
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => self.path.as_ref().map(|path| SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_store_path(path)
            }
        }
    }
}

// ============================================================================
// SECTION: Rate Limit
// ============================================================================

/// Rate limit for the public enquiry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EnquiryRateLimitConfig {
    /// Attempts allowed before the client is blocked.
    #[serde(default = "default_rate_limit_max_attempts")]
    pub max_attempts: u32,
    /// Attempt counter expiry in seconds, refreshed on every attempt.
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
    /// Block duration in seconds.
    #[serde(default = "default_rate_limit_block_secs")]
    pub block_secs: u64,
    /// Maximum number of distinct clients tracked.
    #[serde(default = "default_rate_limit_max_entries")]
    pub max_entries: usize,
}

impl Default for EnquiryRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_rate_limit_max_attempts(),
            window_secs: default_rate_limit_window_secs(),
            block_secs: default_rate_limit_block_secs(),
            max_entries: default_rate_limit_max_entries(),
        }
    }
}

impl EnquiryRateLimitConfig {
    /// Returns the attempt window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Returns the block duration.
    #[must_use]
    pub const fn block(&self) -> Duration {
        Duration::from_secs(self.block_secs)
    }

    /// Validates rate limit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_RATE_LIMIT_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "enquiry_rate_limit max_attempts must be between 1 and {MAX_RATE_LIMIT_ATTEMPTS}"
            )));
        }
        for (field, value) in [("window_secs", self.window_secs), ("block_secs", self.block_secs)] {
            if value == 0 || value > MAX_RATE_LIMIT_SECS {
                return Err(ConfigError::Invalid(format!(
                    "enquiry_rate_limit {field} must be between 1 and {MAX_RATE_LIMIT_SECS}"
                )));
            }
        }
        if self.max_entries == 0 || self.max_entries > MAX_RATE_LIMIT_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "enquiry_rate_limit max_entries must be between 1 and {MAX_RATE_LIMIT_ENTRIES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Streamers and Admins
// ============================================================================

/// One entry in the public streamer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Display name.
    pub name: String,
    /// Streaming platform label.
    pub platform: String,
    /// Channel URL.
    pub channel_url: String,
    /// Whether the channel is currently live.
    #[serde(default)]
    pub live: bool,
}

impl StreamerConfig {
    /// Validates a streamer entry.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_label("streamers.name", &self.name)?;
        validate_label("streamers.platform", &self.platform)?;
        let url = self.channel_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid(
                "streamers.channel_url must be an http(s) url".to_string(),
            ));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(ConfigError::Invalid("streamers.channel_url too long".to_string()));
        }
        Ok(())
    }
}

/// Admin account to seed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminConfig {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
}

impl AdminConfig {
    /// Validates an admin entry.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_label("admins.name", &self.name)?;
        if !is_valid_email(&self.email) {
            return Err(ConfigError::Invalid(format!("admins.email is invalid: {}", self.email)));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, environment, or default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the config file path.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path given as a config string.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the sqlite store path.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("store path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a short required label.
fn validate_label(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_LABEL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default max body bytes.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default sqlite busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default enquiry attempts per window.
const fn default_rate_limit_max_attempts() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_ATTEMPTS
}

/// Default enquiry window.
const fn default_rate_limit_window_secs() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_SECS
}

/// Default enquiry block.
const fn default_rate_limit_block_secs() -> u64 {
    DEFAULT_RATE_LIMIT_BLOCK_SECS
}

/// Default tracked entries.
const fn default_rate_limit_max_entries() -> usize {
    DEFAULT_RATE_LIMIT_MAX_ENTRIES
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::ServerAuthMode;
    use super::StoreType;
    use super::TaryahanConfig;

    #[test]
    fn empty_config_uses_loopback_memory_defaults() {
        let config = TaryahanConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.max_body_bytes, 65_536);
        assert!(!config.server.expose_error_details);
        assert_eq!(config.server.auth.mode, ServerAuthMode::LocalOnly);
        assert!(config.server.audit.enabled);
        assert_eq!(config.store.store_type, StoreType::Memory);
        assert!(config.store.sqlite().is_none());
        assert_eq!(config.enquiry_rate_limit.max_attempts, 5);
        assert_eq!(config.enquiry_rate_limit.window_secs, 900);
        assert_eq!(config.enquiry_rate_limit.block_secs, 900);
        assert_eq!(config.enquiry_rate_limit.max_entries, 4096);
    }

    #[test]
    fn sqlite_section_builds_store_config() {
        let config = TaryahanConfig::from_toml_str(
            "[store]\ntype = \"sqlite\"\npath = \"data/taryahan.sqlite\"\nbusy_timeout_ms = 250\n",
        )
        .unwrap();
        let sqlite = config.store.sqlite().unwrap();
        assert_eq!(sqlite.path.to_string_lossy(), "data/taryahan.sqlite");
        assert_eq!(sqlite.busy_timeout_ms, 250);
    }
}
