// crates/taryahan-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for operators and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `taryahan.toml`. The example must always pass
//! [`crate::TaryahanConfig::validate`].

/// Returns a canonical example `taryahan.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "0.0.0.0:8080"
max_body_bytes = 65536
expose_error_details = false

[server.auth]
mode = "bearer_token"
bearer_tokens = ["replace-with-a-long-random-token"]

[server.audit]
enabled = true
path = "logs/audit.jsonl"

[store]
type = "sqlite"
path = "data/taryahan.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[enquiry_rate_limit]
max_attempts = 5
window_secs = 900
block_secs = 900
max_entries = 4096

[[streamers]]
name = "Taryahan Official"
platform = "twitch"
channel_url = "https://www.twitch.tv/taryahan"
live = false

[[admins]]
name = "Tournament Admin"
email = "admin@taryahan.example"
"#,
    )
}
