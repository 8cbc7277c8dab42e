// crates/taryahan-server/src/streamers.rs
// ============================================================================
// Module: Streamer Listing
// Description: Source of the public streamer directory.
// Purpose: Decouple the listing route from where streamer data lives.
// Dependencies: taryahan-config
// ============================================================================

//! ## Overview
//! The listing routes read from a [`StreamerSource`]. The built-in source
//! serves the `[[streamers]]` entries from configuration. The plain listing
//! carries [`StreamerSummary`] rows without live status; the detailed listing
//! carries full entries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use taryahan_config::StreamerConfig;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Streamer entry without live status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamerSummary {
    /// Display name.
    pub name: String,
    /// Streaming platform label.
    pub platform: String,
    /// Channel URL.
    pub channel_url: String,
}

impl From<StreamerConfig> for StreamerSummary {
    fn from(entry: StreamerConfig) -> Self {
        Self { name: entry.name, platform: entry.platform, channel_url: entry.channel_url }
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Provider of streamer entries.
pub trait StreamerSource: Send + Sync {
    /// Returns the current listing with details.
    fn streamers(&self) -> Vec<StreamerConfig>;

    /// Returns the current listing without live status.
    fn summaries(&self) -> Vec<StreamerSummary> {
        self.streamers().into_iter().map(StreamerSummary::from).collect()
    }
}

/// Fixed listing loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticStreamerSource {
    /// Configured entries.
    entries: Vec<StreamerConfig>,
}

impl StaticStreamerSource {
    /// Wraps configured entries.
    #[must_use]
    pub const fn new(entries: Vec<StreamerConfig>) -> Self {
        Self { entries }
    }
}

impl StreamerSource for StaticStreamerSource {
    fn streamers(&self) -> Vec<StreamerConfig> {
        self.entries.clone()
    }
}
