// crates/taryahan-cli/src/stats.rs
// ============================================================================
// Module: Offline Statistics
// Description: Computes resource statistics straight from the configured store.
// Purpose: Back the `taryahan stats <resource>` command.
// Dependencies: clap, serde_json, taryahan-config, taryahan-core, taryahan-server
// ============================================================================

//! ## Overview
//! Opens the store named by configuration, runs the same aggregation the
//! HTTP statistics routes use, and returns the result as JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::ValueEnum;
use serde_json::Value;
use taryahan_config::StoreConfig;
use taryahan_core::ResourceKind;
use taryahan_core::ServiceError;
use taryahan_core::Timestamp;
use taryahan_server::ServerError;
use taryahan_server::build_services;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resource selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsTarget {
    /// Dota2 pub records.
    PubRecords,
    /// Tournament matches.
    Matches,
    /// Partner enquiries.
    Enquiries,
}

impl StatsTarget {
    /// Returns the resource this target names.
    #[must_use]
    pub const fn kind(self) -> ResourceKind {
        match self {
            Self::PubRecords => ResourceKind::PubRecord,
            Self::Matches => ResourceKind::TournamentMatch,
            Self::Enquiries => ResourceKind::PartnerEnquiry,
        }
    }
}

/// Offline statistics failures.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The store could not be opened.
    #[error(transparent)]
    Store(#[from] ServerError),
    /// Aggregation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The aggregate could not be encoded.
    #[error("failed to encode statistics: {0}")]
    Encode(String),
}

// ============================================================================
// SECTION: Command
// ============================================================================

/// Computes statistics for one resource as of `now`.
///
/// # Errors
///
/// Returns [`StatsError`] when the store cannot be opened or read.
pub fn collect_stats(
    store: &StoreConfig,
    target: StatsTarget,
    now: Timestamp,
) -> Result<Value, StatsError> {
    let (pub_records, matches, enquiries) = build_services(store)?;
    let encoded = match target {
        StatsTarget::PubRecords => serde_json::to_value(pub_records.statistics(now)?),
        StatsTarget::Matches => serde_json::to_value(matches.statistics(now)?),
        StatsTarget::Enquiries => serde_json::to_value(enquiries.statistics(now)?),
    };
    encoded.map_err(|err| StatsError::Encode(err.to_string()))
}
