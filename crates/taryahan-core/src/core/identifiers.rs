// crates/taryahan-core/src/core/identifiers.rs
// ============================================================================
// Module: Taryahan Identifiers
// Description: Row identifiers and resource kinds.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Record identifiers are positive integers assigned by the record store.
//! Identifiers arriving from callers are untrusted text; anything that is not a
//! positive integer simply cannot name a row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Record Identifier
// ============================================================================

/// Store-assigned row identifier.
///
/// # Invariants
/// - The wrapped value is always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RecordId(i64);

impl RecordId {
    /// Creates a record identifier, rejecting zero and negative values.
    #[must_use]
    pub const fn new(value: i64) -> Option<Self> {
        if value > 0 { Some(Self(value)) } else { None }
    }

    /// Parses a record identifier from untrusted path text.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<i64>().ok().and_then(Self::new)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<i64> for RecordId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("record id must be positive, got {value}"))
    }
}

impl From<RecordId> for i64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Resource Kind
// ============================================================================

/// The record kinds managed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Dota2 pub record.
    PubRecord,
    /// Taryahan tournament match.
    TournamentMatch,
    /// Public partner enquiry.
    PartnerEnquiry,
}

impl ResourceKind {
    /// Returns a stable label for logs and audit events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PubRecord => "pub_record",
            Self::TournamentMatch => "tournament_match",
            Self::PartnerEnquiry => "partner_enquiry",
        }
    }

    /// Returns the singular noun used in user-facing messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::PubRecord => "Record",
            Self::TournamentMatch => "Match",
            Self::PartnerEnquiry => "Enquiry",
        }
    }

    /// Returns the plural noun used in user-facing messages.
    #[must_use]
    pub const fn plural_noun(self) -> &'static str {
        match self {
            Self::PubRecord => "Records",
            Self::TournamentMatch => "Matches",
            Self::PartnerEnquiry => "Enquiries",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
