// crates/taryahan-core/src/core/mod.rs
// ============================================================================
// Module: Taryahan Core Types
// Description: Record, query, validation, and statistics models.
// Purpose: Group the pure, storage-agnostic parts of the core.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Pure data types and functions. Nothing here performs I/O or reads the
//! clock.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod query;
pub mod records;
pub mod resource;
pub mod stats;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::RecordId;
pub use identifiers::ResourceKind;
pub use query::DEFAULT_PER_PAGE;
pub use query::ListQuery;
pub use query::MAX_PER_PAGE;
pub use query::Page;
pub use query::Pagination;
pub use query::SearchTerm;
pub use query::SortDirection;
pub use query::SortField;
pub use records::GameType;
pub use records::PartnerEnquiry;
pub use records::PartnerEnquiryDraft;
pub use records::PubRecord;
pub use records::PubRecordDraft;
pub use records::ROSTER_SIZE;
pub use records::Roster;
pub use records::TournamentMatch;
pub use records::TournamentMatchDraft;
pub use records::Winner;
pub use records::WinnerUpdate;
pub use records::mask_email;
pub use resource::EnquirySort;
pub use resource::Immutable;
pub use resource::MatchSort;
pub use resource::PartnerEnquiries;
pub use resource::PubRecordSort;
pub use resource::PubRecords;
pub use resource::Resource;
pub use resource::TournamentMatches;
pub use stats::CaptainCount;
pub use stats::EnquiryStats;
pub use stats::PubRecordStats;
pub use stats::TournamentStats;
pub use self::time::MatchDate;
pub use self::time::Timestamp;
pub use validation::FieldErrors;
pub use validation::ValidationError;
pub use validation::is_valid_email;
