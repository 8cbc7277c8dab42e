// crates/taryahan-core/src/core/resource.rs
// ============================================================================
// Module: Taryahan Resource Capability
// Description: One filtered, paginated, validated record capability.
// Purpose: Describe each record kind once so services and stores stay generic.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The three record kinds share a single lifecycle: validate a body, persist a
//! row, list rows through search/date/sort/page filters, and aggregate. The
//! [`Resource`] trait captures everything that differs between them (types,
//! sort allow-list, search predicate, rules, invariants, statistics) so the
//! service and the stores implement the lifecycle exactly once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt::Debug;

use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::RecordId;
use crate::core::identifiers::ResourceKind;
use crate::core::query::SearchTerm;
use crate::core::query::SortField;
use crate::core::records::GameType;
use crate::core::records::PartnerEnquiry;
use crate::core::records::PartnerEnquiryDraft;
use crate::core::records::PubRecord;
use crate::core::records::PubRecordDraft;
use crate::core::records::TournamentMatch;
use crate::core::records::TournamentMatchDraft;
use crate::core::records::Winner;
use crate::core::records::WinnerUpdate;
use crate::core::stats::EnquiryStats;
use crate::core::stats::PubRecordStats;
use crate::core::stats::TournamentStats;
use crate::core::stats::enquiry_stats;
use crate::core::stats::pub_record_stats;
use crate::core::stats::tournament_stats;
use crate::core::time::MatchDate;
use crate::core::time::Timestamp;
use crate::core::validation::FieldErrors;
use crate::core::validation::MessageOverrides;
use crate::core::validation::Payload;
use crate::core::validation::ValidationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest accepted name-like field on pub records and matches.
pub const MAX_NAME_LEN: usize = 255;

/// Longest accepted short enquiry field.
pub const MAX_ENQUIRY_FIELD_LEN: usize = 50;

/// Longest accepted enquiry message.
pub const MAX_ENQUIRY_MESSAGE_LEN: usize = 1000;

/// Pub record message wording.
const PUB_RECORD_MESSAGES: MessageOverrides = &[
    ("name.required", "Name is required"),
    ("total_pubs.required", "Total pubs is required"),
    ("total_pubs.min", "Total pubs must be at least 1"),
    ("win.required", "Win count is required"),
    ("win.min", "Win count cannot be negative"),
    ("lose.required", "Lose count is required"),
    ("lose.min", "Lose count cannot be negative"),
    ("match_date.required", "Match date is required"),
    ("match_date.date", "Match date must be a valid date"),
];

/// Tournament match message wording.
const MATCH_MESSAGES: MessageOverrides = &[
    ("team_a_players.size", "Team A must have exactly 5 players"),
    ("team_b_players.size", "Team B must have exactly 5 players"),
    ("team_a_players.*.required", "Each Team A player name is required"),
    ("team_b_players.*.required", "Each Team B player name is required"),
];

/// Count rule message.
pub const COUNT_MISMATCH_MESSAGE: &str = "Win count + Lose count must equal Total Pubs";

/// Team A captain membership message.
pub const TEAM_A_CAPTAIN_MESSAGE: &str = "Captain must be a player in Team A";

/// Team B captain membership message.
pub const TEAM_B_CAPTAIN_MESSAGE: &str = "Captain must be a player in Team B";

// ============================================================================
// SECTION: Resource Trait
// ============================================================================

/// Everything that distinguishes one record kind from another.
pub trait Resource: Send + Sync + 'static {
    /// Persisted row.
    type Record: Clone + Debug + Serialize + Send + Sync + 'static;
    /// Validated create input.
    type Draft: Clone + Debug + Send + Sync + 'static;
    /// Validated update input.
    type Patch: Debug + Send + Sync + 'static;
    /// Sortable column allow-list.
    type Sort: SortField;
    /// Aggregate view.
    type Stats: Clone + Debug + Serialize + Send + 'static;

    /// Resource kind label.
    const KIND: ResourceKind;

    /// Returns the row identifier.
    fn record_id(record: &Self::Record) -> RecordId;

    /// Returns the date bounded by `date_from` and `date_to`.
    fn filter_date(record: &Self::Record) -> MatchDate;

    /// Returns true when any searchable field matches.
    fn matches_search(record: &Self::Record, term: &SearchTerm) -> bool;

    /// Ascending comparison on one sort column.
    fn compare(left: &Self::Record, right: &Self::Record, field: Self::Sort) -> Ordering;

    /// Builds a new row from a validated draft.
    fn assemble(id: RecordId, draft: &Self::Draft, at: Timestamp) -> Self::Record;

    /// Applies a validated patch in place.
    fn apply_patch(record: &mut Self::Record, patch: &Self::Patch, at: Timestamp);

    /// Validates a create body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when schema or semantic checks fail.
    fn validate_draft(body: &Value) -> Result<Self::Draft, ValidationError>;

    /// Validates an update body.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when schema or semantic checks fail.
    fn validate_patch(body: &Value) -> Result<Self::Patch, ValidationError>;

    /// Aggregates the full row set.
    fn statistics(rows: &[Self::Record], now: Timestamp) -> Self::Stats;
}

// ============================================================================
// SECTION: Pub Records
// ============================================================================

/// Dota2 pub records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubRecords;

/// Sortable pub record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubRecordSort {
    /// Row id.
    Id,
    /// Player name.
    Name,
    /// Pubs played.
    TotalPubs,
    /// Pubs won.
    Win,
    /// Pubs lost.
    Lose,
    /// Day played.
    MatchDate,
    /// Creation time.
    CreatedAt,
    /// Modification time.
    UpdatedAt,
}

impl SortField for PubRecordSort {
    const DEFAULT: Self = Self::MatchDate;
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::Name,
        Self::TotalPubs,
        Self::Win,
        Self::Lose,
        Self::MatchDate,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::TotalPubs => "total_pubs",
            Self::Win => "win",
            Self::Lose => "lose",
            Self::MatchDate => "match_date",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl Resource for PubRecords {
    type Record = PubRecord;
    type Draft = PubRecordDraft;
    type Patch = PubRecordDraft;
    type Sort = PubRecordSort;
    type Stats = PubRecordStats;

    const KIND: ResourceKind = ResourceKind::PubRecord;

    fn record_id(record: &PubRecord) -> RecordId {
        record.id
    }

    fn filter_date(record: &PubRecord) -> MatchDate {
        record.match_date
    }

    fn matches_search(record: &PubRecord, term: &SearchTerm) -> bool {
        term.within(&record.name)
    }

    fn compare(left: &PubRecord, right: &PubRecord, field: PubRecordSort) -> Ordering {
        match field {
            PubRecordSort::Id => left.id.cmp(&right.id),
            PubRecordSort::Name => left.name.cmp(&right.name),
            PubRecordSort::TotalPubs => left.total_pubs.cmp(&right.total_pubs),
            PubRecordSort::Win => left.win.cmp(&right.win),
            PubRecordSort::Lose => left.lose.cmp(&right.lose),
            PubRecordSort::MatchDate => left.match_date.cmp(&right.match_date),
            PubRecordSort::CreatedAt => left.created_at.cmp(&right.created_at),
            PubRecordSort::UpdatedAt => left.updated_at.cmp(&right.updated_at),
        }
    }

    fn assemble(id: RecordId, draft: &PubRecordDraft, at: Timestamp) -> PubRecord {
        PubRecord::from_draft(id, draft, at)
    }

    fn apply_patch(record: &mut PubRecord, patch: &PubRecordDraft, at: Timestamp) {
        let created_at = record.created_at;
        *record = PubRecord::from_draft(record.id, patch, at);
        record.created_at = created_at;
    }

    fn validate_draft(body: &Value) -> Result<PubRecordDraft, ValidationError> {
        let mut payload = Payload::new(body, PUB_RECORD_MESSAGES);
        let name = payload.required_string("name", MAX_NAME_LEN);
        let total_pubs = payload.required_integer("total_pubs", 1);
        let win = payload.required_integer("win", 0);
        let lose = payload.required_integer("lose", 0);
        let match_date = payload.required_date("match_date");
        let draft = match (name, total_pubs, win, lose, match_date) {
            (Some(name), Some(total_pubs), Some(win), Some(lose), Some(match_date)) => {
                Some(PubRecordDraft { name, total_pubs, win, lose, match_date })
            }
            _ => None,
        };
        let draft = payload.finish(draft)?;
        check_pub_counts(&draft)?;
        Ok(draft)
    }

    fn validate_patch(body: &Value) -> Result<PubRecordDraft, ValidationError> {
        Self::validate_draft(body)
    }

    fn statistics(rows: &[PubRecord], _now: Timestamp) -> PubRecordStats {
        pub_record_stats(rows)
    }
}

/// Enforces `win + lose == total_pubs`.
///
/// # Errors
///
/// Returns [`ValidationError::Semantic`] keyed `total_pubs` on mismatch.
pub fn check_pub_counts(draft: &PubRecordDraft) -> Result<(), ValidationError> {
    if u64::from(draft.win) + u64::from(draft.lose) == u64::from(draft.total_pubs) {
        return Ok(());
    }
    Err(ValidationError::Semantic(FieldErrors::single("total_pubs", COUNT_MISMATCH_MESSAGE)))
}

// ============================================================================
// SECTION: Tournament Matches
// ============================================================================

/// Taryahan tournament matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentMatches;

/// Sortable tournament match columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSort {
    /// Row id.
    Id,
    /// Team A name.
    TeamAName,
    /// Team B name.
    TeamBName,
    /// Team A captain.
    TeamACaptain,
    /// Team B captain.
    TeamBCaptain,
    /// Winner label; undecided matches sort first ascending.
    Winner,
    /// Game type label.
    GameType,
    /// Day of the match.
    MatchDate,
    /// Creation time.
    CreatedAt,
    /// Modification time.
    UpdatedAt,
}

impl SortField for MatchSort {
    const DEFAULT: Self = Self::MatchDate;
    const ALL: &'static [Self] = &[
        Self::Id,
        Self::TeamAName,
        Self::TeamBName,
        Self::TeamACaptain,
        Self::TeamBCaptain,
        Self::Winner,
        Self::GameType,
        Self::MatchDate,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::TeamAName => "team_a_name",
            Self::TeamBName => "team_b_name",
            Self::TeamACaptain => "team_a_captain",
            Self::TeamBCaptain => "team_b_captain",
            Self::Winner => "winner",
            Self::GameType => "game_type",
            Self::MatchDate => "match_date",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl Resource for TournamentMatches {
    type Record = TournamentMatch;
    type Draft = TournamentMatchDraft;
    type Patch = WinnerUpdate;
    type Sort = MatchSort;
    type Stats = TournamentStats;

    const KIND: ResourceKind = ResourceKind::TournamentMatch;

    fn record_id(record: &TournamentMatch) -> RecordId {
        record.id
    }

    fn filter_date(record: &TournamentMatch) -> MatchDate {
        record.match_date
    }

    fn matches_search(record: &TournamentMatch, term: &SearchTerm) -> bool {
        [&record.team_a_name, &record.team_b_name, &record.team_a_captain, &record.team_b_captain]
            .into_iter()
            .any(|field| term.within(field))
            || record.team_a_players.iter().any(|player| term.equals(player))
            || record.team_b_players.iter().any(|player| term.equals(player))
    }

    fn compare(left: &TournamentMatch, right: &TournamentMatch, field: MatchSort) -> Ordering {
        match field {
            MatchSort::Id => left.id.cmp(&right.id),
            MatchSort::TeamAName => left.team_a_name.cmp(&right.team_a_name),
            MatchSort::TeamBName => left.team_b_name.cmp(&right.team_b_name),
            MatchSort::TeamACaptain => left.team_a_captain.cmp(&right.team_a_captain),
            MatchSort::TeamBCaptain => left.team_b_captain.cmp(&right.team_b_captain),
            MatchSort::Winner => {
                left.winner.map(Winner::as_str).cmp(&right.winner.map(Winner::as_str))
            }
            MatchSort::GameType => left.game_type.as_str().cmp(right.game_type.as_str()),
            MatchSort::MatchDate => left.match_date.cmp(&right.match_date),
            MatchSort::CreatedAt => left.created_at.cmp(&right.created_at),
            MatchSort::UpdatedAt => left.updated_at.cmp(&right.updated_at),
        }
    }

    fn assemble(id: RecordId, draft: &TournamentMatchDraft, at: Timestamp) -> TournamentMatch {
        TournamentMatch::from_draft(id, draft, at)
    }

    fn apply_patch(record: &mut TournamentMatch, patch: &WinnerUpdate, at: Timestamp) {
        record.winner = Some(patch.winner);
        record.updated_at = at;
    }

    fn validate_draft(body: &Value) -> Result<TournamentMatchDraft, ValidationError> {
        let mut payload = Payload::new(body, MATCH_MESSAGES);
        let team_a_name = payload.required_string("team_a_name", MAX_NAME_LEN);
        let team_b_name = payload.required_string("team_b_name", MAX_NAME_LEN);
        let team_a_players = payload.required_roster("team_a_players", MAX_NAME_LEN);
        let team_b_players = payload.required_roster("team_b_players", MAX_NAME_LEN);
        let team_a_captain = payload.required_string("team_a_captain", MAX_NAME_LEN);
        let team_b_captain = payload.required_string("team_b_captain", MAX_NAME_LEN);
        // Accepted for compatibility; new matches always start undecided.
        let _winner = payload.optional_choice::<Winner>("winner");
        let game_type = payload.required_choice::<GameType>("game_type");
        let match_date = payload.required_date("match_date");
        let draft = match (
            team_a_name,
            team_b_name,
            team_a_players,
            team_b_players,
            team_a_captain,
            team_b_captain,
            game_type,
            match_date,
        ) {
            (
                Some(team_a_name),
                Some(team_b_name),
                Some(team_a_players),
                Some(team_b_players),
                Some(team_a_captain),
                Some(team_b_captain),
                Some(game_type),
                Some(match_date),
            ) => Some(TournamentMatchDraft {
                team_a_name,
                team_b_name,
                team_a_players,
                team_b_players,
                team_a_captain,
                team_b_captain,
                game_type,
                match_date,
            }),
            _ => None,
        };
        let draft = payload.finish(draft)?;
        check_captains(&draft)?;
        Ok(draft)
    }

    fn validate_patch(body: &Value) -> Result<WinnerUpdate, ValidationError> {
        let mut payload = Payload::new(body, &[]);
        let winner = payload.required_choice::<Winner>("winner");
        payload.finish(winner.map(|winner| WinnerUpdate { winner }))
    }

    fn statistics(rows: &[TournamentMatch], _now: Timestamp) -> TournamentStats {
        tournament_stats(rows)
    }
}

/// Enforces that each captain plays for their own team.
///
/// # Errors
///
/// Returns [`ValidationError::Semantic`] keyed by every offending captain field.
pub fn check_captains(draft: &TournamentMatchDraft) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    if !draft.team_a_players.contains(&draft.team_a_captain) {
        errors.push("team_a_captain", TEAM_A_CAPTAIN_MESSAGE);
    }
    if !draft.team_b_players.contains(&draft.team_b_captain) {
        errors.push("team_b_captain", TEAM_B_CAPTAIN_MESSAGE);
    }
    if errors.is_empty() { Ok(()) } else { Err(ValidationError::Semantic(errors)) }
}

// ============================================================================
// SECTION: Partner Enquiries
// ============================================================================

/// Partner enquiries submitted through the public form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartnerEnquiries;

/// Sortable partner enquiry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnquirySort {
    /// Row id.
    Id,
    /// Contact name.
    Name,
    /// Contact email.
    Email,
    /// Company name.
    Company,
    /// Submission time.
    CreatedAt,
}

impl SortField for EnquirySort {
    const DEFAULT: Self = Self::CreatedAt;
    const ALL: &'static [Self] =
        &[Self::Id, Self::Name, Self::Email, Self::Company, Self::CreatedAt];

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Update input for records that cannot be updated. Has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immutable {}

impl Resource for PartnerEnquiries {
    type Record = PartnerEnquiry;
    type Draft = PartnerEnquiryDraft;
    type Patch = Immutable;
    type Sort = EnquirySort;
    type Stats = EnquiryStats;

    const KIND: ResourceKind = ResourceKind::PartnerEnquiry;

    fn record_id(record: &PartnerEnquiry) -> RecordId {
        record.id
    }

    fn filter_date(record: &PartnerEnquiry) -> MatchDate {
        record.created_at.date()
    }

    fn matches_search(record: &PartnerEnquiry, term: &SearchTerm) -> bool {
        [&record.name, &record.email, &record.company, &record.message]
            .into_iter()
            .any(|field| term.within(field))
    }

    fn compare(left: &PartnerEnquiry, right: &PartnerEnquiry, field: EnquirySort) -> Ordering {
        match field {
            EnquirySort::Id => left.id.cmp(&right.id),
            EnquirySort::Name => left.name.cmp(&right.name),
            EnquirySort::Email => left.email.cmp(&right.email),
            EnquirySort::Company => left.company.cmp(&right.company),
            EnquirySort::CreatedAt => left.created_at.cmp(&right.created_at),
        }
    }

    fn assemble(id: RecordId, draft: &PartnerEnquiryDraft, at: Timestamp) -> PartnerEnquiry {
        PartnerEnquiry::from_draft(id, draft, at)
    }

    fn apply_patch(_record: &mut PartnerEnquiry, patch: &Immutable, _at: Timestamp) {
        match *patch {}
    }

    fn validate_draft(body: &Value) -> Result<PartnerEnquiryDraft, ValidationError> {
        let mut payload = Payload::new(body, &[]);
        let name = payload.required_string("name", MAX_ENQUIRY_FIELD_LEN);
        let email = payload.required_email("email", MAX_ENQUIRY_FIELD_LEN);
        let company = payload.required_string("company", MAX_ENQUIRY_FIELD_LEN);
        let message = payload.required_string("message", MAX_ENQUIRY_MESSAGE_LEN);
        let draft = match (name, email, company, message) {
            (Some(name), Some(email), Some(company), Some(message)) => {
                Some(PartnerEnquiryDraft { name, email, company, message })
            }
            _ => None,
        };
        payload.finish(draft)
    }

    fn validate_patch(_body: &Value) -> Result<Immutable, ValidationError> {
        Err(ValidationError::Schema(FieldErrors::single(
            crate::core::validation::BODY_FIELD,
            "Enquiries cannot be modified.",
        )))
    }

    fn statistics(rows: &[PartnerEnquiry], now: Timestamp) -> EnquiryStats {
        enquiry_stats(rows, now)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
