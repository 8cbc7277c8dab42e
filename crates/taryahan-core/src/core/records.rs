// crates/taryahan-core/src/core/records.rs
// ============================================================================
// Module: Taryahan Records
// Description: Pub records, tournament matches, and partner enquiries.
// Purpose: Define persisted rows, validated drafts, and derived views.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each record kind comes as a persisted row (with store-assigned id and
//! timestamps) and a draft (validated caller input). Drafts only exist once
//! schema and semantic checks have passed, so the store never sees a row that
//! breaks the pub count rule or the captain membership rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::core::identifiers::RecordId;
use crate::core::time::MatchDate;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of players on each tournament team.
pub const ROSTER_SIZE: usize = 5;

// ============================================================================
// SECTION: Pub Records
// ============================================================================

/// Validated input for a Dota2 pub record.
///
/// # Invariants
/// - `win + lose == total_pubs` and `total_pubs >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubRecordDraft {
    /// Player name.
    pub name: String,
    /// Number of pubs played.
    pub total_pubs: u32,
    /// Pubs won.
    pub win: u32,
    /// Pubs lost.
    pub lose: u32,
    /// Day the pubs were played.
    pub match_date: MatchDate,
}

/// Persisted Dota2 pub record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubRecord {
    /// Row identifier.
    pub id: RecordId,
    /// Player name.
    pub name: String,
    /// Number of pubs played.
    pub total_pubs: u32,
    /// Pubs won.
    pub win: u32,
    /// Pubs lost.
    pub lose: u32,
    /// Day the pubs were played.
    pub match_date: MatchDate,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

impl PubRecord {
    /// Builds a row from a draft.
    #[must_use]
    pub fn from_draft(id: RecordId, draft: &PubRecordDraft, at: Timestamp) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            total_pubs: draft.total_pubs,
            win: draft.win,
            lose: draft.lose,
            match_date: draft.match_date,
            created_at: at,
            updated_at: at,
        }
    }

    /// Win percentage for this row; zero when no pubs were played.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.total_pubs == 0 {
            return 0.0;
        }
        f64::from(self.win) / f64::from(self.total_pubs) * 100.0
    }
}

// ============================================================================
// SECTION: Tournament Matches
// ============================================================================

/// Tournament winner side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    /// Team A won.
    TeamA,
    /// Team B won.
    TeamB,
}

impl Winner {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TeamA => "team_a",
            Self::TeamB => "team_b",
        }
    }

    /// Parses a stored label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "team_a" => Some(Self::TeamA),
            "team_b" => Some(Self::TeamB),
            _ => None,
        }
    }
}

/// Game played in a tournament match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Dota 2.
    Dota2,
    /// Counter-Strike 2.
    Cs2,
}

impl GameType {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dota2 => "dota2",
            Self::Cs2 => "cs2",
        }
    }

    /// Parses a stored label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dota2" => Some(Self::Dota2),
            "cs2" => Some(Self::Cs2),
            _ => None,
        }
    }
}

/// Ordered list of exactly [`ROSTER_SIZE`] player names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Roster([String; ROSTER_SIZE]);

impl Roster {
    /// Returns true when a player with exactly this name is on the roster.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|player| player == name)
    }

    /// Iterates players in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Roster {
    type Error = String;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let len = value.len();
        <[String; ROSTER_SIZE]>::try_from(value)
            .map(Self)
            .map_err(|_| format!("roster must have exactly {ROSTER_SIZE} players, got {len}"))
    }
}

impl From<Roster> for Vec<String> {
    fn from(value: Roster) -> Self {
        value.0.into()
    }
}

/// Validated input for a tournament match.
///
/// # Invariants
/// - Each captain is a member of their own team's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentMatchDraft {
    /// Team A display name.
    pub team_a_name: String,
    /// Team B display name.
    pub team_b_name: String,
    /// Team A players.
    pub team_a_players: Roster,
    /// Team B players.
    pub team_b_players: Roster,
    /// Team A captain.
    pub team_a_captain: String,
    /// Team B captain.
    pub team_b_captain: String,
    /// Game played.
    pub game_type: GameType,
    /// Day of the match.
    pub match_date: MatchDate,
}

/// Validated winner assignment for an existing match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerUpdate {
    /// Winning side.
    pub winner: Winner,
}

/// Persisted tournament match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentMatch {
    /// Row identifier.
    pub id: RecordId,
    /// Team A display name.
    pub team_a_name: String,
    /// Team B display name.
    pub team_b_name: String,
    /// Team A players.
    pub team_a_players: Roster,
    /// Team B players.
    pub team_b_players: Roster,
    /// Team A captain.
    pub team_a_captain: String,
    /// Team B captain.
    pub team_b_captain: String,
    /// Winning side, unset until decided.
    pub winner: Option<Winner>,
    /// Game played.
    pub game_type: GameType,
    /// Day of the match.
    pub match_date: MatchDate,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

impl TournamentMatch {
    /// Builds a row from a draft. New matches never carry a winner.
    #[must_use]
    pub fn from_draft(id: RecordId, draft: &TournamentMatchDraft, at: Timestamp) -> Self {
        Self {
            id,
            team_a_name: draft.team_a_name.clone(),
            team_b_name: draft.team_b_name.clone(),
            team_a_players: draft.team_a_players.clone(),
            team_b_players: draft.team_b_players.clone(),
            team_a_captain: draft.team_a_captain.clone(),
            team_b_captain: draft.team_b_captain.clone(),
            winner: None,
            game_type: draft.game_type,
            match_date: draft.match_date,
            created_at: at,
            updated_at: at,
        }
    }

    /// Name of the winning team, when decided.
    #[must_use]
    pub fn winning_team(&self) -> Option<&str> {
        self.winner.map(|winner| match winner {
            Winner::TeamA => self.team_a_name.as_str(),
            Winner::TeamB => self.team_b_name.as_str(),
        })
    }

    /// Name of the losing team, when decided.
    #[must_use]
    pub fn losing_team(&self) -> Option<&str> {
        self.winner.map(|winner| match winner {
            Winner::TeamA => self.team_b_name.as_str(),
            Winner::TeamB => self.team_a_name.as_str(),
        })
    }
}

// ============================================================================
// SECTION: Partner Enquiries
// ============================================================================

/// Validated input for a partner enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerEnquiryDraft {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Company name.
    pub company: String,
    /// Enquiry body.
    pub message: String,
}

/// Persisted partner enquiry. Immutable once stored.
///
/// Serializes with an additional derived `masked_email` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerEnquiry {
    /// Row identifier.
    pub id: RecordId,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Company name.
    pub company: String,
    /// Enquiry body.
    pub message: String,
    /// Submission time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

impl PartnerEnquiry {
    /// Builds a row from a draft.
    #[must_use]
    pub fn from_draft(id: RecordId, draft: &PartnerEnquiryDraft, at: Timestamp) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            company: draft.company.clone(),
            message: draft.message.clone(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Display form of the contact email.
    #[must_use]
    pub fn masked_email(&self) -> String {
        mask_email(&self.email)
    }
}

impl Serialize for PartnerEnquiry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PartnerEnquiry", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field("company", &self.company)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("masked_email", &self.masked_email())?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("updated_at", &self.updated_at)?;
        state.end()
    }
}

/// Masks the local part of an email, keeping its first two characters.
///
/// Values without exactly one `@` are returned unchanged.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return email.to_string();
    };
    let visible: String = local.chars().take(2).collect();
    let hidden = local.chars().count().saturating_sub(2);
    format!("{visible}{}@{domain}", "*".repeat(hidden))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
