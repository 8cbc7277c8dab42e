// crates/taryahan-store-sqlite/src/tables.rs
// ============================================================================
// Module: SQLite Table Mappings
// Description: Row encoding and decoding for each Taryahan table.
// Purpose: Bind each resource to its table, columns, and filter expressions.
// Dependencies: taryahan-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! [`SqlResource`] extends a core resource with everything the generic
//! `SQLite` store needs: table and column names, the expression bounded by
//! date filters, searchable columns, and row codecs. Stored rows are treated
//! as untrusted; values that no longer decode surface as corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::types::Type;
use taryahan_core::GameType;
use taryahan_core::Immutable;
use taryahan_core::MatchDate;
use taryahan_core::PartnerEnquiries;
use taryahan_core::PartnerEnquiry;
use taryahan_core::PartnerEnquiryDraft;
use taryahan_core::PubRecord;
use taryahan_core::PubRecordDraft;
use taryahan_core::PubRecords;
use taryahan_core::RecordId;
use taryahan_core::Resource;
use taryahan_core::Roster;
use taryahan_core::Timestamp;
use taryahan_core::TournamentMatch;
use taryahan_core::TournamentMatchDraft;
use taryahan_core::TournamentMatches;
use taryahan_core::Winner;
use taryahan_core::WinnerUpdate;

use crate::store::SqliteStoreError;
use crate::store::map_db_error;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Table binding for a resource.
pub trait SqlResource: Resource {
    /// Table name.
    const TABLE: &'static str;
    /// Select list, in [`SqlResource::decode`] order.
    const COLUMNS: &'static str;
    /// `YYYY-MM-DD` expression bounded by date filters.
    const DATE_EXPR: &'static str;
    /// Columns matched by case-insensitive substring search.
    const SEARCH_COLUMNS: &'static [&'static str];
    /// JSON array columns matched by exact element search.
    const PLAYER_COLUMNS: &'static [&'static str];

    /// Decodes one row selected with [`SqlResource::COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns a conversion error when a stored value is malformed.
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self::Record>;

    /// Inserts a draft and returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the insert fails.
    fn insert(tx: &Transaction<'_>, draft: &Self::Draft, at: Timestamp)
    -> Result<i64, SqliteStoreError>;

    /// Applies a patch. Returns false when no row has the id.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the update fails.
    fn update(
        tx: &Transaction<'_>,
        id: i64,
        patch: &Self::Patch,
        at: Timestamp,
    ) -> Result<bool, SqliteStoreError>;
}

// ============================================================================
// SECTION: Pub Records
// ============================================================================

impl SqlResource for PubRecords {
    const TABLE: &'static str = "dota_pub_records";
    const COLUMNS: &'static str =
        "id, name, total_pubs, win, lose, match_date, created_at, updated_at";
    const DATE_EXPR: &'static str = "match_date";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];
    const PLAYER_COLUMNS: &'static [&'static str] = &[];

    fn decode(row: &Row<'_>) -> rusqlite::Result<PubRecord> {
        Ok(PubRecord {
            id: record_id(row, 0)?,
            name: row.get(1)?,
            total_pubs: row.get(2)?,
            win: row.get(3)?,
            lose: row.get(4)?,
            match_date: match_date(row, 5)?,
            created_at: timestamp(row, 6)?,
            updated_at: timestamp(row, 7)?,
        })
    }

    fn insert(
        tx: &Transaction<'_>,
        draft: &PubRecordDraft,
        at: Timestamp,
    ) -> Result<i64, SqliteStoreError> {
        tx.execute(
            "INSERT INTO dota_pub_records
                (name, total_pubs, win, lose, match_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                draft.name,
                draft.total_pubs,
                draft.win,
                draft.lose,
                draft.match_date.to_string(),
                at.to_string()
            ],
        )
        .map_err(|err| map_db_error(&err))?;
        Ok(tx.last_insert_rowid())
    }

    fn update(
        tx: &Transaction<'_>,
        id: i64,
        patch: &PubRecordDraft,
        at: Timestamp,
    ) -> Result<bool, SqliteStoreError> {
        let changed = tx
            .execute(
                "UPDATE dota_pub_records
                 SET name = ?1, total_pubs = ?2, win = ?3, lose = ?4, match_date = ?5,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    patch.name,
                    patch.total_pubs,
                    patch.win,
                    patch.lose,
                    patch.match_date.to_string(),
                    at.to_string(),
                    id
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(changed > 0)
    }
}

// ============================================================================
// SECTION: Tournament Matches
// ============================================================================

impl SqlResource for TournamentMatches {
    const TABLE: &'static str = "taryahan_matches";
    const COLUMNS: &'static str = "id, team_a_name, team_b_name, team_a_players, team_b_players, \
                                   team_a_captain, team_b_captain, winner, game_type, match_date, \
                                   created_at, updated_at";
    const DATE_EXPR: &'static str = "match_date";
    const SEARCH_COLUMNS: &'static [&'static str] =
        &["team_a_name", "team_b_name", "team_a_captain", "team_b_captain"];
    const PLAYER_COLUMNS: &'static [&'static str] = &["team_a_players", "team_b_players"];

    fn decode(row: &Row<'_>) -> rusqlite::Result<TournamentMatch> {
        let winner: Option<String> = row.get(7)?;
        let winner = winner
            .map(|label| {
                Winner::parse(&label).ok_or_else(|| conversion_error(7, format!("bad winner {label}")))
            })
            .transpose()?;
        let game_type: String = row.get(8)?;
        let game_type = GameType::parse(&game_type)
            .ok_or_else(|| conversion_error(8, format!("bad game type {game_type}")))?;
        Ok(TournamentMatch {
            id: record_id(row, 0)?,
            team_a_name: row.get(1)?,
            team_b_name: row.get(2)?,
            team_a_players: roster(row, 3)?,
            team_b_players: roster(row, 4)?,
            team_a_captain: row.get(5)?,
            team_b_captain: row.get(6)?,
            winner,
            game_type,
            match_date: match_date(row, 9)?,
            created_at: timestamp(row, 10)?,
            updated_at: timestamp(row, 11)?,
        })
    }

    fn insert(
        tx: &Transaction<'_>,
        draft: &TournamentMatchDraft,
        at: Timestamp,
    ) -> Result<i64, SqliteStoreError> {
        tx.execute(
            "INSERT INTO taryahan_matches
                (team_a_name, team_b_name, team_a_players, team_b_players, team_a_captain,
                 team_b_captain, winner, game_type, match_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8, ?9, ?9)",
            params![
                draft.team_a_name,
                draft.team_b_name,
                encode_roster(&draft.team_a_players)?,
                encode_roster(&draft.team_b_players)?,
                draft.team_a_captain,
                draft.team_b_captain,
                draft.game_type.as_str(),
                draft.match_date.to_string(),
                at.to_string()
            ],
        )
        .map_err(|err| map_db_error(&err))?;
        Ok(tx.last_insert_rowid())
    }

    fn update(
        tx: &Transaction<'_>,
        id: i64,
        patch: &WinnerUpdate,
        at: Timestamp,
    ) -> Result<bool, SqliteStoreError> {
        let changed = tx
            .execute(
                "UPDATE taryahan_matches SET winner = ?1, updated_at = ?2 WHERE id = ?3",
                params![patch.winner.as_str(), at.to_string(), id],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(changed > 0)
    }
}

// ============================================================================
// SECTION: Partner Enquiries
// ============================================================================

impl SqlResource for PartnerEnquiries {
    const TABLE: &'static str = "partner_enquiries";
    const COLUMNS: &'static str = "id, name, email, company, message, created_at, updated_at";
    const DATE_EXPR: &'static str = "substr(created_at, 1, 10)";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "email", "company", "message"];
    const PLAYER_COLUMNS: &'static [&'static str] = &[];

    fn decode(row: &Row<'_>) -> rusqlite::Result<PartnerEnquiry> {
        Ok(PartnerEnquiry {
            id: record_id(row, 0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            company: row.get(3)?,
            message: row.get(4)?,
            created_at: timestamp(row, 5)?,
            updated_at: timestamp(row, 6)?,
        })
    }

    fn insert(
        tx: &Transaction<'_>,
        draft: &PartnerEnquiryDraft,
        at: Timestamp,
    ) -> Result<i64, SqliteStoreError> {
        tx.execute(
            "INSERT INTO partner_enquiries
                (name, email, company, message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![draft.name, draft.email, draft.company, draft.message, at.to_string()],
        )
        .map_err(|err| map_db_error(&err))?;
        Ok(tx.last_insert_rowid())
    }

    fn update(
        _tx: &Transaction<'_>,
        _id: i64,
        patch: &Immutable,
        _at: Timestamp,
    ) -> Result<bool, SqliteStoreError> {
        match *patch {}
    }
}

// ============================================================================
// SECTION: Codecs
// ============================================================================

/// Builds a conversion error for a malformed stored value.
fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

/// Decodes a positive row id.
fn record_id(row: &Row<'_>, column: usize) -> rusqlite::Result<RecordId> {
    let raw: i64 = row.get(column)?;
    RecordId::new(raw).ok_or_else(|| conversion_error(column, format!("bad id {raw}")))
}

/// Decodes a `YYYY-MM-DD` column.
fn match_date(row: &Row<'_>, column: usize) -> rusqlite::Result<MatchDate> {
    let raw: String = row.get(column)?;
    MatchDate::parse(&raw).ok_or_else(|| conversion_error(column, format!("bad date {raw}")))
}

/// Decodes an RFC 3339 column.
fn timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<Timestamp> {
    let raw: String = row.get(column)?;
    Timestamp::parse(&raw).ok_or_else(|| conversion_error(column, format!("bad timestamp {raw}")))
}

/// Decodes a JSON roster column.
fn roster(row: &Row<'_>, column: usize) -> rusqlite::Result<Roster> {
    let raw: String = row.get(column)?;
    serde_json::from_str::<Roster>(&raw)
        .map_err(|err| conversion_error(column, format!("bad roster: {err}")))
}

/// Encodes a roster as a JSON array.
fn encode_roster(roster: &Roster) -> Result<String, SqliteStoreError> {
    serde_json::to_string(roster).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}
