// crates/taryahan-core/src/core/stats.rs
// ============================================================================
// Module: Taryahan Statistics
// Description: On-demand aggregates over full record sets.
// Purpose: Compute counts, sums, rates, and captain rankings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Statistics are recomputed from the complete row set on every call; nothing
//! is cached. Rates are percentages rounded to two decimals and are zero when
//! the denominator is zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::records::PartnerEnquiry;
use crate::core::records::PubRecord;
use crate::core::records::TournamentMatch;
use crate::core::records::Winner;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of captains reported in the ranking.
pub const TOP_CAPTAINS: usize = 5;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Aggregates over all pub records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubRecordStats {
    /// Number of rows.
    pub total_records: u64,
    /// Sum of `total_pubs`.
    pub total_matches: u64,
    /// Sum of `win`.
    pub total_wins: u64,
    /// Sum of `lose`.
    pub total_losses: u64,
    /// `total_wins / total_matches * 100`, rounded to two decimals.
    pub overall_win_rate: f64,
    /// Distinct player names.
    pub unique_players: u64,
}

/// Captain name with the number of matches captained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptainCount {
    /// Captain name.
    pub name: String,
    /// Matches captained.
    pub count: u64,
}

/// Aggregates over all tournament matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentStats {
    /// Number of matches.
    pub total_matches: u64,
    /// Matches won by team A.
    pub team_a_wins: u64,
    /// Matches won by team B.
    pub team_b_wins: u64,
    /// Team A win percentage over all matches.
    pub team_a_win_rate: f64,
    /// Team B win percentage over all matches.
    pub team_b_win_rate: f64,
    /// Distinct player names across both rosters.
    pub unique_players: u64,
    /// Most frequent captains, count descending, ties in first-seen order.
    pub most_common_captains: Vec<CaptainCount>,
}

/// Aggregates over all partner enquiries, in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryStats {
    /// Number of enquiries.
    pub total: u64,
    /// Enquiries created today.
    pub today: u64,
    /// Enquiries created this Monday-based week.
    pub this_week: u64,
    /// Enquiries created this calendar month.
    pub this_month: u64,
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Computes pub record aggregates.
#[must_use]
pub fn pub_record_stats(rows: &[PubRecord]) -> PubRecordStats {
    let total_matches: u64 = rows.iter().map(|row| u64::from(row.total_pubs)).sum();
    let total_wins: u64 = rows.iter().map(|row| u64::from(row.win)).sum();
    let total_losses: u64 = rows.iter().map(|row| u64::from(row.lose)).sum();
    let names: BTreeSet<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    PubRecordStats {
        total_records: count(rows.len()),
        total_matches,
        total_wins,
        total_losses,
        overall_win_rate: percentage(total_wins, total_matches),
        unique_players: count(names.len()),
    }
}

/// Computes tournament aggregates. Rows are expected in id order.
#[must_use]
pub fn tournament_stats(rows: &[TournamentMatch]) -> TournamentStats {
    let total = count(rows.len());
    let wins = |side: Winner| count(rows.iter().filter(|row| row.winner == Some(side)).count());
    let team_a_wins = wins(Winner::TeamA);
    let team_b_wins = wins(Winner::TeamB);
    let players: BTreeSet<&str> =
        rows.iter().flat_map(|row| row.team_a_players.iter().chain(row.team_b_players.iter())).collect();

    let mut captains: Vec<CaptainCount> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let names = rows.iter().flat_map(|row| [row.team_a_captain.as_str(), row.team_b_captain.as_str()]);
    for name in names {
        if let Some(&slot) = slots.get(name) {
            captains[slot].count += 1;
        } else {
            slots.insert(name, captains.len());
            captains.push(CaptainCount { name: name.to_string(), count: 1 });
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    captains.sort_by(|a, b| b.count.cmp(&a.count));
    captains.truncate(TOP_CAPTAINS);

    TournamentStats {
        total_matches: total,
        team_a_wins,
        team_b_wins,
        team_a_win_rate: percentage(team_a_wins, total),
        team_b_win_rate: percentage(team_b_wins, total),
        unique_players: count(players.len()),
        most_common_captains: captains,
    }
}

/// Computes enquiry aggregates relative to `now`.
#[must_use]
pub fn enquiry_stats(rows: &[PartnerEnquiry], now: Timestamp) -> EnquiryStats {
    let today = now.date();
    let mut stats =
        EnquiryStats { total: count(rows.len()), today: 0, this_week: 0, this_month: 0 };
    for row in rows {
        let created = row.created_at.date();
        stats.today += u64::from(created == today);
        stats.this_week += u64::from(created.same_week(today));
        stats.this_month += u64::from(created.same_month(today));
    }
    stats
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a length into a wire count.
fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Percentage rounded to two decimals; zero when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Counts stay far below 2^52.")]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Rounds half away from zero to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// SECTION: Tests
// ============================================================================
