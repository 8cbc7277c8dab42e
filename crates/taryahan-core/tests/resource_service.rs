// crates/taryahan-core/tests/resource_service.rs
// ============================================================================
// Module: Resource Service Tests
// Description: Lifecycle, filtering, and statistics over the in-memory store.
// ============================================================================
//! ## Overview
//! Drives [`ResourceService`] for all three record kinds through the same
//! entry points the HTTP layer uses.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;
use taryahan_core::CaptainCount;
use taryahan_core::InMemoryRecordStore;
use taryahan_core::PartnerEnquiries;
use taryahan_core::PubRecords;
use taryahan_core::RecordStore;
use taryahan_core::Resource;
use taryahan_core::ResourceKind;
use taryahan_core::ResourceService;
use taryahan_core::ServiceError;
use taryahan_core::SharedRecordStore;
use taryahan_core::Timestamp;
use taryahan_core::TournamentMatches;
use taryahan_core::ValidationError;
use taryahan_core::Winner;

fn service<R: Resource>() -> ResourceService<R> {
    ResourceService::new(SharedRecordStore::from_store(InMemoryRecordStore::<R>::new()))
}

fn at(raw: &str) -> Timestamp {
    Timestamp::parse(raw).expect("timestamp")
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

fn pub_body(name: &str, total: u32, win: u32, date: &str) -> Value {
    json!({ "name": name, "total_pubs": total, "win": win, "lose": total - win, "match_date": date })
}

fn match_body(a_captain: &str, b_captain: &str, date: &str) -> Value {
    json!({
        "team_a_name": "Alpha",
        "team_b_name": "Bravo",
        "team_a_players": ["ana", "budi", "cici", "dodo", "eka"],
        "team_b_players": ["fajar", "gita", "hadi", "indra", "joko"],
        "team_a_captain": a_captain,
        "team_b_captain": b_captain,
        "game_type": "dota2",
        "match_date": date
    })
}

#[test]
fn pub_statistics_match_underlying_rows() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    svc.create(&pub_body("Ana", 10, 5, "2026-01-10"), now).unwrap();
    svc.create(&pub_body("Budi", 20, 15, "2026-01-11"), now).unwrap();
    svc.create(&pub_body("Ana", 1, 1, "2026-01-11"), now).unwrap();

    let stats = svc.statistics(now).unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.total_matches, 31);
    assert_eq!(stats.total_wins, 21);
    assert_eq!(stats.total_losses, 10);
    assert_eq!(stats.unique_players, 2);
}

#[test]
fn overall_win_rate_rounds_to_two_decimals() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    svc.create(&pub_body("Ana", 10, 5, "2026-01-10"), now).unwrap();
    svc.create(&pub_body("Budi", 20, 15, "2026-01-11"), now).unwrap();
    let stats = svc.statistics(now).unwrap();
    assert!((stats.overall_win_rate - 66.67).abs() < f64::EPSILON);
}

#[test]
fn empty_statistics_report_zero_rates() {
    let svc = service::<PubRecords>();
    let stats = svc.statistics(at("2026-01-12T10:00:00Z")).unwrap();
    assert_eq!(stats.total_records, 0);
    assert!(stats.overall_win_rate.abs() < f64::EPSILON);

    let matches = service::<TournamentMatches>().statistics(at("2026-01-12T10:00:00Z")).unwrap();
    assert!(matches.team_a_win_rate.abs() < f64::EPSILON);
    assert!(matches.most_common_captains.is_empty());
}

#[test]
fn rejected_pub_update_leaves_row_unchanged() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    let row = svc.create(&pub_body("Ana", 10, 5, "2026-01-10"), now).unwrap();

    let bad = json!({ "name": "Ana", "total_pubs": 10, "win": 9, "lose": 9, "match_date": "2026-01-10" });
    let err = svc.update(row.id, &bad, at("2026-01-13T10:00:00Z")).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::Semantic(_))));
    assert_eq!(svc.show(row.id).unwrap(), row);

    let updated = svc
        .update(row.id, &pub_body("Ana B", 12, 6, "2026-01-10"), at("2026-01-13T10:00:00Z"))
        .unwrap();
    assert_eq!(updated.name, "Ana B");
    assert_eq!(updated.created_at, row.created_at);
    assert_eq!(updated.updated_at, at("2026-01-13T10:00:00Z"));
}

#[test]
fn invalid_body_is_reported_before_missing_row() {
    let svc = service::<PubRecords>();
    let id = ResourceService::<PubRecords>::resolve_id("99").unwrap();
    let err = svc.update(id, &json!({}), at("2026-01-12T10:00:00Z")).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    let err = svc
        .update(id, &pub_body("Ana", 1, 1, "2026-01-10"), at("2026-01-12T10:00:00Z"))
        .unwrap_err();
    assert_eq!(err, ServiceError::NotFound(ResourceKind::PubRecord));
}

#[test]
fn deleting_missing_row_is_not_found_and_changes_nothing() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    svc.create(&pub_body("Ana", 10, 5, "2026-01-10"), now).unwrap();
    let before = svc.store().count().unwrap();
    let id = ResourceService::<PubRecords>::resolve_id("42").unwrap();
    assert_eq!(svc.delete(id).unwrap_err(), ServiceError::NotFound(ResourceKind::PubRecord));
    assert_eq!(svc.store().count().unwrap(), before);
    assert!(ResourceService::<PubRecords>::resolve_id("abc").is_err());
}

#[test]
fn pagination_splits_five_rows() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    for day in 1..=5 {
        svc.create(&pub_body("Ana", 2, 1, &format!("2026-01-0{day}")), now).unwrap();
    }
    let page = svc.list(&params(&[("per_page", "2")])).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.last_page, 3);
    assert_eq!(page.items[0].match_date.to_string(), "2026-01-05");

    let last = svc.list(&params(&[("per_page", "2"), ("page", "3")])).unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].match_date.to_string(), "2026-01-01");
}

#[test]
fn list_filters_by_search_and_date_range() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    svc.create(&pub_body("Anastasia", 2, 1, "2026-01-01"), now).unwrap();
    svc.create(&pub_body("Budi", 2, 1, "2026-01-05"), now).unwrap();
    svc.create(&pub_body("ANA", 2, 1, "2026-01-09"), now).unwrap();

    let found = svc.list(&params(&[("search", " ana ")])).unwrap();
    assert_eq!(found.pagination.total, 2);

    let ranged = svc
        .list(&params(&[("date_from", "2026-01-02"), ("date_to", "2026-01-09"), ("sort_dir", "asc")]))
        .unwrap();
    let names: Vec<&str> = ranged.items.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["Budi", "ANA"]);

    let err = svc.list(&params(&[("sort_by", "password")])).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::Schema(_))));
}

#[test]
fn equal_sort_keys_are_ordered_by_id() {
    let svc = service::<PubRecords>();
    let now = at("2026-01-12T10:00:00Z");
    for name in ["first", "second", "third"] {
        svc.create(&pub_body(name, 2, 1, "2026-01-01"), now).unwrap();
    }
    let desc = svc.list(&params(&[])).unwrap();
    let names: Vec<&str> = desc.items.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["third", "second", "first"]);
}

#[test]
fn matches_start_undecided_and_winner_is_set_separately() {
    let svc = service::<TournamentMatches>();
    let now = at("2026-01-12T10:00:00Z");
    let mut body = match_body("ana", "gita", "2026-01-12");
    body["winner"] = json!("team_a");
    let created = svc.create(&body, now).unwrap();
    assert_eq!(created.winner, None);

    let err = svc.update(created.id, &json!({ "winner": "team_c" }), now).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(svc.show(created.id).unwrap().winner, None);

    let decided = svc.update(created.id, &json!({ "winner": "team_b" }), now).unwrap();
    assert_eq!(decided.winner, Some(Winner::TeamB));
    assert_eq!(decided.winning_team(), Some("Bravo"));
}

#[test]
fn captain_outside_roster_creates_nothing() {
    let svc = service::<TournamentMatches>();
    let err = svc.create(&match_body("zed", "gita", "2026-01-12"), at("2026-01-12T10:00:00Z")).unwrap_err();
    let errors = match err {
        ServiceError::Validation(ValidationError::Semantic(errors)) => errors,
        other => panic!("expected semantic failure, got {other:?}"),
    };
    assert_eq!(errors.get("team_a_captain"), Some(&["Captain must be a player in Team A".to_string()][..]));
    assert_eq!(svc.store().count().unwrap(), 0);
}

#[test]
fn match_search_uses_exact_player_membership() {
    let svc = service::<TournamentMatches>();
    let now = at("2026-01-12T10:00:00Z");
    svc.create(&match_body("ana", "gita", "2026-01-12"), now).unwrap();
    assert_eq!(svc.list(&params(&[("search", "hadi")])).unwrap().pagination.total, 1);
    assert_eq!(svc.list(&params(&[("search", "had")])).unwrap().pagination.total, 0);
    assert_eq!(svc.list(&params(&[("search", "bRaV")])).unwrap().pagination.total, 1);
}

#[test]
fn tournament_statistics_rank_captains() {
    let svc = service::<TournamentMatches>();
    let now = at("2026-01-12T10:00:00Z");
    let first = svc.create(&match_body("ana", "gita", "2026-01-10"), now).unwrap();
    let second = svc.create(&match_body("budi", "gita", "2026-01-11"), now).unwrap();
    svc.create(&match_body("ana", "joko", "2026-01-12"), now).unwrap();
    svc.update(first.id, &json!({ "winner": "team_a" }), now).unwrap();
    svc.update(second.id, &json!({ "winner": "team_b" }), now).unwrap();

    let stats = svc.statistics(now).unwrap();
    assert_eq!(stats.total_matches, 3);
    assert_eq!(stats.team_a_wins, 1);
    assert_eq!(stats.team_b_wins, 1);
    assert!((stats.team_a_win_rate - 33.33).abs() < f64::EPSILON);
    assert_eq!(stats.unique_players, 10);
    assert_eq!(
        stats.most_common_captains,
        vec![
            CaptainCount { name: "ana".to_string(), count: 2 },
            CaptainCount { name: "gita".to_string(), count: 2 },
            CaptainCount { name: "budi".to_string(), count: 1 },
            CaptainCount { name: "joko".to_string(), count: 1 },
        ]
    );
}

#[test]
fn enquiry_statistics_use_monday_weeks() {
    let svc = service::<PartnerEnquiries>();
    let body = json!({ "name": "A", "email": "a@b.com", "company": "C", "message": "hi" });
    // Saturday 2026-10-17.
    for stamp in [
        "2026-10-17T08:00:00Z",
        "2026-10-12T08:00:00Z",
        "2026-10-11T23:59:59Z",
        "2026-10-01T00:00:00Z",
        "2025-10-17T08:00:00Z",
    ] {
        svc.create(&body, at(stamp)).unwrap();
    }
    let stats = svc.statistics(at("2026-10-17T12:00:00Z")).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.today, 1);
    assert_eq!(stats.this_week, 2);
    assert_eq!(stats.this_month, 4);
}

#[test]
fn enquiries_cannot_be_updated() {
    let svc = service::<PartnerEnquiries>();
    let body = json!({ "name": "A", "email": "a@b.com", "company": "C", "message": "hi" });
    let row = svc.create(&body, at("2026-10-17T08:00:00Z")).unwrap();
    assert_eq!(row.masked_email(), "a@b.com");
    let err = svc.update(row.id, &body, at("2026-10-17T09:00:00Z")).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn captain_ranking_keeps_first_seen_order_across_many_captains() {
    let svc = service::<TournamentMatches>();
    let now = at("2026-01-12T10:00:00Z");
    for (a, b) in [
        ("eka", "joko"),
        ("dodo", "joko"),
        ("cici", "indra"),
        ("budi", "hadi"),
        ("ana", "gita"),
        ("eka", "fajar"),
    ] {
        svc.create(&match_body(a, b, "2026-01-10"), now).unwrap();
    }
    let names: Vec<(String, u64)> = svc
        .statistics(now)
        .unwrap()
        .most_common_captains
        .into_iter()
        .map(|entry| (entry.name, entry.count))
        .collect();
    assert_eq!(
        names,
        vec![
            ("eka".to_string(), 2),
            ("joko".to_string(), 2),
            ("dodo".to_string(), 1),
            ("cici".to_string(), 1),
            ("indra".to_string(), 1),
        ]
    );
}

#[test]
fn winner_can_be_reassigned() {
    let svc = service::<TournamentMatches>();
    let row = svc.create(&match_body("ana", "gita", "2026-01-10"), at("2026-01-12T10:00:00Z")).unwrap();
    assert_eq!(row.winner, None);

    svc.update(row.id, &json!({ "winner": "team_a" }), at("2026-01-12T11:00:00Z")).unwrap();
    let second = svc.update(row.id, &json!({ "winner": "team_b" }), at("2026-01-12T12:00:00Z")).unwrap();
    assert_eq!(second.winner, Some(Winner::TeamB));
    assert_eq!(second.team_a_captain, "ana");
    assert_eq!(svc.show(row.id).unwrap().winner, Some(Winner::TeamB));

    let stats = svc.statistics(at("2026-01-12T12:00:00Z")).unwrap();
    assert_eq!(stats.team_a_wins, 0);
    assert_eq!(stats.team_b_wins, 1);
}
