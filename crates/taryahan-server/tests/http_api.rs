// crates/taryahan-server/tests/http_api.rs
// ============================================================================
// Module: HTTP API Tests
// Description: End-to-end tests over a live loopback listener.
// Purpose: Validate envelopes, status codes, auth, rate limiting, and audit.
// ============================================================================

//! ## Overview
//! Each test starts its own server with an in-memory store and talks to it
//! over HTTP/1:
//! - Public enquiry submission, masking, and the per-IP limiter
//! - Admin CRUD envelopes for pub records and tournament matches
//! - Auth gate behavior in bearer-token mode
//! - Body size limits and audit events

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use hyper::Method;
use hyper::StatusCode;
use serde_json::Value;
use serde_json::json;
use taryahan_config::ServerAuthConfig;
use taryahan_config::ServerAuthMode;
use taryahan_config::StreamerConfig;
use taryahan_config::TaryahanConfig;
use taryahan_server::AuditOutcome;

use crate::common::TestServer;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const RECORDS: &str = "/api/dota-pub-records";
const MATCHES: &str = "/api/taryahan/matches";
const ENQUIRY_FORM: &str = "/partner-enquiries";

fn enquiry_body() -> Value {
    json!({ "name": "A", "email": "a@b.com", "company": "C", "message": "hi" })
}

fn pub_body(name: &str, total: u32, win: u32) -> Value {
    json!({
        "name": name,
        "total_pubs": total,
        "win": win,
        "lose": total - win,
        "match_date": "2026-01-12"
    })
}

fn match_body() -> Value {
    json!({
        "team_a_name": "Alpha",
        "team_b_name": "Bravo",
        "team_a_players": ["ana", "budi", "cici", "dodo", "eka"],
        "team_b_players": ["fajar", "gita", "hadi", "indra", "joko"],
        "team_a_captain": "ana",
        "team_b_captain": "gita",
        "game_type": "dota2",
        "match_date": "2026-01-12"
    })
}

// ============================================================================
// SECTION: Public Enquiries
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn enquiry_submission_returns_masked_email() {
    let server = TestServer::start().await;
    let response = server.post(ENQUIRY_FORM, &enquiry_body()).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["masked_email"], "a@b.com");
    assert_eq!(
        response.body["message"],
        "Your enquiry has been submitted successfully. We will get back to you soon."
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn sixth_enquiry_from_one_ip_is_rate_limited() {
    let server = TestServer::start().await;
    for _ in 0 .. 5 {
        let response = server.post(ENQUIRY_FORM, &enquiry_body()).await;
        assert_eq!(response.status, StatusCode::CREATED);
    }
    let blocked = server.post(ENQUIRY_FORM, &enquiry_body()).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(blocked.body["success"], false);
    assert_eq!(
        blocked.body["message"],
        "Too many submission attempts. Please try again in a few minutes."
    );
    let listed = server.get("/api/partner-enquiries").await;
    assert_eq!(listed.body["data"]["pagination"]["total"], 5);
    let last = server.audit.events().into_iter().rev().find(|event| event.method == "POST");
    assert_eq!(last.map(|event| event.outcome), Some(AuditOutcome::RateLimited));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_enquiries_still_count_toward_the_limit() {
    let server = TestServer::start().await;
    for _ in 0 .. 5 {
        let response = server.post(ENQUIRY_FORM, &json!({ "name": "A" })).await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.body["errors"]["email"].is_array());
    }
    let blocked = server.post(ENQUIRY_FORM, &enquiry_body()).await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(flavor = "multi_thread")]
async fn enquiry_statistics_and_delete() {
    let server = TestServer::start().await;
    let created = server.post(ENQUIRY_FORM, &enquiry_body()).await;
    let id = created.body["data"]["id"].as_i64().unwrap();

    let stats = server.get("/api/partner-enquiries/statistics").await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["data"]["total"], 1);
    assert_eq!(stats.body["data"]["today"], 1);

    let deleted = server.delete(&format!("/api/partner-enquiries/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Enquiry deleted successfully");
    let again = server.delete(&format!("/api/partner-enquiries/{id}")).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["message"], "Enquiry not found");
}

// ============================================================================
// SECTION: Pub Records
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn pub_record_count_mismatch_is_rejected_without_write() {
    let server = TestServer::start().await;
    let body = json!({
        "name": "Ana",
        "total_pubs": 10,
        "win": 3,
        "lose": 3,
        "match_date": "2026-01-12"
    });
    let response = server.post(RECORDS, &body).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["message"], "Validation failed");
    assert_eq!(
        response.body["errors"]["total_pubs"][0],
        "Win count + Lose count must equal Total Pubs"
    );
    let listed = server.get(RECORDS).await;
    assert_eq!(listed.body["data"]["pagination"]["total"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_reported_on_body_field() {
    let server = TestServer::start().await;
    let response =
        server.send(Method::POST, RECORDS, Some(b"{not json".to_vec()), None).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["errors"]["body"].is_array());
}

#[tokio::test(flavor = "multi_thread")]
async fn pagination_reports_totals() {
    let server = TestServer::start().await;
    for name in ["Ana", "Budi", "Cici", "Dodo", "Eka"] {
        let response = server.post(RECORDS, &pub_body(name, 10, 5)).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["message"], "Record created successfully");
    }
    let page = server.get(&format!("{RECORDS}?per_page=2")).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["message"], "Records retrieved successfully");
    assert_eq!(page.body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(page.body["data"]["pagination"]["total"], 5);
    assert_eq!(page.body["data"]["pagination"]["last_page"], 3);

    let last = server.get(&format!("{RECORDS}?per_page=2&page=3")).await;
    assert_eq!(last.body["data"]["items"].as_array().map(Vec::len), Some(1));

    let bad = server.get(&format!("{RECORDS}?sort_by=password")).await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(bad.body["errors"]["sort_by"].is_array());
}

#[tokio::test(flavor = "multi_thread")]
async fn pub_record_update_show_and_statistics() {
    let server = TestServer::start().await;
    let first = server.post(RECORDS, &pub_body("Ana", 10, 5)).await;
    server.post(RECORDS, &pub_body("Budi", 20, 15)).await;
    let id = first.body["data"]["id"].as_i64().unwrap();

    let updated = server.put(&format!("{RECORDS}/{id}"), &pub_body("Ana", 12, 6)).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Record updated successfully");
    assert_eq!(updated.body["data"]["total_pubs"], 12);

    let shown = server.get(&format!("{RECORDS}/{id}")).await;
    assert_eq!(shown.body["message"], "Record retrieved successfully");
    assert_eq!(shown.body["data"]["win"], 6);

    server.put(&format!("{RECORDS}/{id}"), &pub_body("Ana", 10, 5)).await;
    let stats = server.get(&format!("{RECORDS}/statistics")).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["message"], "Statistics retrieved successfully");
    assert_eq!(stats.body["data"]["overall_win_rate"], 66.67);
    assert_eq!(stats.body["data"]["total_records"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_ids_are_not_found() {
    let server = TestServer::start().await;
    for path in [format!("{RECORDS}/abc"), format!("{RECORDS}/0"), format!("{RECORDS}/99")] {
        let response = server.get(&path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Record not found");
    }
    let deleted = server.delete(&format!("{RECORDS}/99")).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
    let event = server.audit.events().into_iter().last().unwrap();
    assert_eq!(event.record_id.as_deref(), Some("99"));
    assert_eq!(event.outcome, AuditOutcome::NotFound);
    assert_eq!(event.route, "/api/dota-pub-records/{id}");
}

// ============================================================================
// SECTION: Tournament Matches
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn winner_is_set_only_through_update() {
    let server = TestServer::start().await;
    let mut body = match_body();
    body["winner"] = json!("team_b");
    let created = server.post(MATCHES, &body).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Match created successfully");
    assert!(created.body["data"]["winner"].is_null());
    let id = created.body["data"]["id"].as_i64().unwrap();

    let rejected = server.put(&format!("{MATCHES}/{id}"), &json!({ "winner": "team_c" })).await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    let unchanged = server.get(&format!("{MATCHES}/{id}")).await;
    assert!(unchanged.body["data"]["winner"].is_null());

    let updated = server.put(&format!("{MATCHES}/{id}"), &json!({ "winner": "team_a" })).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Winner updated successfully");
    assert_eq!(updated.body["data"]["winner"], "team_a");

    let stats = server.get(&format!("{MATCHES}/statistics")).await;
    assert_eq!(stats.body["data"]["team_a_wins"], 1);
    assert_eq!(stats.body["data"]["total_matches"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn captain_outside_roster_is_rejected() {
    let server = TestServer::start().await;
    let mut body = match_body();
    body["team_a_captain"] = json!("zed");
    let response = server.post(MATCHES, &body).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"]["team_a_captain"][0], "Captain must be a player in Team A");
    let deleted = server.delete(&format!("{MATCHES}/1")).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
    assert_eq!(deleted.body["message"], "Match not found");
}

// ============================================================================
// SECTION: Auth, Limits, and Listing
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn bearer_mode_requires_token_on_admin_routes_only() {
    let mut config = TaryahanConfig::default();
    config.server.auth = ServerAuthConfig {
        mode: ServerAuthMode::BearerToken,
        bearer_tokens: vec!["secret-token".to_string()],
    };
    let server = TestServer::start_with(config).await;

    let denied = server.get(RECORDS).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.body["success"], false);
    let wrong = server.send(Method::GET, RECORDS, None, Some("other")).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    let allowed = server.send(Method::GET, RECORDS, None, Some("secret-token")).await;
    assert_eq!(allowed.status, StatusCode::OK);

    let public = server.post(ENQUIRY_FORM, &enquiry_body()).await;
    assert_eq!(public.status, StatusCode::CREATED);
    let outcomes: Vec<AuditOutcome> =
        server.audit.events().into_iter().map(|event| event.outcome).collect();
    assert_eq!(outcomes[0], AuditOutcome::Unauthenticated);
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_is_rejected() {
    let mut config = TaryahanConfig::default();
    config.server.max_body_bytes = 1024;
    let server = TestServer::start_with(config).await;
    let mut body = enquiry_body();
    body["message"] = json!("x".repeat(4096));
    let response = server.post(ENQUIRY_FORM, &body).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["success"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn streamer_listing_is_public() {
    let mut config = TaryahanConfig::default();
    config.streamers = vec![StreamerConfig {
        name: "Nara".to_string(),
        platform: "twitch".to_string(),
        channel_url: "https://twitch.tv/nara".to_string(),
        live: true,
    }];
    let server = TestServer::start_with(config).await;
    let response = server.get("/api/streamers/detailed").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["streamers"][0]["name"], "Nara");
    assert_eq!(response.body["streamers"][0]["live"], true);

    let plain = server.get("/api/streamers").await;
    assert_eq!(plain.status, StatusCode::OK);
    assert_eq!(plain.body["count"], 1);
    assert_eq!(plain.body["streamers"][0]["channel_url"], "https://twitch.tv/nara");
    assert!(plain.body["streamers"][0].get("live").is_none());
}
