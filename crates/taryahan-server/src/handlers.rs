// crates/taryahan-server/src/handlers.rs
// ============================================================================
// Module: Route Handlers
// Description: Generic resource handlers plus the public enquiry and
//              streamer routes.
// Purpose: Translate HTTP requests into service calls and envelopes.
// Dependencies: axum, serde_json, taryahan-core, tokio, tracing
// ============================================================================

//! ## Overview
//! Admin handlers are written once and instantiated per resource. Each one
//! passes the auth gate, runs the synchronous service on a blocking-capable
//! context, maps the outcome to an envelope, and records an audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::MatchedPath;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use serde_json::Value;
use serde_json::json;
use taryahan_core::PartnerEnquiries;
use taryahan_core::Resource;
use taryahan_core::ResourceKind;
use taryahan_core::ResourceService;
use taryahan_core::ServiceError;
use taryahan_core::Timestamp;

use crate::audit::AuditOutcome;
use crate::audit::HttpAuditEvent;
use crate::audit::HttpAuditEventParams;
use crate::auth::RequestContext;
use crate::envelope::ApiResponse;
use crate::envelope::Operation;
use crate::envelope::failure_message;
use crate::envelope::success_message;
use crate::server::AppState;
use crate::server::ServiceFor;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Shared state extractor.
type AppStateRef = State<Arc<AppState>>;

/// Raw JSON body, or the reason it could not be buffered.
type RawBody = Result<Bytes, BytesRejection>;

/// Request facts carried into the audit event.
struct Exchange {
    /// Client address.
    peer: SocketAddr,
    /// HTTP method.
    method: Method,
    /// Matched route template.
    route: String,
    /// Targeted resource.
    resource: ResourceKind,
    /// Raw path id when present.
    record_id: Option<String>,
}

impl Exchange {
    /// Captures request facts.
    fn new(
        peer: SocketAddr,
        method: Method,
        path: &MatchedPath,
        resource: ResourceKind,
        record_id: Option<String>,
    ) -> Self {
        Self { peer, method, route: path.as_str().to_string(), resource, record_id }
    }
}

// ============================================================================
// SECTION: Admin Handlers
// ============================================================================

/// Lists one filtered page of rows.
pub(crate) async fn list<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, None);
    let response = match authorize(&state, peer, &headers) {
        Err(denied) => denied,
        Ok(()) => {
            let service = <AppState as ServiceFor<R>>::service(&state);
            match run_blocking(|| service.list(&params)) {
                Ok(page) => ApiResponse::data(
                    StatusCode::OK,
                    &page,
                    &success_message(R::KIND, Operation::List),
                ),
                Err(err) => service_failure(&state, R::KIND, Operation::List, err),
            }
        }
    };
    complete(&state, exchange, response)
}

/// Returns one row.
pub(crate) async fn show<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, Some(raw_id.clone()));
    let response = match authorize(&state, peer, &headers) {
        Err(denied) => denied,
        Ok(()) => {
            let service = <AppState as ServiceFor<R>>::service(&state);
            let outcome = ResourceService::<R>::resolve_id(&raw_id)
                .and_then(|id| run_blocking(|| service.show(id)));
            match outcome {
                Ok(record) => ApiResponse::data(
                    StatusCode::OK,
                    &record,
                    &success_message(R::KIND, Operation::Show),
                ),
                Err(err) => service_failure(&state, R::KIND, Operation::Show, err),
            }
        }
    };
    complete(&state, exchange, response)
}

/// Validates and stores a new row.
pub(crate) async fn create<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
    body: RawBody,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, None);
    let response = match authorize(&state, peer, &headers).and_then(|()| read_body(&state, body)) {
        Err(denied) => denied,
        Ok(value) => create_row::<R>(&state, &value),
    };
    complete(&state, exchange, response)
}

/// Validates and applies an update to an existing row.
pub(crate) async fn update<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    body: RawBody,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, Some(raw_id.clone()));
    let response = match authorize(&state, peer, &headers).and_then(|()| read_body(&state, body)) {
        Err(denied) => denied,
        Ok(value) => {
            let service = <AppState as ServiceFor<R>>::service(&state);
            let outcome = ResourceService::<R>::resolve_id(&raw_id)
                .and_then(|id| run_blocking(|| service.update(id, &value, Timestamp::now())));
            match outcome {
                Ok(record) => ApiResponse::data(
                    StatusCode::OK,
                    &record,
                    &success_message(R::KIND, Operation::Update),
                ),
                Err(err) => service_failure(&state, R::KIND, Operation::Update, err),
            }
        }
    };
    complete(&state, exchange, response)
}

/// Deletes a row.
pub(crate) async fn destroy<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, Some(raw_id.clone()));
    let response = match authorize(&state, peer, &headers) {
        Err(denied) => denied,
        Ok(()) => {
            let service = <AppState as ServiceFor<R>>::service(&state);
            let outcome = ResourceService::<R>::resolve_id(&raw_id)
                .and_then(|id| run_blocking(|| service.delete(id)));
            match outcome {
                Ok(()) => ApiResponse::message(&success_message(R::KIND, Operation::Delete)),
                Err(err) => service_failure(&state, R::KIND, Operation::Delete, err),
            }
        }
    };
    complete(&state, exchange, response)
}

/// Aggregates statistics over every row.
pub(crate) async fn statistics<R>(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    headers: HeaderMap,
) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let exchange = Exchange::new(peer, method, &path, R::KIND, None);
    let response = match authorize(&state, peer, &headers) {
        Err(denied) => denied,
        Ok(()) => {
            let service = <AppState as ServiceFor<R>>::service(&state);
            match run_blocking(|| service.statistics(Timestamp::now())) {
                Ok(stats) => ApiResponse::data(
                    StatusCode::OK,
                    &stats,
                    &success_message(R::KIND, Operation::Statistics),
                ),
                Err(err) => service_failure(&state, R::KIND, Operation::Statistics, err),
            }
        }
    };
    complete(&state, exchange, response)
}

// ============================================================================
// SECTION: Public Handlers
// ============================================================================

/// Accepts a partner enquiry from the public form.
pub(crate) async fn submit_enquiry(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    path: MatchedPath,
    body: RawBody,
) -> ApiResponse {
    let exchange = Exchange::new(peer, method, &path, ResourceKind::PartnerEnquiry, None);
    let decision = state.limiter.check(peer.ip());
    let response = if decision.is_allowed() {
        match read_body(&state, body) {
            Err(rejected) => rejected,
            Ok(value) => create_row::<PartnerEnquiries>(&state, &value),
        }
    } else {
        tracing::warn!(peer = %peer.ip(), "enquiry rate limit exceeded");
        ApiResponse::too_many_attempts()
    };
    complete(&state, exchange, response)
}

/// Returns the public streamer directory without live status.
pub(crate) async fn streamer_summaries(State(state): AppStateRef) -> Json<Value> {
    let streamers = state.streamers.summaries();
    let count = streamers.len();
    Json(json!({ "streamers": streamers, "count": count }))
}

/// Returns the public streamer directory with details.
pub(crate) async fn streamers(State(state): AppStateRef) -> Json<Value> {
    let streamers = state.streamers.streamers();
    let count = streamers.len();
    Json(json!({ "streamers": streamers, "count": count }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates a row and maps the outcome.
fn create_row<R>(state: &AppState, value: &Value) -> ApiResponse
where
    R: Resource,
    AppState: ServiceFor<R>,
{
    let service = <AppState as ServiceFor<R>>::service(state);
    match run_blocking(|| service.create(value, Timestamp::now())) {
        Ok(record) => ApiResponse::data(
            StatusCode::CREATED,
            &record,
            &success_message(R::KIND, Operation::Create),
        ),
        Err(err) => service_failure(state, R::KIND, Operation::Create, err),
    }
}

/// Runs a synchronous service call, shifting to a blocking context when the
/// runtime allows it.
fn run_blocking<T>(call: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}

/// Runs the admin gate for a request.
fn authorize(state: &AppState, peer: SocketAddr, headers: &HeaderMap) -> Result<(), ApiResponse> {
    let auth_header =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    let context = RequestContext::http(Some(peer.ip()), auth_header);
    match state.authz.authorize(&context) {
        Ok(method) => {
            tracing::debug!(peer = %peer.ip(), method = method.label(), "admin request authorized");
            Ok(())
        }
        Err(err) => {
            tracing::warn!(peer = %peer.ip(), error = %err, "admin request rejected");
            Err(ApiResponse::unauthenticated())
        }
    }
}

/// Decodes a request body. Malformed JSON becomes `null` so the validator
/// reports it on the `body` field.
fn read_body(state: &AppState, body: RawBody) -> Result<Value, ApiResponse> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiResponse::payload_too_large()
        } else {
            ApiResponse::bad_request("Failed to read request body")
        }
    })?;
    if bytes.len() > state.max_body_bytes {
        return Err(ApiResponse::payload_too_large());
    }
    Ok(serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Maps a service failure to its envelope.
fn service_failure(
    state: &AppState,
    kind: ResourceKind,
    op: Operation,
    err: ServiceError,
) -> ApiResponse {
    match err {
        ServiceError::Validation(invalid) => ApiResponse::validation_failed(invalid.errors()),
        ServiceError::NotFound(missing) => ApiResponse::not_found(missing),
        ServiceError::Store(err) => {
            tracing::error!(resource = kind.as_str(), error = %err, "store operation failed");
            let detail = state.expose_error_details.then(|| err.to_string());
            ApiResponse::internal(&failure_message(kind, op), detail)
        }
    }
}

/// Records the audit event for a finished request.
fn complete(state: &AppState, exchange: Exchange, response: ApiResponse) -> ApiResponse {
    let status = response.status.as_u16();
    tracing::info!(
        method = %exchange.method,
        route = %exchange.route,
        status,
        "request completed"
    );
    state.audit.record(&HttpAuditEvent::new(HttpAuditEventParams {
        peer_ip: Some(exchange.peer.ip().to_string()),
        method: exchange.method.to_string(),
        route: exchange.route,
        resource: Some(exchange.resource.as_str()),
        record_id: exchange.record_id,
        status,
        outcome: outcome_for(response.status),
    }));
    response
}

/// Classifies a response status for audit.
fn outcome_for(status: StatusCode) -> AuditOutcome {
    match status {
        status if status.is_success() => AuditOutcome::Ok,
        StatusCode::UNAUTHORIZED => AuditOutcome::Unauthenticated,
        StatusCode::NOT_FOUND => AuditOutcome::NotFound,
        StatusCode::TOO_MANY_REQUESTS => AuditOutcome::RateLimited,
        status if status.is_client_error() => AuditOutcome::Invalid,
        _ => AuditOutcome::Error,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::outcome_for;
    use super::run_blocking;
    use crate::audit::AuditOutcome;

    #[test]
    fn outcomes_follow_status_classes() {
        assert_eq!(outcome_for(StatusCode::CREATED), AuditOutcome::Ok);
        assert_eq!(outcome_for(StatusCode::UNPROCESSABLE_ENTITY), AuditOutcome::Invalid);
        assert_eq!(outcome_for(StatusCode::PAYLOAD_TOO_LARGE), AuditOutcome::Invalid);
        assert_eq!(outcome_for(StatusCode::TOO_MANY_REQUESTS), AuditOutcome::RateLimited);
        assert_eq!(outcome_for(StatusCode::INTERNAL_SERVER_ERROR), AuditOutcome::Error);
    }

    #[test]
    fn run_blocking_works_outside_a_runtime() {
        assert_eq!(run_blocking(|| 7), 7);
    }
}
