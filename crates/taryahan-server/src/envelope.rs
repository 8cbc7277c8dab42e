// crates/taryahan-server/src/envelope.rs
// ============================================================================
// Module: JSON Envelopes
// Description: Response bodies and user-facing messages for every route.
// Purpose: Keep status codes and envelope shapes in one place.
// Dependencies: axum, serde, serde_json, taryahan-core
// ============================================================================

//! ## Overview
//! Every route answers with `{success, message, ...}`. Successful reads and
//! writes add `data`; validation failures add `errors`; unexpected failures
//! add `error` only when detail exposure is enabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use taryahan_core::FieldErrors;
use taryahan_core::ResourceKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message for rejected input.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Message for a rate-limited enquiry.
pub const TOO_MANY_ATTEMPTS: &str =
    "Too many submission attempts. Please try again in a few minutes.";

/// Message for a successful enquiry submission.
pub const ENQUIRY_SUBMITTED: &str =
    "Your enquiry has been submitted successfully. We will get back to you soon.";

/// Message for a failed enquiry submission.
pub const ENQUIRY_FAILED: &str =
    "An error occurred while submitting your enquiry. Please try again later.";

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Route operation, used to pick messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Paged listing.
    List,
    /// Single-row read.
    Show,
    /// Row creation.
    Create,
    /// Row update.
    Update,
    /// Row deletion.
    Delete,
    /// Aggregate statistics.
    Statistics,
}

/// Returns the success message for an operation on a resource.
#[must_use]
pub fn success_message(kind: ResourceKind, op: Operation) -> String {
    let noun = kind.noun();
    match (kind, op) {
        (_, Operation::List) => format!("{} retrieved successfully", kind.plural_noun()),
        (_, Operation::Show) => format!("{noun} retrieved successfully"),
        (ResourceKind::PartnerEnquiry, Operation::Create) => ENQUIRY_SUBMITTED.to_string(),
        (_, Operation::Create) => format!("{noun} created successfully"),
        (ResourceKind::TournamentMatch, Operation::Update) => {
            "Winner updated successfully".to_string()
        }
        (_, Operation::Update) => format!("{noun} updated successfully"),
        (_, Operation::Delete) => format!("{noun} deleted successfully"),
        (_, Operation::Statistics) => "Statistics retrieved successfully".to_string(),
    }
}

/// Returns the generic failure message for an operation on a resource.
#[must_use]
pub fn failure_message(kind: ResourceKind, op: Operation) -> String {
    let noun = kind.noun().to_lowercase();
    match (kind, op) {
        (_, Operation::List) => {
            format!("Failed to retrieve {}", kind.plural_noun().to_lowercase())
        }
        (_, Operation::Show) => format!("Failed to retrieve {noun}"),
        (ResourceKind::PartnerEnquiry, Operation::Create) => ENQUIRY_FAILED.to_string(),
        (_, Operation::Create) => format!("Failed to create {noun}"),
        (ResourceKind::TournamentMatch, Operation::Update) => "Failed to update winner".to_string(),
        (_, Operation::Update) => format!("Failed to update {noun}"),
        (ResourceKind::PartnerEnquiry, Operation::Delete) => "Error deleting enquiry".to_string(),
        (_, Operation::Delete) => format!("Failed to delete {noun}"),
        (_, Operation::Statistics) => "Failed to retrieve statistics".to_string(),
    }
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// A status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body.
    pub body: Value,
}

impl ApiResponse {
    /// Success envelope carrying `data`.
    #[must_use]
    pub fn data(status: StatusCode, data: &impl Serialize, message: &str) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status,
                body: json!({ "success": true, "data": data, "message": message }),
            },
            Err(_) => Self::internal("Failed to encode response", None),
        }
    }

    /// Success envelope without `data`.
    #[must_use]
    pub fn message(message: &str) -> Self {
        Self { status: StatusCode::OK, body: json!({ "success": true, "message": message }) }
    }

    /// 422 envelope with field errors.
    #[must_use]
    pub fn validation_failed(errors: &FieldErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: json!({ "success": false, "message": VALIDATION_FAILED, "errors": errors }),
        }
    }

    /// 404 envelope for a missing row.
    #[must_use]
    pub fn not_found(kind: ResourceKind) -> Self {
        Self::failure(StatusCode::NOT_FOUND, &format!("{} not found", kind.noun()))
    }

    /// 500 envelope; `detail` is included only when present.
    #[must_use]
    pub fn internal(message: &str, detail: Option<String>) -> Self {
        let mut body = json!({ "success": false, "message": message });
        if let (Some(detail), Some(object)) = (detail, body.as_object_mut()) {
            object.insert("error".to_string(), Value::String(detail));
        }
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, body }
    }

    /// 429 envelope for the enquiry limiter.
    #[must_use]
    pub fn too_many_attempts() -> Self {
        Self::failure(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_ATTEMPTS)
    }

    /// 401 envelope for a failed auth gate.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::failure(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    }

    /// 413 envelope for an oversized body.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::failure(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    }

    /// 400 envelope for an unreadable body.
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::failure(StatusCode::BAD_REQUEST, message)
    }

    /// Plain failure envelope.
    fn failure(status: StatusCode, message: &str) -> Self {
        Self { status, body: json!({ "success": false, "message": message }) }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use taryahan_core::ResourceKind;

    use super::ApiResponse;
    use super::Operation;
    use super::failure_message;
    use super::success_message;

    #[test]
    fn messages_follow_resource_nouns() {
        assert_eq!(
            success_message(ResourceKind::PubRecord, Operation::List),
            "Records retrieved successfully"
        );
        assert_eq!(
            success_message(ResourceKind::TournamentMatch, Operation::Update),
            "Winner updated successfully"
        );
        assert_eq!(
            success_message(ResourceKind::PartnerEnquiry, Operation::Delete),
            "Enquiry deleted successfully"
        );
        assert_eq!(
            failure_message(ResourceKind::TournamentMatch, Operation::List),
            "Failed to retrieve matches"
        );
        assert_eq!(
            failure_message(ResourceKind::PartnerEnquiry, Operation::Delete),
            "Error deleting enquiry"
        );
    }

    #[test]
    fn internal_error_detail_is_optional() {
        let hidden = ApiResponse::internal("Failed to create record", None);
        let shown = ApiResponse::internal("Failed to create record", Some("disk full".to_string()));
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(hidden.body.get("error").is_none());
        assert_eq!(shown.body["error"], "disk full");
    }

    #[test]
    fn not_found_uses_singular_noun() {
        let response = ApiResponse::not_found(ResourceKind::TournamentMatch);
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["message"], "Match not found");
        assert_eq!(response.body["success"], false);
    }
}
