// crates/taryahan-server/src/audit.rs
// ============================================================================
// Module: HTTP Audit Logging
// Description: Structured audit events for write and admin requests.
// Purpose: Emit JSON-line audit records without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines the audit event payload and sinks for request
//! logging. Events never carry request bodies; they record who did what to
//! which row and how it ended.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Request succeeded.
    Ok,
    /// Input was rejected.
    Invalid,
    /// Target row was missing.
    NotFound,
    /// Caller failed the auth gate.
    Unauthenticated,
    /// Caller was rate limited.
    RateLimited,
    /// Request failed internally.
    Error,
}

/// HTTP audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Matched route template.
    pub route: String,
    /// Resource label when the route targets one.
    pub resource: Option<&'static str>,
    /// Row id when the route targets one.
    pub record_id: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Outcome label.
    pub outcome: AuditOutcome,
}

/// Inputs required to construct an audit event.
pub struct HttpAuditEventParams {
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Matched route template.
    pub route: String,
    /// Resource label when the route targets one.
    pub resource: Option<&'static str>,
    /// Row id when the route targets one.
    pub record_id: Option<String>,
    /// Response status code.
    pub status: u16,
    /// Outcome label.
    pub outcome: AuditOutcome,
}

impl HttpAuditEvent {
    /// Creates a new audit event stamped with the current time.
    #[must_use]
    pub fn new(params: HttpAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "http_request",
            timestamp_ms,
            peer_ip: params.peer_ip,
            method: params.method,
            route: params.route,
            resource: params.resource,
            record_id: params.record_id,
            status: params.status,
            outcome: params.outcome,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &HttpAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &HttpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &HttpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &HttpAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
