// crates/taryahan-server/src/lib.rs
// ============================================================================
// Module: Taryahan Server Library
// Description: JSON HTTP surface for the Taryahan community service.
// Purpose: Expose the server, its collaborators, and the enquiry limiter.
// Dependencies: axum, taryahan-config, taryahan-core, tokio, tracing
// ============================================================================

//! ## Overview
//! The server mounts admin CRUD routes for pub records, tournament matches,
//! and partner enquiries, plus the public enquiry form and streamer listing.
//! Security posture: admin routes fail closed through [`AdminAuthz`]; the
//! public form is rate limited per client IP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod envelope;
mod handlers;
pub mod rate_limit;
pub mod seed;
pub mod server;
pub mod streamers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::HttpAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AdminAuthz;
pub use auth::AuthError;
pub use auth::DefaultAdminAuthz;
pub use auth::RequestContext;
pub use rate_limit::EnquiryRateLimiter;
pub use rate_limit::RateLimitDecision;
pub use rate_limit::RateLimitPolicy;
pub use seed::AdminSeedHook;
pub use seed::LoggingAdminSeedHook;
pub use server::ServerComponents;
pub use server::ServerError;
pub use server::Services;
pub use server::TaryahanServer;
pub use server::build_services;
pub use streamers::StaticStreamerSource;
pub use streamers::StreamerSource;
pub use streamers::StreamerSummary;
