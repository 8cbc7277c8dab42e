// crates/taryahan-server/src/auth.rs
// ============================================================================
// Module: Admin Auth Gate
// Description: Authentication enforcement for admin routes.
// Purpose: Provide strict, fail-closed auth policies for admin requests.
// Dependencies: taryahan-config, thiserror
// ============================================================================

//! ## Overview
//! Admin routes pass through an [`AdminAuthz`] gate before any handler runs.
//! The default policy supports loopback-only access and bearer tokens. All
//! decisions are fail-closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::IpAddr;

use taryahan_config::ServerAuthConfig;
use taryahan_config::ServerAuthMode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest accepted `Authorization` header.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for auth decisions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value.
    pub auth_header: Option<String>,
}

impl RequestContext {
    /// Builds an HTTP request context.
    #[must_use]
    pub const fn http(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self { peer_ip, auth_header }
    }

    /// Returns true when the peer IP is loopback.
    #[must_use]
    pub fn peer_is_loopback(&self) -> bool {
        self.peer_ip.is_some_and(|ip| ip.is_loopback())
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Loopback access.
    Local,
    /// Bearer token authentication.
    BearerToken,
}

impl AuthMethod {
    /// Returns the audit label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::BearerToken => "bearer_token",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Authn interface for admin routes.
pub trait AdminAuthz: Send + Sync {
    /// Authenticates an admin request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the caller is not an admin.
    fn authorize(&self, ctx: &RequestContext) -> Result<AuthMethod, AuthError>;
}

// ============================================================================
// SECTION: Default Policy
// ============================================================================

/// Default gate derived from server config.
pub struct DefaultAdminAuthz {
    /// Configured mode.
    mode: ServerAuthMode,
    /// Accepted bearer tokens.
    bearer_tokens: BTreeSet<String>,
}

impl DefaultAdminAuthz {
    /// Builds the gate from server auth configuration.
    #[must_use]
    pub fn from_config(config: &ServerAuthConfig) -> Self {
        Self { mode: config.mode, bearer_tokens: config.bearer_tokens.iter().cloned().collect() }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }
}

impl AdminAuthz for DefaultAdminAuthz {
    fn authorize(&self, ctx: &RequestContext) -> Result<AuthMethod, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if ctx.peer_is_loopback() {
                    Ok(AuthMethod::Local)
                } else {
                    Err(AuthError::Unauthenticated(
                        "local-only mode requires loopback access".to_string(),
                    ))
                }
            }
            ServerAuthMode::BearerToken => {
                let token = parse_bearer_token(ctx.auth_header.as_deref())?;
                if self.bearer_tokens.contains(&token) {
                    Ok(AuthMethod::BearerToken)
                } else {
                    Err(AuthError::Unauthenticated("invalid bearer token".to_string()))
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the token from a `Bearer` authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::net::IpAddr;
    use std::net::Ipv4Addr;

    use taryahan_config::ServerAuthConfig;
    use taryahan_config::ServerAuthMode;

    use super::AdminAuthz;
    use super::AuthMethod;
    use super::DefaultAdminAuthz;
    use super::RequestContext;

    fn bearer_gate() -> DefaultAdminAuthz {
        DefaultAdminAuthz::from_config(&ServerAuthConfig {
            mode: ServerAuthMode::BearerToken,
            bearer_tokens: vec!["tok-1".to_string()],
        })
    }

    #[test]
    fn local_only_admits_loopback_and_rejects_remote() {
        let gate = DefaultAdminAuthz::from_config(&ServerAuthConfig::default());
        let local = RequestContext::http(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), None);
        let remote = RequestContext::http(Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))), None);
        assert_eq!(gate.authorize(&local), Ok(AuthMethod::Local));
        assert!(gate.authorize(&remote).is_err());
        assert!(gate.authorize(&RequestContext::http(None, None)).is_err());
    }

    #[test]
    fn bearer_mode_checks_scheme_and_token() {
        let gate = bearer_gate();
        let ip = Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
        let ok = RequestContext::http(ip, Some("bearer tok-1".to_string()));
        assert_eq!(gate.authorize(&ok), Ok(AuthMethod::BearerToken));
        for header in [None, Some("Basic tok-1"), Some("Bearer "), Some("Bearer tok-2")] {
            let ctx = RequestContext::http(ip, header.map(str::to_string));
            assert!(gate.authorize(&ctx).is_err());
        }
    }
}
