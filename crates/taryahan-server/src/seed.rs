// crates/taryahan-server/src/seed.rs
// ============================================================================
// Module: Admin Seeding
// Description: Startup hook for provisioning admin accounts.
// Purpose: Hand configured admins to an account system owned elsewhere.
// Dependencies: taryahan-config, taryahan-core, tracing
// ============================================================================

//! ## Overview
//! No credentials ship with the service. Configured `[[admins]]` entries are
//! passed once at startup to an [`AdminSeedHook`]; the default hook only
//! logs what it would provision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use taryahan_config::AdminConfig;
use taryahan_core::mask_email;

// ============================================================================
// SECTION: Hook
// ============================================================================

/// Receiver for configured admin accounts.
pub trait AdminSeedHook: Send + Sync {
    /// Provisions the given admins.
    fn seed(&self, admins: &[AdminConfig]);
}

/// Hook that logs the accounts it would seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAdminSeedHook;

impl AdminSeedHook for LoggingAdminSeedHook {
    fn seed(&self, admins: &[AdminConfig]) {
        if admins.is_empty() {
            tracing::info!("no admin accounts configured");
            return;
        }
        for admin in admins {
            tracing::info!(
                name = %admin.name,
                email = %mask_email(&admin.email),
                "admin account registered for seeding"
            );
        }
    }
}
