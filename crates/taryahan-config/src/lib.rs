// crates/taryahan-config/src/lib.rs
// ============================================================================
// Module: Taryahan Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for taryahan.toml semantics.
// Dependencies: taryahan-core, taryahan-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `taryahan-config` defines the configuration model for the Taryahan
//! service: server bind and auth, audit logging, record store backend,
//! enquiry rate limit, streamer listing, and admin seed accounts.
//! Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
