// crates/taryahan-cli/src/lib.rs
// ============================================================================
// Module: Taryahan CLI Library
// Description: Shared helpers for the `taryahan` binary.
// Purpose: Keep command logic testable outside the entry point.
// Dependencies: crate::stats
// ============================================================================

//! ## Overview
//! Command implementations that do not need the process entry point live
//! here so integration tests can drive them directly.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod stats;
