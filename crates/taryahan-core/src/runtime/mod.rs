// crates/taryahan-core/src/runtime/mod.rs
// ============================================================================
// Module: Taryahan Runtime
// Description: Resource service and in-memory store.
// Purpose: Execute the record lifecycle over a pluggable store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires validation, querying, and statistics to a
//! [`crate::interfaces::RecordStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use service::ResourceService;
pub use service::ServiceError;
pub use store::InMemoryRecordStore;
pub use store::evaluate_query;
