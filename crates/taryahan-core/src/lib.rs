// crates/taryahan-core/src/lib.rs
// ============================================================================
// Module: Taryahan Core Library
// Description: Public API surface for the Taryahan core.
// Purpose: Expose record types, validation, query filters, and services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Taryahan core models the three record kinds tracked by the community
//! service (Dota2 pub records, Taryahan tournament matches, and partner
//! enquiries) and implements the shared filtering, validation, and statistics
//! contract once through the [`Resource`] capability. Storage backends plug in
//! through [`RecordStore`]; transports drive [`ResourceService`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::RecordStore;
pub use interfaces::SharedRecordStore;
pub use interfaces::StoreError;
pub use runtime::InMemoryRecordStore;
pub use runtime::ResourceService;
pub use runtime::ServiceError;
