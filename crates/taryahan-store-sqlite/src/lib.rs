// crates/taryahan-store-sqlite/src/lib.rs
// ============================================================================
// Module: Taryahan SQLite Store
// Description: SQLite-backed record stores for every Taryahan table.
// Purpose: Provide durable persistence behind the core RecordStore seam.
// Dependencies: taryahan-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Durable storage for pub records, tournament matches, and partner
//! enquiries. Open a [`SqliteDatabase`] once and take one
//! [`SqliteRecordStore`] per resource from it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;
pub mod tables;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteDatabase;
pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use tables::SqlResource;
