// crates/taryahan-core/src/interfaces/mod.rs
// ============================================================================
// Module: Taryahan Interfaces
// Description: Backend-agnostic persistence contract for record kinds.
// Purpose: Define the storage seam used by the resource service.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! A [`RecordStore`] persists the rows of one [`Resource`]. Implementations
//! must run every write atomically (no partial rows on failure), assign
//! positive ids, and answer list queries with the same filter, sort, and page
//! semantics as the in-memory reference store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::identifiers::RecordId;
use crate::core::query::ListQuery;
use crate::core::query::Page;
use crate::core::resource::Resource;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("record store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("record store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("record store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data or request is invalid.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("record store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Persistence for the rows of one resource.
pub trait RecordStore<R: Resource>: Send + Sync {
    /// Returns one filtered, sorted page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list(&self, query: &ListQuery<R::Sort>) -> Result<Page<R::Record>, StoreError>;

    /// Loads a row by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(&self, id: RecordId) -> Result<Option<R::Record>, StoreError>;

    /// Inserts a validated draft and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; nothing is stored.
    fn insert(&self, draft: &R::Draft, at: Timestamp) -> Result<R::Record, StoreError>;

    /// Applies a validated patch. Returns `None` when the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; the row is unchanged.
    fn update(
        &self,
        id: RecordId,
        patch: &R::Patch,
        at: Timestamp,
    ) -> Result<Option<R::Record>, StoreError>;

    /// Deletes a row. Returns false when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Returns every row in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn all(&self) -> Result<Vec<R::Record>, StoreError>;

    /// Returns the number of rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Reports store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Cloneable handle to a boxed record store.
pub struct SharedRecordStore<R: Resource> {
    /// Backing store.
    inner: Arc<dyn RecordStore<R>>,
}

impl<R: Resource> SharedRecordStore<R> {
    /// Wraps a concrete store.
    #[must_use]
    pub fn from_store(store: impl RecordStore<R> + 'static) -> Self {
        Self { inner: Arc::new(store) }
    }

    /// Wraps an already shared store.
    #[must_use]
    pub fn from_arc(inner: Arc<dyn RecordStore<R>>) -> Self {
        Self { inner }
    }
}

impl<R: Resource> Clone for SharedRecordStore<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<R: Resource> RecordStore<R> for SharedRecordStore<R> {
    fn list(&self, query: &ListQuery<R::Sort>) -> Result<Page<R::Record>, StoreError> {
        self.inner.list(query)
    }

    fn get(&self, id: RecordId) -> Result<Option<R::Record>, StoreError> {
        self.inner.get(id)
    }

    fn insert(&self, draft: &R::Draft, at: Timestamp) -> Result<R::Record, StoreError> {
        self.inner.insert(draft, at)
    }

    fn update(
        &self,
        id: RecordId,
        patch: &R::Patch,
        at: Timestamp,
    ) -> Result<Option<R::Record>, StoreError> {
        self.inner.update(id, patch, at)
    }

    fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }

    fn all(&self) -> Result<Vec<R::Record>, StoreError> {
        self.inner.all()
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}
