// crates/taryahan-core/src/runtime/service.rs
// ============================================================================
// Module: Taryahan Resource Service
// Description: Generic list/show/create/update/delete/statistics lifecycle.
// Purpose: Validate untrusted input and drive a record store for one resource.
// Dependencies: crate::{core, interfaces}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ResourceService`] is the one implementation of the record lifecycle
//! shared by pub records, tournament matches, and partner enquiries. Inputs
//! are raw query parameters and JSON bodies; validation always completes
//! before the store is touched, so rejected input never mutates a row.
//! Callers supply the current [`Timestamp`] for writes and statistics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::RecordId;
use crate::core::identifiers::ResourceKind;
use crate::core::query::ListQuery;
use crate::core::query::Page;
use crate::core::resource::Resource;
use crate::core::time::Timestamp;
use crate::core::validation::ValidationError;
use crate::interfaces::RecordStore;
use crate::interfaces::SharedRecordStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resource service failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Input failed schema or semantic validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The targeted row does not exist.
    #[error("{0} not found")]
    NotFound(ResourceKind),
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Record lifecycle for one resource.
pub struct ResourceService<R: Resource> {
    /// Backing store.
    store: SharedRecordStore<R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<R: Resource> ResourceService<R> {
    /// Creates a service over a store.
    #[must_use]
    pub const fn new(store: SharedRecordStore<R>) -> Self {
        Self { store }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &SharedRecordStore<R> {
        &self.store
    }

    /// Resolves an untrusted path id. Unparseable ids name no row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when the text is not a positive id.
    pub fn resolve_id(raw: &str) -> Result<RecordId, ServiceError> {
        RecordId::parse(raw).ok_or(ServiceError::NotFound(R::KIND))
    }

    /// Lists one page of rows.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for bad parameters and
    /// [`ServiceError::Store`] when the query fails.
    pub fn list(&self, params: &BTreeMap<String, String>) -> Result<Page<R::Record>, ServiceError> {
        let query = ListQuery::<R::Sort>::from_params(params)?;
        Ok(self.store.list(&query)?)
    }

    /// Loads one row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when the row is absent.
    pub fn show(&self, id: RecordId) -> Result<R::Record, ServiceError> {
        self.store.get(id)?.ok_or(ServiceError::NotFound(R::KIND))
    }

    /// Validates a body and stores a new row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] without writing when the body is
    /// invalid, or [`ServiceError::Store`] when the write fails.
    pub fn create(&self, body: &Value, at: Timestamp) -> Result<R::Record, ServiceError> {
        let draft = R::validate_draft(body)?;
        Ok(self.store.insert(&draft, at)?)
    }

    /// Validates a body and applies it to an existing row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] before any lookup when the body is
    /// invalid, then [`ServiceError::NotFound`] when the row is absent.
    pub fn update(&self, id: RecordId, body: &Value, at: Timestamp) -> Result<R::Record, ServiceError> {
        let patch = R::validate_patch(body)?;
        self.store.update(id, &patch, at)?.ok_or(ServiceError::NotFound(R::KIND))
    }

    /// Deletes a row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] when the row is absent.
    pub fn delete(&self, id: RecordId) -> Result<(), ServiceError> {
        if self.store.delete(id)? { Ok(()) } else { Err(ServiceError::NotFound(R::KIND)) }
    }

    /// Aggregates every row, fresh.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when loading fails.
    pub fn statistics(&self, now: Timestamp) -> Result<R::Stats, ServiceError> {
        let rows = self.store.all()?;
        Ok(R::statistics(&rows, now))
    }
}
