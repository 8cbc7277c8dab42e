// crates/taryahan-core/src/runtime/store.rs
// ============================================================================
// Module: Taryahan In-Memory Store
// Description: Mutex-guarded record store for tests and ephemeral hosts.
// Purpose: Reference implementation of the record store contract.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Rows live in a `BTreeMap` keyed by id behind a single mutex, so every
//! operation is atomic. Ids start at one and are never reused, matching an
//! auto-increment primary key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::identifiers::RecordId;
use crate::core::query::ListQuery;
use crate::core::query::Page;
use crate::core::resource::Resource;
use crate::core::time::Timestamp;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Query Evaluation
// ============================================================================

/// Filters, sorts, and pages rows in memory.
///
/// Ties on the sort column are broken by id in the same direction.
#[must_use]
pub fn evaluate_query<'a, R: Resource>(
    rows: impl IntoIterator<Item = &'a R::Record>,
    query: &ListQuery<R::Sort>,
) -> Page<R::Record> {
    let mut selected: Vec<R::Record> = rows
        .into_iter()
        .filter(|row| query.includes_date(R::filter_date(row)))
        .filter(|row| query.search.as_ref().is_none_or(|term| R::matches_search(row, term)))
        .cloned()
        .collect();
    selected.sort_by(|left, right| {
        let ordering = R::compare(left, right, query.sort_by)
            .then_with(|| R::record_id(left).cmp(&R::record_id(right)));
        query.sort_dir.apply(ordering)
    });
    Page::from_sorted(selected, query)
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Mutable store contents.
struct MemoryState<R: Resource> {
    /// Last assigned id.
    last_id: i64,
    /// Rows keyed by id.
    rows: BTreeMap<RecordId, R::Record>,
}

/// In-memory record store.
pub struct InMemoryRecordStore<R: Resource> {
    /// Shared state.
    state: Arc<Mutex<MemoryState<R>>>,
}

impl<R: Resource> InMemoryRecordStore<R> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(MemoryState { last_id: 0, rows: BTreeMap::new() })) }
    }

    /// Locks the state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState<R>>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Store("in-memory store mutex poisoned".to_string()))
    }
}

impl<R: Resource> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Clone for InMemoryRecordStore<R> {
    fn clone(&self) -> Self {
        Self { state: Arc::clone(&self.state) }
    }
}

impl<R: Resource> RecordStore<R> for InMemoryRecordStore<R> {
    fn list(&self, query: &ListQuery<R::Sort>) -> Result<Page<R::Record>, StoreError> {
        let guard = self.lock()?;
        Ok(evaluate_query::<R>(guard.rows.values(), query))
    }

    fn get(&self, id: RecordId) -> Result<Option<R::Record>, StoreError> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn insert(&self, draft: &R::Draft, at: Timestamp) -> Result<R::Record, StoreError> {
        let mut guard = self.lock()?;
        let next = guard
            .last_id
            .checked_add(1)
            .and_then(RecordId::new)
            .ok_or_else(|| StoreError::Store("record id space exhausted".to_string()))?;
        let record = R::assemble(next, draft, at);
        guard.last_id = next.get();
        guard.rows.insert(next, record.clone());
        Ok(record)
    }

    fn update(
        &self,
        id: RecordId,
        patch: &R::Patch,
        at: Timestamp,
    ) -> Result<Option<R::Record>, StoreError> {
        let mut guard = self.lock()?;
        Ok(guard.rows.get_mut(&id).map(|record| {
            R::apply_patch(record, patch, at);
            record.clone()
        }))
    }

    fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.lock()?.rows.remove(&id).is_some())
    }

    fn all(&self) -> Result<Vec<R::Record>, StoreError> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(u64::try_from(self.lock()?.rows.len()).unwrap_or(u64::MAX))
    }
}
