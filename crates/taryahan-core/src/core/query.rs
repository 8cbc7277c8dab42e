// crates/taryahan-core/src/core/query.rs
// ============================================================================
// Module: Taryahan List Queries
// Description: Search, date-range, sort, and pagination parameters.
// Purpose: Parse untrusted list parameters into a closed, typed query.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! List endpoints accept `search`, `date_from`, `date_to`, `sort_by`,
//! `sort_dir`, `per_page`, and `page`. Parsing is strict: sort columns come from
//! a per-resource allow-list ([`SortField`]), directions and dates must parse,
//! and page sizes are bounded. Failures are field-keyed schema errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;

use crate::core::time::MatchDate;
use crate::core::validation::FieldErrors;
use crate::core::validation::ValidationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size used when `per_page` is absent.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

// ============================================================================
// SECTION: Sorting
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses `asc` or `desc`, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Orients an ascending comparison.
    #[must_use]
    pub const fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Closed set of sortable columns for one resource.
pub trait SortField: Copy + Eq + Debug + Send + Sync + 'static {
    /// Column used when `sort_by` is absent.
    const DEFAULT: Self;

    /// Every sortable column.
    const ALL: &'static [Self];

    /// Column name as exposed to callers and stored in SQL.
    fn column(self) -> &'static str;

    /// Looks up a column by exact name.
    #[must_use]
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.column() == value)
    }
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// Non-empty, trimmed search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// Trimmed caller text.
    raw: String,
    /// Lowercased form for substring matching.
    folded: String,
}

impl SearchTerm {
    /// Builds a term; blank input yields `None`.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self { raw: raw.to_string(), folded: raw.to_lowercase() })
    }

    /// Returns the trimmed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased text used for case-insensitive matching.
    #[must_use]
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Case-insensitive substring match.
    #[must_use]
    pub fn within(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.folded)
    }

    /// Exact, case-sensitive equality.
    #[must_use]
    pub fn equals(&self, candidate: &str) -> bool {
        candidate == self.raw
    }
}

// ============================================================================
// SECTION: List Query
// ============================================================================

/// Parsed list parameters for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery<S> {
    /// Optional search term.
    pub search: Option<SearchTerm>,
    /// Inclusive lower date bound.
    pub date_from: Option<MatchDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<MatchDate>,
    /// Sort column.
    pub sort_by: S,
    /// Sort direction.
    pub sort_dir: SortDirection,
    /// Page size.
    pub per_page: u32,
    /// One-based page number.
    pub page: u32,
}

impl<S: SortField> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            search: None,
            date_from: None,
            date_to: None,
            sort_by: S::DEFAULT,
            sort_dir: SortDirection::Desc,
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

impl<S: SortField> ListQuery<S> {
    /// Parses raw query parameters. Unknown keys and blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Schema`] listing every invalid parameter.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self, ValidationError> {
        let value = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let mut errors = FieldErrors::new();
        let mut query = Self { search: value("search").and_then(SearchTerm::new), ..Self::default() };

        for (key, slot) in [("date_from", &mut query.date_from), ("date_to", &mut query.date_to)] {
            if let Some(raw) = value(key) {
                match MatchDate::parse(raw) {
                    Some(date) => *slot = Some(date),
                    None => errors.push(
                        key,
                        format!("The {} field must be a valid date.", key.replace('_', " ")),
                    ),
                }
            }
        }
        if let Some(raw) = value("sort_by") {
            match S::parse(raw) {
                Some(field) => query.sort_by = field,
                None => errors.push("sort_by", "The selected sort by is invalid."),
            }
        }
        if let Some(raw) = value("sort_dir") {
            match SortDirection::parse(raw) {
                Some(direction) => query.sort_dir = direction,
                None => errors.push("sort_dir", "The selected sort dir is invalid."),
            }
        }
        if let Some(raw) = value("per_page") {
            match raw.parse::<u32>() {
                Ok(size) if (1..=MAX_PER_PAGE).contains(&size) => query.per_page = size,
                _ => errors.push(
                    "per_page",
                    format!("The per page field must be between 1 and {MAX_PER_PAGE}."),
                ),
            }
        }
        if let Some(raw) = value("page") {
            match raw.parse::<u32>() {
                Ok(page) if page >= 1 => query.page = page,
                _ => errors.push("page", "The page field must be at least 1."),
            }
        }

        if errors.is_empty() { Ok(query) } else { Err(ValidationError::Schema(errors)) }
    }
}

impl<S> ListQuery<S> {
    /// Returns true when the date lies within the inclusive bounds.
    #[must_use]
    pub fn includes_date(&self, date: MatchDate) -> bool {
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    /// Zero-based index of the first row on the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

// ============================================================================
// SECTION: Pages
// ============================================================================

/// Page metadata returned with list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// One-based page number.
    pub current_page: u32,
    /// Page size.
    pub per_page: u32,
    /// Rows matching the filters.
    pub total: u64,
    /// Last page number; at least one.
    pub last_page: u64,
    /// One-based position of the first row on this page.
    pub from: Option<u64>,
    /// One-based position of the last row on this page.
    pub to: Option<u64>,
}

impl Pagination {
    /// Computes metadata for a page holding `len` rows.
    #[must_use]
    pub fn new(current_page: u32, per_page: u32, total: u64, len: usize) -> Self {
        let size = u64::from(per_page.max(1));
        let last_page = total.div_ceil(size).max(1);
        let first = u64::from(current_page.saturating_sub(1)) * size;
        let len = u64::try_from(len).unwrap_or(u64::MAX);
        let (from, to) = if len == 0 { (None, None) } else { (Some(first + 1), Some(first + len)) };
        Self { current_page, per_page, total, last_page, from, to }
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Page metadata.
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Slices an already filtered and sorted row set.
    #[must_use]
    pub fn from_sorted<S>(rows: Vec<T>, query: &ListQuery<S>) -> Self {
        let total = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.per_page).unwrap_or(usize::MAX);
        let items: Vec<T> = rows.into_iter().skip(skip).take(take).collect();
        let pagination = Pagination::new(query.page, query.per_page, total, items.len());
        Self { items, pagination }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
