// crates/taryahan-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backed by SQLite.
// Purpose: Persist pub records, tournament matches, and enquiries.
// Dependencies: taryahan-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! One [`SqliteDatabase`] owns a single connection guarded by a mutex and
//! hands out typed [`SqliteRecordStore`] views, one per table. Every write runs
//! in its own transaction, so a failure mid-write leaves no partial row. List
//! queries are translated to parameterized SQL; sort columns come only from
//! the resource's closed allow-list and never from raw caller text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::functions::FunctionFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use taryahan_core::ListQuery;
use taryahan_core::Page;
use taryahan_core::Pagination;
use taryahan_core::RecordId;
use taryahan_core::RecordStore;
use taryahan_core::SortField;
use taryahan_core::StoreError;
use taryahan_core::Timestamp;
use thiserror::Error;

use crate::tables::SqlResource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// SQL name of the Unicode lowercase function.
const FOLD_FUNCTION: &str = "taryahan_fold";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` record store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config with default pragmas for the given path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding row contents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a read-path `rusqlite` error, separating undecodable rows.
pub(crate) fn map_read_error(err: rusqlite::Error) -> SqliteStoreError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
            SqliteStoreError::Corrupt(format!("column {column}: {source}"))
        }
        rusqlite::Error::IntegralValueOutOfRange(column, value) => {
            SqliteStoreError::Corrupt(format!("column {column}: value {value} out of range"))
        }
        other => SqliteStoreError::Db(other.to_string()),
    }
}

/// Maps a write-path `rusqlite` error.
pub(crate) fn map_db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Open `SQLite` database holding all Taryahan tables.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - The schema version is validated on open.
#[derive(Clone)]
pub struct SqliteDatabase {
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Opens (and if needed creates) the database.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the stored schema version is unsupported.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Returns a typed store for one table.
    #[must_use]
    pub fn store<R: SqlResource>(&self) -> SqliteRecordStore<R> {
        SqliteRecordStore { connection: Arc::clone(&self.connection), resource: PhantomData }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed record store for one resource table.
pub struct SqliteRecordStore<R> {
    /// Shared connection.
    connection: Arc<Mutex<Connection>>,
    /// Resource marker.
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for SqliteRecordStore<R> {
    fn clone(&self) -> Self {
        Self { connection: Arc::clone(&self.connection), resource: PhantomData }
    }
}

impl<R: SqlResource> SqliteRecordStore<R> {
    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Runs the filtered page query.
    fn list_rows(&self, query: &ListQuery<R::Sort>) -> Result<Page<R::Record>, SqliteStoreError> {
        let (where_clause, mut bindings) = build_filters::<R>(query);
        let guard = self.lock()?;
        let total: i64 = guard
            .query_row(
                &format!("SELECT COUNT(1) FROM {} {where_clause}", R::TABLE),
                params_from_iter(bindings.iter()),
                |row| row.get(0),
            )
            .map_err(map_read_error)?;
        let direction = query.sort_dir.as_sql();
        let sql = format!(
            "SELECT {} FROM {} {where_clause} ORDER BY {} {direction}, id {direction} LIMIT ? \
             OFFSET ?",
            R::COLUMNS,
            R::TABLE,
            query.sort_by.column(),
        );
        bindings.push(SqlValue::Integer(i64::from(query.per_page)));
        bindings.push(SqlValue::Integer(i64::try_from(query.offset()).unwrap_or(i64::MAX)));
        let mut statement = guard.prepare(&sql).map_err(|err| map_db_error(&err))?;
        let items = statement
            .query_map(params_from_iter(bindings.iter()), R::decode)
            .map_err(map_read_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_read_error)?;
        let total = u64::try_from(total).unwrap_or(0);
        let pagination = Pagination::new(query.page, query.per_page, total, items.len());
        Ok(Page { items, pagination })
    }

    /// Loads one row on an existing connection.
    fn fetch(connection: &Connection, id: i64) -> Result<Option<R::Record>, SqliteStoreError> {
        connection
            .query_row(
                &format!("SELECT {} FROM {} WHERE id = ?1", R::COLUMNS, R::TABLE),
                params![id],
                R::decode,
            )
            .optional()
            .map_err(map_read_error)
    }

    /// Inserts a row inside one transaction.
    fn insert_row(&self, draft: &R::Draft, at: Timestamp) -> Result<R::Record, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        let id = R::insert(&tx, draft, at)?;
        let record = Self::fetch(&tx, id)?.ok_or_else(|| {
            SqliteStoreError::Corrupt(format!("inserted {} row {id} not readable", R::TABLE))
        })?;
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(record)
    }

    /// Updates a row inside one transaction.
    fn update_row(
        &self,
        id: RecordId,
        patch: &R::Patch,
        at: Timestamp,
    ) -> Result<Option<R::Record>, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        if !R::update(&tx, id.get(), patch, at)? {
            return Ok(None);
        }
        let record = Self::fetch(&tx, id.get())?;
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(record)
    }

    /// Deletes a row inside one transaction.
    fn delete_row(&self, id: RecordId) -> Result<bool, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        let changed = tx
            .execute(&format!("DELETE FROM {} WHERE id = ?1", R::TABLE), params![id.get()])
            .map_err(|err| map_db_error(&err))?;
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(changed > 0)
    }

    /// Loads every row in id order.
    fn all_rows(&self) -> Result<Vec<R::Record>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(&format!("SELECT {} FROM {} ORDER BY id ASC", R::COLUMNS, R::TABLE))
            .map_err(|err| map_db_error(&err))?;
        statement
            .query_map([], R::decode)
            .map_err(map_read_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_read_error)
    }

    /// Counts rows.
    fn count_rows(&self) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let total: i64 = guard
            .query_row(&format!("SELECT COUNT(1) FROM {}", R::TABLE), [], |row| row.get(0))
            .map_err(map_read_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Verifies the connection can execute a simple statement.
    fn check_connection(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.query_row("SELECT 1", [], |_| Ok(())).map_err(|err| map_db_error(&err))
    }
}

impl<R: SqlResource> RecordStore<R> for SqliteRecordStore<R> {
    fn list(&self, query: &ListQuery<R::Sort>) -> Result<Page<R::Record>, StoreError> {
        Ok(self.list_rows(query)?)
    }

    fn get(&self, id: RecordId) -> Result<Option<R::Record>, StoreError> {
        let guard = self.lock()?;
        Ok(Self::fetch(&guard, id.get())?)
    }

    fn insert(&self, draft: &R::Draft, at: Timestamp) -> Result<R::Record, StoreError> {
        Ok(self.insert_row(draft, at)?)
    }

    fn update(
        &self,
        id: RecordId,
        patch: &R::Patch,
        at: Timestamp,
    ) -> Result<Option<R::Record>, StoreError> {
        Ok(self.update_row(id, patch, at)?)
    }

    fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.delete_row(id)?)
    }

    fn all(&self) -> Result<Vec<R::Record>, StoreError> {
        Ok(self.all_rows()?)
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.count_rows()?)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        Ok(self.check_connection()?)
    }
}

// ============================================================================
// SECTION: Query Translation
// ============================================================================

/// Builds the `WHERE` clause and bindings for a list query.
fn build_filters<R: SqlResource>(query: &ListQuery<R::Sort>) -> (String, Vec<SqlValue>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();
    if let Some(from) = query.date_from {
        clauses.push(format!("{} >= ?", R::DATE_EXPR));
        bindings.push(SqlValue::Text(from.to_string()));
    }
    if let Some(to) = query.date_to {
        clauses.push(format!("{} <= ?", R::DATE_EXPR));
        bindings.push(SqlValue::Text(to.to_string()));
    }
    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(term.folded()));
        let mut alternatives: Vec<String> = Vec::new();
        for column in R::SEARCH_COLUMNS {
            alternatives.push(format!("{FOLD_FUNCTION}({column}) LIKE ? ESCAPE '\\'"));
            bindings.push(SqlValue::Text(pattern.clone()));
        }
        for column in R::PLAYER_COLUMNS {
            alternatives.push(format!(
                "EXISTS (SELECT 1 FROM json_each({}.{column}) WHERE json_each.value = ?)",
                R::TABLE
            ));
            bindings.push(SqlValue::Text(term.as_str().to_string()));
        }
        clauses.push(format!("({})", alternatives.join(" OR ")));
    }
    if clauses.is_empty() {
        (String::new(), bindings)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), bindings)
    }
}

/// Escapes `LIKE` wildcards with a backslash.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory exists for the store path.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with pragmas applied.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    register_functions(&connection)?;
    Ok(connection)
}

/// Registers the Unicode lowercase function used by search.
fn register_functions(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .create_scalar_function(
            FOLD_FUNCTION,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS dota_pub_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    total_pubs INTEGER NOT NULL CHECK (total_pubs >= 1),
                    win INTEGER NOT NULL CHECK (win >= 0),
                    lose INTEGER NOT NULL CHECK (lose >= 0),
                    match_date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK (win + lose = total_pubs)
                );
                CREATE INDEX IF NOT EXISTS idx_dota_pub_records_name
                    ON dota_pub_records (name);
                CREATE INDEX IF NOT EXISTS idx_dota_pub_records_match_date
                    ON dota_pub_records (match_date);
                CREATE INDEX IF NOT EXISTS idx_dota_pub_records_name_match_date
                    ON dota_pub_records (name, match_date);
                CREATE TABLE IF NOT EXISTS taryahan_matches (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    team_a_name TEXT NOT NULL,
                    team_b_name TEXT NOT NULL,
                    team_a_players TEXT NOT NULL CHECK (json_valid(team_a_players)),
                    team_b_players TEXT NOT NULL CHECK (json_valid(team_b_players)),
                    team_a_captain TEXT NOT NULL,
                    team_b_captain TEXT NOT NULL,
                    winner TEXT CHECK (winner IN ('team_a', 'team_b')),
                    game_type TEXT NOT NULL DEFAULT 'cs2'
                        CHECK (game_type IN ('dota2', 'cs2')),
                    match_date TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_taryahan_matches_team_a_name
                    ON taryahan_matches (team_a_name);
                CREATE INDEX IF NOT EXISTS idx_taryahan_matches_team_b_name
                    ON taryahan_matches (team_b_name);
                CREATE INDEX IF NOT EXISTS idx_taryahan_matches_match_date
                    ON taryahan_matches (match_date);
                CREATE INDEX IF NOT EXISTS idx_taryahan_matches_winner
                    ON taryahan_matches (winner);
                CREATE INDEX IF NOT EXISTS idx_taryahan_matches_game_type
                    ON taryahan_matches (game_type);
                CREATE TABLE IF NOT EXISTS partner_enquiries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    company TEXT NOT NULL,
                    message TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_partner_enquiries_email
                    ON partner_enquiries (email);
                CREATE INDEX IF NOT EXISTS idx_partner_enquiries_created_at
                    ON partner_enquiries (created_at);
                CREATE INDEX IF NOT EXISTS idx_partner_enquiries_created_at_email
                    ON partner_enquiries (created_at, email);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
