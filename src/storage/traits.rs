//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    FunctionData, FunctionRecord, RawPage, RunRecord, RunStatus, SymbolKind, SymbolReference,
};
use crate::symbols::StructDeclaration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Function '{function}' declares {declared} parameters but {described} descriptions were supplied")]
    ArityMismatch {
        function: String,
        declared: usize,
        described: usize,
    },

    #[error("Inconsistent record for '{name}': {reason}")]
    Inconsistent { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Methods that write take `&mut self`; a backend shared between tasks is
/// serialized by whoever owns it.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new pass record
    ///
    /// # Arguments
    ///
    /// * `kind` - Which pass is running (`scrape-functions`, ...)
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, kind: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and tally
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        succeeded: u64,
        failed: u64,
    ) -> StorageResult<()>;

    // ===== Symbol Index =====

    /// Inserts a symbol or updates the existing row with the same name
    fn upsert_symbol(&mut self, symbol: &SymbolReference) -> StorageResult<()>;

    fn get_symbol(&self, name: &str) -> StorageResult<Option<SymbolReference>>;

    /// Symbols with no archived page, optionally limited to one kind
    fn list_unscraped_symbols(&self, kind: Option<&SymbolKind>)
        -> StorageResult<Vec<SymbolReference>>;

    /// Structures used as parameter types of stored functions that have no
    /// archived page yet
    ///
    /// Datatypes are matched after stripping `LP`, `P` and `const ` prefixes;
    /// `PSS*` and `PTP*` names are kept whole.
    fn list_unscraped_structures_in_use(&self) -> StorageResult<Vec<SymbolReference>>;

    // ===== Raw Page Cache =====

    /// Archives one page, replacing any previous copy
    fn store_raw_page(&mut self, symbol_name: &str, payload: &str) -> StorageResult<()>;

    /// Archived pages, optionally limited to symbols of one kind
    fn list_raw_pages(&self, kind: Option<&SymbolKind>) -> StorageResult<Vec<RawPage>>;

    // ===== Parsed Records =====

    /// Stores a function and its parameters atomically
    ///
    /// Rejects a record whose parameter descriptions do not line up with its
    /// declaration; nothing is written in that case.
    fn store_function_record(&mut self, record: &FunctionRecord) -> StorageResult<()>;

    /// Reads a function and its parameters in signature order
    fn query_function(&self, name: &str) -> StorageResult<Option<FunctionData>>;

    /// Stores structures with their aliases and members in one transaction
    ///
    /// # Returns
    ///
    /// The number of structures written
    fn store_struct_records(&mut self, records: &[StructDeclaration]) -> StorageResult<usize>;

    fn query_structure(&self, name: &str) -> StorageResult<Option<StructDeclaration>>;

    // ===== Statistics =====

    fn count_symbols(&self) -> StorageResult<u64>;

    fn count_raw_pages(&self) -> StorageResult<u64>;

    fn count_function_records(&self) -> StorageResult<u64>;

    fn count_structure_records(&self) -> StorageResult<u64>;

    /// Symbols still waiting for their page to be archived
    fn count_unscraped(&self) -> StorageResult<u64>;
}
