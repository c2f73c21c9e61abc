//! Storage module for persisting scraped documentation
//!
//! This module handles all database operations for ntdocs, including:
//! - SQLite database initialization and schema management
//! - The symbol index and the archived raw page cache
//! - Parsed function and structure records
//! - Run tracking for every scrape and fill pass

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::NtdocsError;
use std::fmt;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(NtdocsError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, NtdocsError> {
    SqliteStorage::new(path)
}

/// Kind of a documented symbol, as recorded in the `Symbol.type` column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Structure,
    Enumeration,
    Callback,
    Macro,
    Union,
    Class,
    Interface,
    Other(String),
}

impl SymbolKind {
    pub fn to_db_string(&self) -> &str {
        match self {
            Self::Function => "function",
            Self::Structure => "structure",
            Self::Enumeration => "enumeration",
            Self::Callback => "callback",
            Self::Macro => "macro",
            Self::Union => "union",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Other(s) => s,
        }
    }

    pub fn from_db_string(s: &str) -> Self {
        match s.trim() {
            "function" => Self::Function,
            "structure" => Self::Structure,
            "enumeration" => Self::Enumeration,
            "callback" | "callback function" => Self::Callback,
            "macro" => Self::Macro,
            "union" => Self::Union,
            "class" => Self::Class,
            "interface" => Self::Interface,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One documentation page to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReference {
    pub header: String,
    pub name: String,
    pub kind: SymbolKind,
    /// Path relative to the documentation host, e.g. `/windows/win32/api/...`
    pub url: String,
}

impl SymbolReference {
    /// Joins the base URL and the relative path with exactly one `/`
    pub fn absolute_url(&self, base: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        )
    }
}

/// An archived page, still compressed
#[derive(Debug, Clone)]
pub struct RawPage {
    pub symbol_name: String,
    /// `None` when the symbol is no longer in the index
    pub kind: Option<SymbolKind>,
    pub payload: String,
}

/// A fully parsed function, ready to be stored
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub declaration: crate::symbols::FunctionDeclaration,
    /// One entry per declared parameter, in signature order
    pub parameter_docs: Vec<crate::symbols::ParameterBlock>,
    pub description: String,
    /// JSON array of single-key objects
    pub requirements: String,
}

/// A stored function as read back for lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionData {
    pub name: String,
    pub return_type: String,
    pub description: String,
    pub requirements: String,
    pub arity: usize,
    pub parameters: Vec<FunctionParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: String,
    pub datatype: String,
    pub usage: String,
    pub documentation: String,
}

/// Represents a scrape or fill pass
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub kind: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub succeeded: u64,
    pub failed: u64,
}

/// Status of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Interrupted,
            RunStatus::Failed,
        ] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_symbol_kind_from_db() {
        assert_eq!(SymbolKind::from_db_string("function"), SymbolKind::Function);
        assert_eq!(
            SymbolKind::from_db_string("callback function"),
            SymbolKind::Callback
        );
        assert_eq!(
            SymbolKind::from_db_string("ioctl"),
            SymbolKind::Other("ioctl".to_string())
        );
        assert_eq!(SymbolKind::Other("ioctl".to_string()).to_db_string(), "ioctl");
    }

    #[test]
    fn test_absolute_url_single_slash() {
        let symbol = SymbolReference {
            header: "memoryapi.h".to_string(),
            name: "VirtualFree".to_string(),
            kind: SymbolKind::Function,
            url: "/windows/win32/api/memoryapi/nf-memoryapi-virtualfree".to_string(),
        };

        let expected =
            "https://learn.microsoft.com/en-us/windows/win32/api/memoryapi/nf-memoryapi-virtualfree";
        assert_eq!(symbol.absolute_url("https://learn.microsoft.com/en-us"), expected);
        assert_eq!(symbol.absolute_url("https://learn.microsoft.com/en-us/"), expected);

        let relative = SymbolReference {
            url: "windows/x".to_string(),
            ..symbol
        };
        assert_eq!(relative.absolute_url("http://h/"), "http://h/windows/x");
    }
}
