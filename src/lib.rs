//! ntdocs: a Windows API documentation scraper
//!
//! This crate fetches Win32 documentation pages with a bounded, rate-limited
//! worker pool, archives their main content, and turns the archived HTML into
//! typed symbol records (function signatures, parameter descriptions,
//! requirement tables, structure layouts) stored in SQLite.

pub mod codec;
pub mod config;
pub mod crawler;
pub mod document;
pub mod ingest;
pub mod lookup;
pub mod output;
pub mod state;
pub mod storage;
pub mod symbols;

use thiserror::Error;

/// Main error type for ntdocs operations
#[derive(Debug, Error)]
pub enum NtdocsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Content extraction error: {0}")]
    Extract(#[from] document::ExtractError),

    #[error("Parse error: {0}")]
    Parse(#[from] symbols::ParseError),

    #[error("Codec error: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl NtdocsError {
    /// Short label used when tallying per-record failures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Fetch(_) => "fetch_failed",
            Self::Extract(_) => "extract_failed",
            Self::Parse(e) => e.kind(),
            Self::Codec(_) => "codec",
            Self::Storage(storage::StorageError::ArityMismatch { .. }) => "arity_mismatch",
            Self::Storage(storage::StorageError::Inconsistent { .. }) => "inconsistent",
            Self::Storage(_) | Self::Database(_) => "storage",
            Self::Reqwest(_) => "http_client",
            Self::Io(_) => "io",
            Self::Pattern(_) => "pattern",
            Self::Join(_) => "task",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for ntdocs operations
pub type Result<T> = std::result::Result<T, NtdocsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::SymbolState;
pub use storage::{SymbolKind, SymbolReference};
pub use symbols::{FunctionDeclaration, Parameter, ParseError, StructDeclaration};
