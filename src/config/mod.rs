//! Configuration module for ntdocs
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ntdocs::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ntdocs.toml")).unwrap();
//! println!("Scraping with {} workers", config.scraper.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, LookupConfig, OutputConfig, ScraperConfig, SourceConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
