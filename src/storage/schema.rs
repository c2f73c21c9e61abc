//! Database schema definitions
//!
//! Table and column names follow the documentation database layout that
//! downstream tools query directly, hence the mixed casing.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape and fill passes
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    succeeded INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0
);

-- Symbol index: one documentation page per symbol
CREATE TABLE IF NOT EXISTS Symbol (
    header TEXT NOT NULL,
    name TEXT NOT NULL PRIMARY KEY,
    type TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_symbol_type ON Symbol(type);

-- Archived main content, gzip + base64
CREATE TABLE IF NOT EXISTS RawHTML (
    symbolName TEXT NOT NULL PRIMARY KEY,
    html TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS FunctionSymbols (
    name TEXT NOT NULL PRIMARY KEY,
    arity INTEGER NOT NULL,
    "return" TEXT NOT NULL,
    description TEXT NOT NULL,
    requirements TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS FunctionParameters (
    function_name TEXT NOT NULL REFERENCES FunctionSymbols(name),
    srno INTEGER NOT NULL,
    name TEXT NOT NULL,
    datatype TEXT NOT NULL,
    usage TEXT NOT NULL,
    documentation TEXT NOT NULL,
    PRIMARY KEY (function_name, srno)
);

CREATE INDEX IF NOT EXISTS idx_function_parameters_datatype ON FunctionParameters(datatype);

CREATE TABLE IF NOT EXISTS StructureSymbols (
    name TEXT NOT NULL PRIMARY KEY
);

-- Typedef aliases, pointer aliases keep their '*'
CREATE TABLE IF NOT EXISTS StructureNames (
    structure TEXT NOT NULL REFERENCES StructureSymbols(name),
    alias TEXT NOT NULL,
    PRIMARY KEY (structure, alias)
);

CREATE TABLE IF NOT EXISTS StructureMembers (
    structure TEXT NOT NULL REFERENCES StructureSymbols(name),
    srno INTEGER NOT NULL,
    datatype TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (structure, srno)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
