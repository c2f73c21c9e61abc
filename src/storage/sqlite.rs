//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    FunctionData, FunctionParameter, FunctionRecord, RawPage, RunRecord, RunStatus, SymbolKind,
    SymbolReference,
};
use crate::symbols::{StructDeclaration, StructMember};
use crate::NtdocsError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(NtdocsError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, NtdocsError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, NtdocsError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        kind: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        succeeded: row.get::<_, i64>(6)? as u64,
        failed: row.get::<_, i64>(7)? as u64,
    })
}

fn symbol_from_row(row: &Row<'_>) -> rusqlite::Result<SymbolReference> {
    Ok(SymbolReference {
        header: row.get(0)?,
        name: row.get(1)?,
        kind: SymbolKind::from_db_string(&row.get::<_, String>(2)?),
        url: row.get(3)?,
    })
}

const RUN_COLUMNS: &str =
    "id, kind, started_at, finished_at, config_hash, status, succeeded, failed";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, kind: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (kind, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![kind, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        succeeded: u64,
        failed: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, succeeded = ?3, failed = ?4 WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                succeeded as i64,
                failed as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Symbol Index =====

    fn upsert_symbol(&mut self, symbol: &SymbolReference) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO Symbol (header, name, type, url) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET header = excluded.header, type = excluded.type, url = excluded.url",
            params![
                symbol.header,
                symbol.name,
                symbol.kind.to_db_string(),
                symbol.url
            ],
        )?;
        Ok(())
    }

    fn get_symbol(&self, name: &str) -> StorageResult<Option<SymbolReference>> {
        Ok(self
            .conn
            .query_row(
                "SELECT header, name, type, url FROM Symbol WHERE name = ?1",
                params![name],
                symbol_from_row,
            )
            .optional()?)
    }

    fn list_unscraped_symbols(
        &self,
        kind: Option<&SymbolKind>,
    ) -> StorageResult<Vec<SymbolReference>> {
        let mut stmt = self.conn.prepare(
            "SELECT header, name, type, url FROM Symbol
             WHERE (?1 IS NULL OR type = ?1)
               AND name NOT IN (SELECT symbolName FROM RawHTML)
             ORDER BY name",
        )?;

        let symbols = stmt
            .query_map(params![kind.map(|k| k.to_db_string())], symbol_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(symbols)
    }

    fn list_unscraped_structures_in_use(&self) -> StorageResult<Vec<SymbolReference>> {
        let query = "
            WITH used AS (SELECT DISTINCT datatype FROM FunctionParameters),
            stripped AS (
                SELECT CASE
                    WHEN datatype GLOB 'PSS*' THEN datatype
                    WHEN datatype GLOB 'PTP*' THEN datatype
                    WHEN datatype GLOB 'LP*' THEN substr(datatype, 3)
                    WHEN datatype GLOB 'P*' THEN substr(datatype, 2)
                    WHEN datatype GLOB 'const *' THEN substr(datatype, 7)
                    ELSE datatype
                END AS name
                FROM used
            )
            SELECT DISTINCT Symbol.header, Symbol.name, Symbol.type, Symbol.url
            FROM Symbol
            JOIN stripped ON stripped.name = Symbol.name
            WHERE Symbol.type = ?1
              AND Symbol.name NOT IN (SELECT symbolName FROM RawHTML)
            ORDER BY Symbol.name
        ";

        let mut stmt = self.conn.prepare(query)?;
        let symbols = stmt
            .query_map(
                params![SymbolKind::Structure.to_db_string()],
                symbol_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(symbols)
    }

    // ===== Raw Page Cache =====

    fn store_raw_page(&mut self, symbol_name: &str, payload: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO RawHTML (symbolName, html) VALUES (?1, ?2)
             ON CONFLICT(symbolName) DO UPDATE SET html = excluded.html",
            params![symbol_name, payload],
        )?;
        Ok(())
    }

    fn list_raw_pages(&self, kind: Option<&SymbolKind>) -> StorageResult<Vec<RawPage>> {
        let mut stmt = self.conn.prepare(
            "SELECT RawHTML.symbolName, Symbol.type, RawHTML.html
             FROM RawHTML LEFT JOIN Symbol ON Symbol.name = RawHTML.symbolName
             WHERE (?1 IS NULL OR Symbol.type = ?1)
             ORDER BY RawHTML.symbolName",
        )?;

        let pages = stmt
            .query_map(params![kind.map(|k| k.to_db_string())], |row| {
                Ok(RawPage {
                    symbol_name: row.get(0)?,
                    kind: row
                        .get::<_, Option<String>>(1)?
                        .map(|s| SymbolKind::from_db_string(&s)),
                    payload: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    // ===== Parsed Records =====

    fn store_function_record(&mut self, record: &FunctionRecord) -> StorageResult<()> {
        let declaration = &record.declaration;
        if declaration.arity() != record.parameter_docs.len() {
            return Err(StorageError::ArityMismatch {
                function: declaration.name.clone(),
                declared: declaration.arity(),
                described: record.parameter_docs.len(),
            });
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM FunctionParameters WHERE function_name = ?1",
            params![declaration.name],
        )?;
        tx.execute(
            r#"INSERT INTO FunctionSymbols (name, arity, "return", description, requirements)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(name) DO UPDATE SET arity = excluded.arity, "return" = excluded."return",
                   description = excluded.description, requirements = excluded.requirements"#,
            params![
                declaration.name,
                declaration.arity() as i64,
                declaration.return_type,
                record.description,
                record.requirements
            ],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO FunctionParameters (function_name, srno, name, datatype, usage, documentation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (idx, (param, docs)) in declaration
                .parameters
                .iter()
                .zip(&record.parameter_docs)
                .enumerate()
            {
                insert.execute(params![
                    declaration.name,
                    (idx + 1) as i64,
                    param.name,
                    param.type_hint,
                    param.usage_hint,
                    docs.documentation()
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn query_function(&self, name: &str) -> StorageResult<Option<FunctionData>> {
        let head = self
            .conn
            .query_row(
                r#"SELECT name, arity, "return", description, requirements
                   FROM FunctionSymbols WHERE name = ?1"#,
                params![name],
                |row| {
                    Ok(FunctionData {
                        name: row.get(0)?,
                        arity: row.get::<_, i64>(1)? as usize,
                        return_type: row.get(2)?,
                        description: row.get(3)?,
                        requirements: row.get(4)?,
                        parameters: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut data) = head else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT srno, name, datatype, usage, documentation
             FROM FunctionParameters WHERE function_name = ?1 ORDER BY srno",
        )?;
        let rows = stmt.query_map(params![name], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                FunctionParameter {
                    name: row.get(1)?,
                    datatype: row.get(2)?,
                    usage: row.get(3)?,
                    documentation: row.get(4)?,
                },
            ))
        })?;

        for (expected, row) in (1_i64..).zip(rows) {
            let (srno, parameter) = row?;
            if srno != expected {
                return Err(StorageError::Inconsistent {
                    name: name.to_string(),
                    reason: format!("parameter #{} found where #{} was expected", srno, expected),
                });
            }
            data.parameters.push(parameter);
        }

        if data.parameters.len() != data.arity {
            return Err(StorageError::Inconsistent {
                name: name.to_string(),
                reason: format!(
                    "arity {} but {} parameter rows",
                    data.arity,
                    data.parameters.len()
                ),
            });
        }

        Ok(Some(data))
    }

    fn store_struct_records(&mut self, records: &[StructDeclaration]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;

        for record in records {
            tx.execute(
                "DELETE FROM StructureMembers WHERE structure = ?1",
                params![record.name],
            )?;
            tx.execute(
                "DELETE FROM StructureNames WHERE structure = ?1",
                params![record.name],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO StructureSymbols (name) VALUES (?1)",
                params![record.name],
            )?;

            for alias in &record.aliases {
                tx.execute(
                    "INSERT OR IGNORE INTO StructureNames (structure, alias) VALUES (?1, ?2)",
                    params![record.name, alias],
                )?;
            }

            for (idx, member) in record.members.iter().enumerate() {
                tx.execute(
                    "INSERT INTO StructureMembers (structure, srno, datatype, name) VALUES (?1, ?2, ?3, ?4)",
                    params![record.name, (idx + 1) as i64, member.datatype, member.name],
                )?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn query_structure(&self, name: &str) -> StorageResult<Option<StructDeclaration>> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM StructureSymbols WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if exists.is_none() {
            return Ok(None);
        }

        let mut aliases_stmt = self
            .conn
            .prepare("SELECT alias FROM StructureNames WHERE structure = ?1 ORDER BY rowid")?;
        let aliases = aliases_stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut members_stmt = self.conn.prepare(
            "SELECT datatype, name FROM StructureMembers WHERE structure = ?1 ORDER BY srno",
        )?;
        let members = members_stmt
            .query_map(params![name], |row| {
                Ok(StructMember {
                    datatype: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StructDeclaration {
            name: name.to_string(),
            aliases,
            members,
        }))
    }

    // ===== Statistics =====

    fn count_symbols(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM Symbol")
    }

    fn count_raw_pages(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM RawHTML")
    }

    fn count_function_records(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM FunctionSymbols")
    }

    fn count_structure_records(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM StructureSymbols")
    }

    fn count_unscraped(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM Symbol WHERE name NOT IN (SELECT symbolName FROM RawHTML)")
    }
}
