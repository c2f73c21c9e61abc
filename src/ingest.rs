//! Offline parse passes over archived pages
//!
//! These passes never touch the network. They read the compressed article
//! containers stored by a scrape pass, run them through the page pipeline
//! and persist typed records. A page that fails any stage is logged and
//! tallied, and nothing is written for it.

use crate::codec;
use crate::document::{
    extract_main_content, join_html, parse_page, split_sections, ContentSource, BASIC_DESCRIPTION,
};
use crate::output::RunTally;
use crate::storage::{FunctionRecord, RunStatus, Storage, SymbolKind};
use crate::symbols::{
    check_arity, parse_function_signature, parse_parameter_blocks, parse_requirements_table,
    parse_struct_declaration, section, ParseError, StructDeclaration, Win32TypeName,
};
use crate::{NtdocsError, Result};

pub const FUNCTION_PASS: &str = "fill-function-records";
pub const STRUCTURE_PASS: &str = "fill-structure-records";

/// Parses every archived function page and stores the resulting records
///
/// The pass is recorded as a run. Per-page failures only show up in the
/// returned tally; an error is returned when storage itself fails.
pub fn fill_function_records<S: Storage>(storage: &mut S, config_hash: &str) -> Result<RunTally> {
    let run_id = storage.create_run(FUNCTION_PASS, config_hash)?;
    let outcome = function_pass(storage);
    close_run(storage, run_id, &outcome)?;
    outcome
}

/// Parses archived structure pages and bulk-stores the declarations
///
/// Pages whose symbol name does not look like a Win32 type name are skipped,
/// as are declarations containing a union.
pub fn fill_structure_records<S: Storage>(storage: &mut S, config_hash: &str) -> Result<RunTally> {
    let run_id = storage.create_run(STRUCTURE_PASS, config_hash)?;
    let outcome = structure_pass(storage);
    close_run(storage, run_id, &outcome)?;
    outcome
}

fn function_pass<S: Storage>(storage: &mut S) -> Result<RunTally> {
    let pages = storage.list_raw_pages(Some(&SymbolKind::Function))?;
    tracing::info!("Parsing {} archived function pages", pages.len());

    let mut tally = RunTally::new();
    for page in pages {
        let stored = parse_function_page(&page.payload).and_then(|record| {
            if record.declaration.name != page.symbol_name {
                tracing::debug!(
                    symbol = %page.symbol_name,
                    "Signature declares '{}'",
                    record.declaration.name
                );
            }
            storage
                .store_function_record(&record)
                .map_err(NtdocsError::from)
        });

        match stored {
            Ok(()) => tally.record_success(),
            Err(e) => {
                log_dropped(&page.symbol_name, &e);
                tally.record_failure(e.kind());
            }
        }
    }

    Ok(tally)
}

fn structure_pass<S: Storage>(storage: &mut S) -> Result<RunTally> {
    let type_names = Win32TypeName::new()?;
    let pages = storage.list_raw_pages(Some(&SymbolKind::Structure))?;
    tracing::info!("Parsing {} archived structure pages", pages.len());

    let mut tally = RunTally::new();
    let mut records = Vec::new();
    for page in pages {
        if !type_names.matches(&page.symbol_name) {
            tracing::debug!(symbol = %page.symbol_name, "Not a type name, skipping");
            tally.record_skip("not_a_type_name");
            continue;
        }

        match parse_structure_page(&page.payload) {
            Ok(declaration) => records.push(declaration),
            Err(NtdocsError::Parse(ParseError::UnionDeclaration)) => {
                tracing::debug!(symbol = %page.symbol_name, "Union declaration, skipping");
                tally.record_skip("union_declaration");
            }
            Err(e) => {
                log_dropped(&page.symbol_name, &e);
                tally.record_failure(e.kind());
            }
        }
    }

    let stored = storage.store_struct_records(&records)?;
    tally.succeeded += stored as u64;
    Ok(tally)
}

/// Runs one archived function page through the whole pipeline
///
/// The requirements section is mandatory, while a page without a
/// `parameters` section describes a function taking no arguments.
pub fn parse_function_page(payload: &str) -> Result<FunctionRecord> {
    let html = codec::decompress(payload)?;
    let document = parse_page(html.as_bytes());
    let content = extract_main_content(&document, ContentSource::Archived)?;
    let sections = split_sections(content.nodes());

    let syntax = sections
        .get(section::SYNTAX)
        .ok_or_else(|| ParseError::MissingSection(section::SYNTAX.to_string()))?;
    let declaration = parse_function_signature(syntax)?;

    let parameter_docs = match sections.get(section::PARAMETERS) {
        Some(nodes) => parse_parameter_blocks(nodes)?,
        None => Vec::new(),
    };
    check_arity(declaration.arity(), &parameter_docs)?;

    let requirements = sections
        .get(section::REQUIREMENTS)
        .ok_or_else(|| ParseError::MissingSection(section::REQUIREMENTS.to_string()))?;
    let requirements = parse_requirements_table(requirements)?;

    let description = sections
        .get(BASIC_DESCRIPTION)
        .map(join_html)
        .unwrap_or_default();

    Ok(FunctionRecord {
        declaration,
        parameter_docs,
        description,
        requirements: requirements.to_json(),
    })
}

/// Runs one archived structure page through the pipeline
pub fn parse_structure_page(payload: &str) -> Result<StructDeclaration> {
    let html = codec::decompress(payload)?;
    let document = parse_page(html.as_bytes());
    let content = extract_main_content(&document, ContentSource::Archived)?;
    let sections = split_sections(content.nodes());

    let syntax = sections
        .get(section::SYNTAX)
        .ok_or_else(|| ParseError::MissingSection(section::SYNTAX.to_string()))?;
    Ok(parse_struct_declaration(syntax)?)
}

fn log_dropped(symbol: &str, error: &NtdocsError) {
    match error {
        NtdocsError::Storage(_) | NtdocsError::Database(_) | NtdocsError::Codec(_) => {
            tracing::error!(symbol, kind = error.kind(), "Dropping record: {}", error)
        }
        _ => tracing::warn!(symbol, kind = error.kind(), "Dropping record: {}", error),
    }
}

fn close_run<S: Storage>(storage: &mut S, run_id: i64, outcome: &Result<RunTally>) -> Result<()> {
    match outcome {
        Ok(tally) => storage.finish_run(
            run_id,
            RunStatus::Completed,
            tally.succeeded,
            tally.failed(),
        )?,
        Err(e) => {
            tracing::error!("Pass {} aborted: {}", run_id, e);
            storage.finish_run(run_id, RunStatus::Failed, 0, 0)?
        }
    }
    Ok(())
}
