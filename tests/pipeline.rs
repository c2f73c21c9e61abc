//! Integration tests for the page pipeline
//!
//! A live page goes through extraction, archiving, and the offline
//! function pass, then comes back out through the lookup.

use ntdocs::codec;
use ntdocs::crawler::archive_page;
use ntdocs::document::{extract_main_content, parse_page, split_sections, ContentSource};
use ntdocs::ingest::{fill_function_records, parse_function_page};
use ntdocs::lookup::SymbolLookup;
use ntdocs::storage::{SqliteStorage, Storage, SymbolKind, SymbolReference};
use ntdocs::symbols::{
    check_arity, parse_function_signature, parse_parameter_blocks, parse_requirements_table,
    section, Parameter,
};

const LIVE_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Foo function</title></head><body>
<div class="content"><nav><a href="/win32">Win32</a></nav></div>
<div class="content">
<p>Does foo to a handle.</p>
<h2 id="syntax">Syntax</h2>
<pre><code class="lang-cpp">BOOL Foo(
  [in] HANDLE h
);</code></pre>
<h2 id="parameters">Parameters</h2>
<p><code>Foo h</code></p>
<p>The handle to foo.</p>
<h2 id="return-value">Return value</h2>
<p>Nonzero on success.</p>
<h2>Remarks</h2>
<p>Dropped with its heading.</p>
<h2 id="requirements">Requirements</h2>
<table>
<thead><tr><th>Requirement</th><th>Value</th></tr></thead>
<tbody>
<tr><td>Header</td><td>A</td></tr>
<tr><td>Header</td><td>B</td></tr>
</tbody>
</table>
</div>
</body></html>"#;

#[test]
fn test_live_page_end_to_end() {
    let document = parse_page(LIVE_PAGE.as_bytes());
    let content = extract_main_content(&document, ContentSource::LivePage).unwrap();
    let sections = split_sections(content.nodes());

    let declaration = parse_function_signature(sections.get(section::SYNTAX).unwrap()).unwrap();
    assert_eq!(declaration.name, "Foo");
    assert_eq!(declaration.return_type, "BOOL");
    assert_eq!(declaration.arity(), 1);
    assert_eq!(
        declaration.parameters,
        vec![Parameter {
            usage_hint: "in".to_string(),
            type_hint: "HANDLE".to_string(),
            name: "h".to_string(),
        }]
    );

    let blocks = parse_parameter_blocks(sections.get(section::PARAMETERS).unwrap()).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name, "h");
    assert_eq!(blocks[0].fragments, vec!["<p>The handle to foo.</p>"]);
    check_arity(declaration.arity(), &blocks).unwrap();

    let requirements =
        parse_requirements_table(sections.get(section::REQUIREMENTS).unwrap()).unwrap();
    assert_eq!(
        requirements.entries(),
        &[
            ("Header".to_string(), "A".to_string()),
            ("Header".to_string(), "B".to_string()),
        ]
    );
}

#[test]
fn test_sections_partition_the_article() {
    let document = parse_page(LIVE_PAGE.as_bytes());
    let content = extract_main_content(&document, ContentSource::LivePage).unwrap();
    let sections = split_sections(content.nodes());

    let mut covered = vec![0usize; content.len()];
    for s in sections.iter() {
        if let Some(heading) = s.heading {
            covered[heading] += 1;
        }
        for idx in s.body.clone() {
            covered[idx] += 1;
        }
    }
    assert!(covered.iter().all(|&count| count == 1));

    assert_eq!(sections.discarded().count(), 1);
    assert!(!sections.contains("remarks"));
}

#[test]
fn test_archived_page_parses_like_the_live_one() {
    let blob = archive_page(LIVE_PAGE.as_bytes()).unwrap();
    let record = parse_function_page(&blob).unwrap();

    assert_eq!(record.declaration.name, "Foo");
    assert_eq!(record.description, "<p>Does foo to a handle.</p>");
    assert_eq!(record.requirements, r#"[{"Header":"A"},{"Header":"B"}]"#);

    let html = codec::decompress(&blob).unwrap();
    assert!(!html.contains("<nav>"));
}

#[test]
fn test_fill_then_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ntdocs.db");

    {
        let mut storage = SqliteStorage::new(&db_path).unwrap();
        storage
            .upsert_symbol(&SymbolReference {
                header: "foo.h".to_string(),
                name: "Foo".to_string(),
                kind: SymbolKind::Function,
                url: "/windows/win32/api/foo/nf-foo-foo".to_string(),
            })
            .unwrap();
        storage
            .store_raw_page("Foo", &archive_page(LIVE_PAGE.as_bytes()).unwrap())
            .unwrap();

        let tally = fill_function_records(&mut storage, "hash").unwrap();
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed(), 0);
    }

    let storage = SqliteStorage::new(&db_path).unwrap();
    let mut lookup = SymbolLookup::new(storage, 8);
    let foo = lookup.get("Foo").unwrap().unwrap();

    assert_eq!(foo.return_type, "BOOL");
    assert_eq!(foo.arity, 1);
    assert_eq!(foo.parameters[0].datatype, "HANDLE");
    assert_eq!(foo.parameters[0].documentation, "<p>The handle to foo.</p>");
    assert!(lookup.get("Bar").unwrap().is_none());
}

#[test]
fn test_arity_mismatch_is_reported_not_stored() {
    let page = LIVE_PAGE.replace("[in] HANDLE h\n", "[in] HANDLE h,\n  [in] DWORD n\n");
    let blob = archive_page(page.as_bytes()).unwrap();

    let err = parse_function_page(&blob).unwrap_err();
    assert_eq!(err.kind(), "arity_mismatch");

    let mut storage = SqliteStorage::new_in_memory().unwrap();
    storage.store_raw_page("Foo", &blob).unwrap();
    storage
        .upsert_symbol(&SymbolReference {
            header: "foo.h".to_string(),
            name: "Foo".to_string(),
            kind: SymbolKind::Function,
            url: "/foo".to_string(),
        })
        .unwrap();

    let tally = fill_function_records(&mut storage, "hash").unwrap();
    assert_eq!(tally.failures["arity_mismatch"], 1);
    assert_eq!(storage.count_function_records().unwrap(), 0);
}
