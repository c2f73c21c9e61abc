//! Requirements table parsing

use super::{snippet, ParseError};
use crate::document::ContentNode;
use scraper::{ElementRef, Selector};
use serde_json::{Map, Value};

/// Ordered requirement/value pairs; duplicate keys are kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementsTable {
    entries: Vec<(String, String)>,
}

impl RequirementsTable {
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values for a key, in row order
    pub fn values<'t>(&'t self, key: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the table as a JSON array of single-key objects
    ///
    /// `[{"Header": "a.h"}, {"Header": "b.h"}]` keeps both order and duplicates,
    /// which a plain object could not.
    pub fn to_json(&self) -> String {
        let items = self
            .entries
            .iter()
            .map(|(key, value)| {
                let mut entry = Map::with_capacity(1);
                entry.insert(key.clone(), Value::String(value.clone()));
                Value::Object(entry)
            })
            .collect();
        Value::Array(items).to_string()
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parses the `requirements` section into key/value rows
pub fn parse_requirements_table(
    nodes: &[ContentNode<'_>],
) -> Result<RequirementsTable, ParseError> {
    let [table] = nodes else {
        return Err(ParseError::NotSingleElement(nodes.len()));
    };

    if table.tag() != "table" {
        return Err(ParseError::RequirementsNotFound(snippet(&table.html())));
    }

    let tbody = Selector::parse("tbody").map_err(|e| {
        ParseError::RequirementsNotFound(format!("invalid table selector: {:?}", e))
    })?;
    let body = table
        .element()
        .select(&tbody)
        .next()
        .ok_or_else(|| ParseError::RequirementsNotFound(snippet(&table.html())))?;

    let rows: Vec<ElementRef<'_>> = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|row| row.value().name() == "tr")
        .collect();
    if rows.is_empty() {
        return Err(ParseError::RequirementsNotFound(snippet(&table.html())));
    }

    let mut entries = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.into_iter().enumerate() {
        let cells: Vec<ElementRef<'_>> = row.children().filter_map(ElementRef::wrap).collect();

        // Header rows that ended up in the body
        if !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th") {
            continue;
        }

        let data: Vec<ElementRef<'_>> = cells
            .into_iter()
            .filter(|c| c.value().name() == "td")
            .collect();
        if data.len() != 2 {
            return Err(ParseError::TooManyColumns {
                row: row_index,
                cells: data.len(),
            });
        }

        entries.push((cell_text(data[0]), cell_text(data[1])));
    }

    Ok(RequirementsTable { entries })
}
