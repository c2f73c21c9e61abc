//! Typed records parsed out of documentation sections
//!
//! Every parser takes the node slice of one named section and returns an
//! explicit `ParseError` on page-format anomalies. Nothing here panics on
//! bad input, and nothing here touches storage.

mod function;
mod parameters;
mod requirements;
mod structure;

pub use function::{parse_function_signature, split_parameter, FunctionDeclaration, Parameter};
pub use parameters::{check_arity, parse_parameter_blocks, ParameterBlock};
pub use requirements::{parse_requirements_table, RequirementsTable};
pub use structure::{
    parse_struct_declaration, StructDeclaration, StructMember, Win32TypeName,
};

use crate::document::ContentNode;
use scraper::Selector;
use thiserror::Error;

/// Section names used by the parsers
pub mod section {
    pub const SYNTAX: &str = "syntax";
    pub const PARAMETERS: &str = "parameters";
    pub const REQUIREMENTS: &str = "requirements";
}

/// Page-format errors; each one drops the current record only
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Section '{0}' not found")]
    MissingSection(String),

    #[error("Expected exactly one code block in '{section}', found {found}")]
    UnexpectedBlockCount { section: String, found: usize },

    #[error("Malformed signature line: '{0}'")]
    MalformedSignature(String),

    #[error("Malformed parameter line: '{0}'")]
    MalformedParameter(String),

    #[error("Parameter header #{index} has {count} code elements: {fragment}")]
    NewCaseEncountered {
        index: usize,
        count: usize,
        fragment: String,
    },

    #[error("Parameter description before the first header: {0}")]
    UnanchoredDescription(String),

    #[error("Parameter header has no name: {0}")]
    EmptyParameterName(String),

    #[error("Declared arity {declared} but {described} parameters are documented")]
    ArityMismatch { declared: usize, described: usize },

    #[error("Expected a single requirements element, found {0}")]
    NotSingleElement(usize),

    #[error("Requirements table not found: {0}")]
    RequirementsNotFound(String),

    #[error("Requirements row {row} has {cells} cells, expected 2")]
    TooManyColumns { row: usize, cells: usize },

    #[error("Declaration contains a union")]
    UnionDeclaration,

    #[error("Unsupported declaration: {0}")]
    UnsupportedDeclaration(String),

    #[error("C parser unavailable: {0}")]
    ParserUnavailable(String),
}

impl ParseError {
    /// Stable short label used when tallying failures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSection(_) => "missing_section",
            Self::UnexpectedBlockCount { .. } => "unexpected_block_count",
            Self::MalformedSignature(_) => "malformed_signature",
            Self::MalformedParameter(_) => "malformed_parameter",
            Self::NewCaseEncountered { .. } => "new_case_encountered",
            Self::UnanchoredDescription(_) => "unanchored_description",
            Self::EmptyParameterName(_) => "empty_parameter_name",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::NotSingleElement(_) => "not_single_element",
            Self::RequirementsNotFound(_) => "requirements_not_found",
            Self::TooManyColumns { .. } => "too_many_columns",
            Self::UnionDeclaration => "union_declaration",
            Self::UnsupportedDeclaration(_) => "unsupported_declaration",
            Self::ParserUnavailable(_) => "parser_unavailable",
        }
    }
}

/// Returns the text of the only code block in a section
///
/// A node counts as a code block when it is a `<pre>` or wraps one; other
/// nodes (captions, language tabs) are ignored.
pub(crate) fn single_code_block(
    section_name: &str,
    nodes: &[ContentNode<'_>],
) -> Result<String, ParseError> {
    let pre = Selector::parse("pre").map_err(|e| {
        ParseError::UnsupportedDeclaration(format!("invalid code block selector: {:?}", e))
    })?;

    let blocks: Vec<String> = nodes
        .iter()
        .filter_map(|node| {
            if node.tag() == "pre" {
                Some(node.text())
            } else {
                node.element()
                    .select(&pre)
                    .next()
                    .map(|inner| inner.text().collect())
            }
        })
        .collect();

    match blocks.len() {
        1 => Ok(blocks.into_iter().next().unwrap_or_default()),
        found => Err(ParseError::UnexpectedBlockCount {
            section: section_name.to_string(),
            found,
        }),
    }
}

/// Shortens an HTML fragment for log and error context
pub(crate) fn snippet(html: &str) -> String {
    const MAX: usize = 160;
    match html.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &html[..cut]),
        None => html.to_string(),
    }
}
