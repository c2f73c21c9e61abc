//! Structure declaration parsing
//!
//! Handles the single `typedef struct` form used by the Win32 reference:
//!
//! ```text
//! typedef struct _ACL {
//!   BYTE AclRevision;
//!   WORD AclSize;
//! } ACL, *PACL;
//! ```
//!
//! The code block is parsed with the tree-sitter C grammar. Only the node
//! kinds of that form are accepted; anything else (nested aggregates,
//! function pointers, trailing statements, syntax errors) is reported
//! instead of producing a partial record.

use super::{section, single_code_block, snippet, ParseError};
use crate::document::ContentNode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructMember {
    pub datatype: String,
    pub name: String,
}

/// A parsed structure with its typedef aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDeclaration {
    /// Struct tag, or the first value alias when the struct is anonymous
    pub name: String,
    /// Typedef names in declaration order, pointer aliases keep their `*`
    pub aliases: Vec<String>,
    pub members: Vec<StructMember>,
}

/// Matches names that look like Win32 type names (`ACL`, `SYSTEM_INFO`)
#[derive(Debug, Clone)]
pub struct Win32TypeName(Regex);

impl Win32TypeName {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(r"^[A-Z][A-Z0-9_]+$")?))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

/// Parses the `syntax` section of a structure page
pub fn parse_struct_declaration(
    nodes: &[ContentNode<'_>],
) -> Result<StructDeclaration, ParseError> {
    let code = single_code_block(section::SYNTAX, nodes)?;
    parse_struct_text(&code)
}

pub(crate) fn parse_struct_text(code: &str) -> Result<StructDeclaration, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| ParseError::ParserUnavailable(e.to_string()))?;
    let tree = parser
        .parse(code, None)
        .ok_or_else(|| ParseError::ParserUnavailable("no syntax tree produced".to_string()))?;
    let root = tree.root_node();

    if contains_kind(root, "union_specifier") {
        return Err(ParseError::UnionDeclaration);
    }
    if root.has_error() {
        return Err(unsupported(&format!("syntax error in '{}'", snippet(code))));
    }

    let statements: Vec<Node<'_>> = root
        .named_children(&mut root.walk())
        .filter(|n| n.kind() != "comment")
        .collect();
    let typedef = match statements.as_slice() {
        [single] if single.kind() == "type_definition" => *single,
        [single] => return Err(unsupported(&format!("expected a typedef, found {}", single.kind()))),
        [] => return Err(unsupported("empty code block")),
        [_, extra, ..] => {
            return Err(unsupported(&format!(
                "trailing statement '{}'",
                text(*extra, code)
            )))
        }
    };

    handle_typedef(typedef, code)
}

fn handle_typedef(typedef: Node<'_>, code: &str) -> Result<StructDeclaration, ParseError> {
    let mut tag = None;
    let mut members = None;
    let mut aliases = Vec::new();

    let children: Vec<Node<'_>> = typedef.children(&mut typedef.walk()).collect();
    for child in children {
        match child.kind() {
            "struct_specifier" => {
                tag = child.child_by_field_name("name").map(|n| text(n, code).to_string());
                let body = child
                    .child_by_field_name("body")
                    .ok_or_else(|| unsupported("missing struct body"))?;
                members = Some(handle_struct_body(body, code)?);
            }
            "type_identifier" | "pointer_declarator" => aliases.push(compact(text(child, code))),
            "typedef" | ";" | "," | "comment" => {}
            other => return Err(unsupported(&format!("unexpected '{}' in typedef", other))),
        }
    }

    let members = members.ok_or_else(|| unsupported("typedef of a non-struct type"))?;
    if aliases.is_empty() {
        return Err(unsupported("typedef without a name"));
    }

    let name = match tag {
        Some(tag) => tag,
        None => aliases
            .iter()
            .find(|alias| !alias.starts_with('*'))
            .cloned()
            .ok_or_else(|| unsupported("anonymous struct with only pointer aliases"))?,
    };

    Ok(StructDeclaration {
        name,
        aliases,
        members,
    })
}

fn handle_struct_body(body: Node<'_>, code: &str) -> Result<Vec<StructMember>, ParseError> {
    let mut members = Vec::new();

    let fields: Vec<Node<'_>> = body.children(&mut body.walk()).collect();
    for field in fields {
        match field.kind() {
            "field_declaration" => members.extend(handle_field(field, code)?),
            "{" | "}" | "comment" => {}
            other => return Err(unsupported(&format!("unexpected '{}' in struct body", other))),
        }
    }

    Ok(members)
}

/// One field declaration, possibly declaring several members of one type
///
/// Bit-field widths are dropped: `DWORD Flag : 1` records `Flag`.
fn handle_field(field: Node<'_>, code: &str) -> Result<Vec<StructMember>, ParseError> {
    let ty = field
        .child_by_field_name("type")
        .ok_or_else(|| unsupported(&format!("stray statement '{}'", text(field, code))))?;
    if ty.child_by_field_name("body").is_some() {
        return Err(unsupported(&format!(
            "nested aggregate '{}'",
            snippet(text(field, code))
        )));
    }

    let declarators: Vec<Node<'_>> = field
        .children_by_field_name("declarator", &mut field.walk())
        .collect();
    let first = declarators
        .first()
        .ok_or_else(|| unsupported(&format!("stray statement '{}'", text(field, code))))?;

    // Qualifiers such as `const` precede the type node, so the datatype is
    // everything up to the first declarator
    let datatype = code
        .get(field.start_byte()..first.start_byte())
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    declarators
        .iter()
        .map(|declarator| {
            check_declarator(*declarator, code)?;
            Ok(StructMember {
                datatype: datatype.clone(),
                name: compact(text(*declarator, code)),
            })
        })
        .collect()
}

/// Accepts plain, pointer and array declarators around a field name
fn check_declarator(declarator: Node<'_>, code: &str) -> Result<(), ParseError> {
    match declarator.kind() {
        "field_identifier" => Ok(()),
        "pointer_declarator" | "array_declarator" => {
            let inner = declarator
                .child_by_field_name("declarator")
                .ok_or_else(|| unsupported(&format!("empty declarator '{}'", text(declarator, code))))?;
            check_declarator(inner, code)
        }
        other => Err(unsupported(&format!(
            "{} '{}'",
            other,
            text(declarator, code)
        ))),
    }
}

fn contains_kind(node: Node<'_>, kind: &str) -> bool {
    if node.kind() == kind {
        return true;
    }
    let children: Vec<Node<'_>> = node.children(&mut node.walk()).collect();
    children.into_iter().any(|child| contains_kind(child, kind))
}

fn text<'c>(node: Node<'_>, code: &'c str) -> &'c str {
    code.get(node.start_byte()..node.end_byte()).unwrap_or_default()
}

/// `* PACL` -> `*PACL`, `Name[ MAX_PATH ]` -> `Name[MAX_PATH]`
fn compact(declarator: &str) -> String {
    declarator.split_whitespace().collect()
}

fn unsupported(reason: &str) -> ParseError {
    ParseError::UnsupportedDeclaration(reason.to_string())
}
