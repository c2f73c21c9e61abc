//! Function signature parsing
//!
//! The `syntax` section of a function page holds one C declaration:
//!
//! ```text
//! BOOL VirtualFree(
//!   [in] LPVOID lpAddress,
//!   [in] SIZE_T dwSize,
//!   [in] DWORD  dwFreeType
//! );
//! ```
//!
//! The first line yields the return type and name; each following line is
//! one parameter.

use super::{section, single_code_block, ParseError};
use crate::document::ContentNode;
use serde::{Deserialize, Serialize};

/// One parameter line of a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Bracketed annotation without brackets (`in`, `out, optional`), or empty
    pub usage_hint: String,
    pub type_hint: String,
    pub name: String,
}

/// A parsed function signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

impl FunctionDeclaration {
    /// Declared parameter count
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Parses the `syntax` section of a function page
pub fn parse_function_signature(
    nodes: &[ContentNode<'_>],
) -> Result<FunctionDeclaration, ParseError> {
    let code = single_code_block(section::SYNTAX, nodes)?;
    parse_signature_text(&code)
}

pub(crate) fn parse_signature_text(code: &str) -> Result<FunctionDeclaration, ParseError> {
    let mut lines = code.lines().skip_while(|line| line.trim().is_empty());

    let first = lines
        .next()
        .ok_or_else(|| ParseError::MalformedSignature(String::new()))?;
    let (return_type, name) = split_signature_head(first)?;

    let mut parameters = Vec::new();
    for line in lines {
        let content = line.trim();
        // Blank lines, the closing `);` and continuation lines opening with `)`
        if content.is_empty() || content.starts_with(')') || content == "void" {
            continue;
        }
        parameters.push(split_parameter(content)?);
    }

    Ok(FunctionDeclaration {
        name,
        return_type,
        parameters,
    })
}

fn split_signature_head(line: &str) -> Result<(String, String), ParseError> {
    let trimmed = line.trim_matches(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ';'));
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    if tokens.len() < 2 {
        return Err(ParseError::MalformedSignature(line.to_string()));
    }

    let (name_token, type_tokens) = tokens
        .split_last()
        .ok_or_else(|| ParseError::MalformedSignature(line.to_string()))?;

    // `Foo(void)` on a single line leaves the argument list glued to the name
    let name = match name_token.find('(') {
        Some(idx) => &name_token[..idx],
        None => name_token,
    };
    if name.is_empty() {
        return Err(ParseError::MalformedSignature(line.to_string()));
    }

    Ok((type_tokens.join(" "), name.to_string()))
}

/// Splits one parameter line into usage, type and name
///
/// `[in, optional] LPCWSTR lpName,` gives usage `in, optional`, type
/// `LPCWSTR`, name `lpName`. Only a leading bracket is an annotation; without
/// one the usage is empty and the whole line is type plus name, so array
/// subscripts (`BYTE buf[16]`) stay on the name.
pub fn split_parameter(line: &str) -> Result<Parameter, ParseError> {
    let (usage_hint, rest) = match line.trim_start().strip_prefix('[') {
        Some(annotated) => {
            let (usage, rest) = annotated
                .split_once(']')
                .ok_or_else(|| ParseError::MalformedParameter(line.to_string()))?;
            (usage.trim().to_string(), rest)
        }
        None => (String::new(), line),
    };

    let rest = rest.replace("[ ", "[").replace(" ]", "]");
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let (last, type_tokens) = tokens
        .split_last()
        .ok_or_else(|| ParseError::MalformedParameter(line.to_string()))?;

    let name = last.trim_end_matches(',');
    if name.is_empty() {
        return Err(ParseError::MalformedParameter(line.to_string()));
    }

    Ok(Parameter {
        usage_hint,
        type_hint: type_tokens.join(" "),
        name: name.to_string(),
    })
}
