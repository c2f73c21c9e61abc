//! Parameter section parsing
//!
//! Each parameter is introduced by a header paragraph holding a single
//! inline code element (`<p><code>[in] lpAddress</code></p>`). Every node
//! up to the next header is that parameter's description.

use super::{snippet, ParseError};
use crate::document::ContentNode;
use scraper::Node;

/// One parameter's name and its description fragments, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBlock {
    pub name: String,
    pub fragments: Vec<String>,
}

impl ParameterBlock {
    /// Description fragments joined into one HTML string
    pub fn documentation(&self) -> String {
        self.fragments.join(" ")
    }
}

/// Counts the code elements of a header candidate
///
/// Only a `<p>` whose content is code elements and whitespace qualifies;
/// anything else returns 0.
fn header_code_count(node: &ContentNode<'_>) -> usize {
    if node.tag() != "p" {
        return 0;
    }

    let mut codes = 0;
    for child in node.element().children() {
        match child.value() {
            Node::Element(element) if element.name() == "code" => codes += 1,
            Node::Element(_) => return 0,
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(_) => return 0,
            _ => {}
        }
    }
    codes
}

/// Parses the `parameters` section into ordered name/description pairs
///
/// A section without any header yields an empty list; some symbols simply
/// take no parameters.
pub fn parse_parameter_blocks(
    nodes: &[ContentNode<'_>],
) -> Result<Vec<ParameterBlock>, ParseError> {
    let mut headers = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        match header_code_count(node) {
            0 => {}
            1 => headers.push(index),
            count => {
                return Err(ParseError::NewCaseEncountered {
                    index,
                    count,
                    fragment: snippet(&node.html()),
                })
            }
        }
    }

    let Some(&first) = headers.first() else {
        return Ok(Vec::new());
    };
    if first != 0 {
        return Err(ParseError::UnanchoredDescription(snippet(&nodes[0].html())));
    }

    let mut blocks = Vec::with_capacity(headers.len());
    for (i, &start) in headers.iter().enumerate() {
        let end = headers.get(i + 1).copied().unwrap_or(nodes.len());
        let header = &nodes[start];

        let header_text = header.text();
        let name = header_text
            .split_whitespace()
            .last()
            .ok_or_else(|| ParseError::EmptyParameterName(snippet(&header.html())))?;

        blocks.push(ParameterBlock {
            name: name.to_string(),
            fragments: nodes[start + 1..end].iter().map(|n| n.html()).collect(),
        });
    }

    Ok(blocks)
}

/// Cross-checks a signature's arity against the documented parameters
pub fn check_arity(declared: usize, blocks: &[ParameterBlock]) -> Result<(), ParseError> {
    if declared != blocks.len() {
        return Err(ParseError::ArityMismatch {
            declared,
            described: blocks.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{extract_main_content, parse_page, ContentSource};
    use scraper::Html;

    fn parse_fragment(body: &str) -> Html {
        parse_page(format!(r#"<div class="content">{}</div>"#, body).as_bytes())
    }

    #[test]
    fn test_two_parameters() {
        let doc = parse_fragment(
            "<p><code>[in] lpAddress</code></p><p>A pointer.</p>\
             <p><code>[in] dwSize</code></p><p>The size.</p><div class=\"alert\">Note</div>",
        );
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let blocks = parse_parameter_blocks(content.nodes()).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "lpAddress");
        assert_eq!(blocks[0].fragments, vec!["<p>A pointer.</p>"]);
        assert_eq!(blocks[1].name, "dwSize");
        assert_eq!(blocks[1].fragments.len(), 2);
        assert_eq!(
            blocks[1].documentation(),
            "<p>The size.</p> <div class=\"alert\">Note</div>"
        );
    }

    #[test]
    fn test_inline_code_in_description_is_not_a_header() {
        let doc = parse_fragment(
            "<p><code>[out] lpInfo</code></p><p>Receives a <code>SYSTEM_INFO</code> structure.</p>",
        );
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let blocks = parse_parameter_blocks(content.nodes()).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].fragments.len(), 1);
    }

    #[test]
    fn test_header_with_empty_description() {
        let doc = parse_fragment("<p><code>[in] a</code></p><p><code>[in] b</code></p>");
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let blocks = parse_parameter_blocks(content.nodes()).unwrap();

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].fragments.is_empty());
        assert!(blocks[1].fragments.is_empty());
    }

    #[test]
    fn test_no_headers_is_empty() {
        let doc = parse_fragment("<p>This function has no parameters.</p>");
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        assert!(parse_parameter_blocks(content.nodes()).unwrap().is_empty());
        assert!(parse_parameter_blocks(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_multiple_codes_in_header_is_new_case() {
        let doc = parse_fragment("<p><code>[in]</code> <code>hFile</code></p><p>desc</p>");
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let result = parse_parameter_blocks(content.nodes());

        assert!(matches!(
            result,
            Err(ParseError::NewCaseEncountered {
                index: 0,
                count: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_description_before_first_header() {
        let doc = parse_fragment("<p>Stray text</p><p><code>[in] h</code></p><p>desc</p>");
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let result = parse_parameter_blocks(content.nodes());

        assert!(matches!(result, Err(ParseError::UnanchoredDescription(_))));
    }

    #[test]
    fn test_blank_header_name() {
        let doc = parse_fragment("<p><code>   </code></p><p>desc</p>");
        let content = extract_main_content(&doc, ContentSource::Archived).unwrap();
        let result = parse_parameter_blocks(content.nodes());

        assert!(matches!(result, Err(ParseError::EmptyParameterName(_))));
    }

    #[test]
    fn test_check_arity() {
        let block = ParameterBlock {
            name: "h".to_string(),
            fragments: vec![],
        };
        assert!(check_arity(1, &[block.clone()]).is_ok());
        assert_eq!(
            check_arity(2, &[block]),
            Err(ParseError::ArityMismatch {
                declared: 2,
                described: 1
            })
        );
    }
}
