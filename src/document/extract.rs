//! Main content extraction
//!
//! Documentation pages carry two `div.content` containers: the first is
//! navigation chrome, the second is the article body. Archived pages only
//! keep the article container, so they have exactly one.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

const CONTENT_SELECTOR: &str = "div.content";

/// Errors raised while locating a page's main content
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Content container #{expected} not found ({found} matching containers)")]
    ContainerNotFound { expected: usize, found: usize },

    #[error("Content container has no child elements")]
    EmptyContainer,

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Where the HTML being extracted came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// A page freshly fetched from the documentation host
    LivePage,

    /// The archived article container read back from storage
    Archived,
}

impl ContentSource {
    fn container_index(&self) -> usize {
        match self {
            Self::LivePage => 1,
            Self::Archived => 0,
        }
    }
}

/// One top-level element of the article body
#[derive(Debug, Clone, Copy)]
pub struct ContentNode<'a> {
    element: ElementRef<'a>,
}

impl<'a> ContentNode<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Lowercase tag name
    pub fn tag(&self) -> &'a str {
        self.element.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// The `id` attribute, if present and non-empty
    pub fn id(&self) -> Option<&'a str> {
        self.attr("id").filter(|id| !id.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Outer HTML of the node
    pub fn html(&self) -> String {
        self.element.html()
    }

    /// Returns true for `<h2>` elements, which delimit sections
    pub fn is_section_heading(&self) -> bool {
        self.tag() == "h2"
    }

    /// Direct child elements, in document order
    pub fn child_elements(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.element.children().filter_map(ElementRef::wrap)
    }
}

/// The article container and its direct children
#[derive(Debug)]
pub struct MainContent<'a> {
    container: ElementRef<'a>,
    nodes: Vec<ContentNode<'a>>,
}

impl<'a> MainContent<'a> {
    /// Top-level nodes in document order
    pub fn nodes(&self) -> &[ContentNode<'a>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialized container, as archived in the raw page store
    pub fn outer_html(&self) -> String {
        self.container.html()
    }
}

/// Parses a fetched body into a document
///
/// Invalid UTF-8 sequences are replaced rather than rejected; html5ever
/// recovers from malformed markup on its own.
pub fn parse_page(bytes: &[u8]) -> Html {
    Html::parse_document(&String::from_utf8_lossy(bytes))
}

/// Locates the article container and flattens its children
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `source` - Whether the page is live (second container) or archived (first)
///
/// # Returns
///
/// * `Ok(MainContent)` - The container and its child elements, in order
/// * `Err(ExtractError)` - The container is missing or empty
pub fn extract_main_content(
    document: &Html,
    source: ContentSource,
) -> Result<MainContent<'_>, ExtractError> {
    let selector =
        Selector::parse(CONTENT_SELECTOR).map_err(|e| ExtractError::InvalidSelector {
            selector: CONTENT_SELECTOR.to_string(),
            message: format!("{:?}", e),
        })?;

    let containers: Vec<ElementRef<'_>> = document.select(&selector).collect();
    let expected = source.container_index();
    let container = containers
        .get(expected)
        .copied()
        .ok_or(ExtractError::ContainerNotFound {
            expected,
            found: containers.len(),
        })?;

    let nodes: Vec<ContentNode<'_>> = container
        .children()
        .filter_map(ElementRef::wrap)
        .map(ContentNode::new)
        .collect();

    if nodes.is_empty() {
        return Err(ExtractError::EmptyContainer);
    }

    tracing::trace!("Extracted {} top-level content nodes", nodes.len());

    Ok(MainContent { container, nodes })
}
