//! Section splitting
//!
//! `<h2 id="...">` headings delimit sections. A single left-to-right scan
//! closes the open section at every heading, so headings and bodies together
//! partition the node list.

use super::ContentNode;
use std::ops::Range;

/// Name of the implicit section before the first heading
pub const BASIC_DESCRIPTION: &str = "basic-description";

/// A contiguous run of nodes
///
/// `heading` is the index of the `<h2>` that opened the section (`None` for
/// the basic description). `name` is `None` when that heading had no `id`;
/// such sections are kept for bookkeeping but are not addressable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: Option<String>,
    pub heading: Option<usize>,
    pub body: Range<usize>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// All sections of one page, borrowing the page's node list
#[derive(Debug)]
pub struct Sections<'n, 'a> {
    nodes: &'n [ContentNode<'a>],
    sections: Vec<Section>,
}

impl<'n, 'a> Sections<'n, 'a> {
    /// Body nodes of the last section with the given name
    ///
    /// A repeated heading id shadows the earlier section, which stays in
    /// `iter()` but is no longer addressable by name.
    pub fn get(&self, name: &str) -> Option<&'n [ContentNode<'a>]> {
        self.sections
            .iter()
            .rev()
            .find(|s| s.name.as_deref() == Some(name))
            .map(|s| &self.nodes[s.body.clone()])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every section in document order, anonymous ones included
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Addressable section names in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().filter_map(|s| s.name.as_deref())
    }

    /// Sections whose heading lacked an `id`
    pub fn discarded(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.name.is_none())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Partitions a flat node list into sections
///
/// Never fails: an id-less heading still closes the previous section, and
/// its content is set aside with a warning.
pub fn split_sections<'n, 'a>(nodes: &'n [ContentNode<'a>]) -> Sections<'n, 'a> {
    let mut sections = Vec::new();
    let mut open_name = Some(BASIC_DESCRIPTION.to_string());
    let mut open_heading = None;
    let mut start = 0;

    for (idx, node) in nodes.iter().enumerate() {
        if !node.is_section_heading() {
            continue;
        }

        sections.push(Section {
            name: open_name.take(),
            heading: open_heading,
            body: start..idx,
        });

        open_heading = Some(idx);
        open_name = node.id().map(str::to_string);
        if open_name.is_none() {
            tracing::warn!(
                "Malformed page: heading '{}' has no id, discarding its section",
                node.text().trim()
            );
        } else if let Some(name) = open_name.as_deref() {
            if sections.iter().any(|s| s.name.as_deref() == Some(name)) {
                tracing::warn!("Duplicate section '{}', keeping the last", name);
            }
        }
        start = idx + 1;
    }

    sections.push(Section {
        name: open_name,
        heading: open_heading,
        body: start..nodes.len(),
    });

    Sections { nodes, sections }
}

/// Serializes nodes to HTML and joins them with single spaces
pub fn join_html(nodes: &[ContentNode<'_>]) -> String {
    nodes
        .iter()
        .map(|n| n.html())
        .collect::<Vec<_>>()
        .join(" ")
}
