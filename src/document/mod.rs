//! Documentation page model
//!
//! A page is parsed once into a `scraper::Html` document owned by the caller.
//! Everything downstream borrows from it:
//! - `extract` locates the article container and flattens its children
//! - `sections` partitions the flat node list into named sections

mod extract;
mod sections;

pub use extract::{
    extract_main_content, parse_page, ContentNode, ContentSource, ExtractError, MainContent,
};
pub use sections::{join_html, split_sections, Section, Sections, BASIC_DESCRIPTION};
