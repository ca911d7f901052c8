//! Converts the Doable pitch deck from HTML slides into a PowerPoint package.
//!
//! `html` reads the slide markup, `layout` positions shapes on a 16:9 page in
//! EMU, and `pptx` serializes the result as an OOXML zip.

use std::fs;
use std::io::Cursor;
use std::path::Path;

pub mod html;
pub mod layout;
pub mod pptx;

pub use html::{parse_deck, SlideSource};
pub use layout::{layout_slide, SlideLayout};
pub use pptx::write_pptx;

/// The deck that ships with the repository.
pub const BUNDLED_DECK: &str = include_str!("../../assets/doable_deck.html");

pub const DEFAULT_FOOTER_LABEL: &str = "Doable Presentation";

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("no slides found in document")]
    Empty,
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses `html`, lays out every slide and writes the package to `writer`.
pub fn build_deck<W>(html: &str, footer_label: &str, writer: W) -> Result<W, DeckError>
where
    W: std::io::Write + std::io::Seek,
{
    let slides = parse_deck(html)?;
    if slides.is_empty() {
        return Err(DeckError::Empty);
    }
    let layouts: Vec<SlideLayout> = slides
        .iter()
        .map(|slide| layout_slide(slide, footer_label))
        .collect();
    write_pptx(writer, &layouts)
}

/// Builds the package in memory and only then writes `path`, so a failed
/// build never leaves a partial file behind.
pub fn write_deck_file(html: &str, footer_label: &str, path: &Path) -> Result<(), DeckError> {
    let package = build_deck(html, footer_label, Cursor::new(Vec::new()))?;
    fs::write(path, package.into_inner())?;
    Ok(())
}
