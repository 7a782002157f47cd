//! Plain-text extraction

use crate::error::Result;
use crate::ops::display;
use crate::pdf::reader::{create_pdfium, get_page, load_document, page_count, page_text};
use crate::pdf::PageSelection;
use crate::source::{read_pdf, write_output};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TextExtraction {
    pub text: String,
    /// Number of pages that contributed a block
    pub pages_with_text: u32,
    pub char_count: u64,
}

/// Text of every page
pub fn extract_all_text(input: &Path, preserve_layout: bool) -> Result<TextExtraction> {
    extract(input, None, preserve_layout)
}

/// Text of the selected pages; indices past the end are ignored
pub fn extract_page_text(
    input: &Path,
    selection: &PageSelection,
    preserve_layout: bool,
) -> Result<TextExtraction> {
    extract(input, Some(selection), preserve_layout)
}

fn extract(
    input: &Path,
    selection: Option<&PageSelection>,
    preserve_layout: bool,
) -> Result<TextExtraction> {
    let data = read_pdf(input)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, &data, None)?;
    let total = page_count(&document);

    let indices: Vec<u32> = match selection {
        Some(selection) => selection.within(total).0,
        None => (0..total).collect(),
    };
    tracing::debug!(pages = indices.len(), preserve_layout, "extracting text");

    let mut blocks = Vec::new();
    for index in indices {
        let page = get_page(&document, index)?;
        let text = page_text(&page, preserve_layout);
        if text.trim().is_empty() {
            continue;
        }
        blocks.push(format!("--- Page {} ---\n{}", index + 1, text));
    }

    let text = blocks.join("\n\n");
    let char_count = text.chars().count() as u64;
    tracing::info!(pages_with_text = blocks.len(), char_count, "text extracted");

    Ok(TextExtraction {
        pages_with_text: blocks.len() as u32,
        char_count,
        text,
    })
}

/// Write extracted text as UTF-8; returns the path and byte size
pub fn save_text(extraction: &TextExtraction, output: &Path) -> Result<(String, u64)> {
    let size = write_output(output, extraction.text.as_bytes())?;
    Ok((display(output), size))
}
