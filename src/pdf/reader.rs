//! PDFium access: document loading, glyph collection and page rendering

use crate::error::{Error, Result};
use crate::pdf::layout::{Glyph, PageLayout};
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
pub fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Whether the PDFium shared library can be bound on this machine
pub fn pdfium_available() -> bool {
    create_pdfium().is_ok()
}

/// Map PDFium errors to our error type
pub fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        _ => Error::Pdfium {
            reason: format!("{}", err),
        },
    }
}

/// Load a document from bytes after checking the `%PDF` header
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    data: &'a [u8],
    password: Option<&str>,
) -> Result<PdfDocument<'a>> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    pdfium
        .load_pdf_from_byte_slice(data, password)
        .map_err(map_pdfium_error)
}

/// Number of pages in a loaded document
pub fn page_count(document: &PdfDocument) -> u32 {
    document.pages().len() as u32
}

/// Fetch a page by 0-based index
pub fn get_page<'a>(document: &PdfDocument<'a>, index: u32) -> Result<PdfPage<'a>> {
    let total = page_count(document);
    if index >= total {
        return Err(Error::PageOutOfBounds {
            page: index + 1,
            total,
        });
    }
    document
        .pages()
        .get(index as u16)
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", index + 1, e),
        })
}

/// Collect every character with its loose bounds
pub fn page_glyphs(page: &PdfPage) -> Vec<Glyph> {
    let Ok(text) = page.text() else {
        return Vec::new();
    };

    let mut glyphs = Vec::new();
    for segment in text.segments().iter() {
        if let Ok(chars) = segment.chars() {
            for char_result in chars.iter() {
                if let (Some(c), Ok(bounds)) = (char_result.unicode_char(), char_result.loose_bounds())
                {
                    glyphs.push(Glyph::new(
                        c,
                        bounds.left().value,
                        bounds.top().value,
                        bounds.width().value,
                        bounds.height().value,
                    ));
                }
            }
        }
    }
    glyphs
}

/// Reading-order layout of a page
pub fn page_layout(page: &PdfPage) -> PageLayout {
    PageLayout::from_glyphs(page_glyphs(page))
}

/// Page text, either as PDFium's content-stream order or rebuilt from positions
pub fn page_text(page: &PdfPage, preserve_layout: bool) -> String {
    if preserve_layout {
        return page_layout(page).text();
    }
    match page.text() {
        Ok(text) => text.all().trim_end().to_string(),
        Err(_) => String::new(),
    }
}

/// Page size in points
pub fn page_size(page: &PdfPage) -> (f32, f32) {
    (page.width().value, page.height().value)
}

/// Render a page to a bitmap at `scale` pixels per point
pub fn render_page(page: &PdfPage, scale: f32) -> Result<DynamicImage> {
    let config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .render_form_data(true)
        .render_annotations(true);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to render page: {}", e),
        })?;

    Ok(bitmap.as_image())
}
