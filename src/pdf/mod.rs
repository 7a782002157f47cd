//! PDF engine layer
//!
//! qpdf handles page assembly and encryption, PDFium handles text, rendering
//! and drawing, and lopdf exposes the raw image streams.

pub mod layout;
mod pages;
mod qpdf;
pub mod reader;
pub mod xobject;

#[cfg(test)]
pub(crate) mod testing;

pub use layout::{Block, Glyph, PageLayout, TextLine, Thresholds};
pub use pages::{parse_page_numbers, PageSelection, MAX_PAGE_NUMBER};
pub use qpdf::{OpenedPdf, QpdfWrapper};
pub use reader::{create_pdfium, pdfium_available};
