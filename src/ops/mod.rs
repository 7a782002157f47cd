//! Single-shot document processors
//!
//! Each processor reads its input once, runs one engine pipeline and writes to
//! caller-chosen paths. All of them block; async callers go through
//! [`crate::worker::Workbench`].

pub mod compress;
pub mod encrypt;
pub mod images;
pub mod info;
pub mod merge;
pub mod split;
pub mod text;
pub mod to_docx;
pub mod to_images;
pub mod to_xlsx;
pub mod watermark;

pub use compress::{compress_pdf, CompressionLevel, CompressionStats};
pub use encrypt::{add_password, remove_password, PasswordResult};
pub use images::{extract_all_images, extract_page_images, ImageExtraction};
pub use info::{get_pdf_info, get_pdf_info_with_password, PdfInfo};
pub use merge::{merge_pdfs, MergeResult};
pub use split::{extract_pages, split_by_pages, ExtractPagesResult, SplitResult};
pub use text::{extract_all_text, extract_page_text, save_text, TextExtraction};
pub use to_docx::{convert_to_docx, DocxConversion};
pub use to_images::{
    convert_to_images, convert_to_images_with_limit, ImageConversion, ImageFormatChoice,
};
pub use to_xlsx::{convert_to_xlsx, XlsxConversion};
pub use watermark::{add_watermark, WatermarkResult};

use std::path::Path;

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
