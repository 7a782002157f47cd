//! Page count and basic facts about a document

use crate::error::Result;
use crate::ops::display;
use crate::pdf::QpdfWrapper;
use crate::source::read_pdf;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PdfInfo {
    pub path: String,
    pub total_pages: u32,
    /// File size in bytes
    pub file_size: u64,
    pub is_encrypted: bool,
}

/// Open leniently and report the page count.
///
/// Damaged cross-reference tables and similar structural faults are repaired
/// on load; only files that cannot be opened at all fail.
pub fn get_pdf_info(path: &Path) -> Result<PdfInfo> {
    get_pdf_info_with_password(path, None)
}

pub fn get_pdf_info_with_password(path: &Path, password: Option<&str>) -> Result<PdfInfo> {
    let data = read_pdf(path)?;
    let pdf = QpdfWrapper::open(&data, password)?;

    Ok(PdfInfo {
        path: display(path),
        total_pages: pdf.page_count(),
        file_size: data.len() as u64,
        is_encrypted: pdf.is_encrypted(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{sample_pdf, with_broken_startxref};
    use tempfile::TempDir;

    #[test]
    fn test_info_with_leading_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.pdf");
        let mut data = b"\xEF\xBB\xBF\r\n".to_vec();
        data.extend_from_slice(&sample_pdf(2));
        std::fs::write(&path, &data).unwrap();

        let info = get_pdf_info(&path).unwrap();
        assert_eq!(info.total_pages, 2);
        assert_eq!(info.file_size, data.len() as u64);
    }

    #[test]
    fn test_info_repairs_damaged_xref() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("damaged.pdf");
        std::fs::write(&path, with_broken_startxref(&sample_pdf(4))).unwrap();
        assert_eq!(get_pdf_info(&path).unwrap().total_pages, 4);
    }
}
