//! Concatenate documents in order

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::QpdfWrapper;
use crate::source::{ensure_absent, read_pdf, write_output};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct MergeResult {
    pub output_path: String,
    pub output_size: u64,
    /// Sum of the input page counts
    pub page_count: u32,
    pub source_count: u32,
}

/// Merge `inputs` into a new file at `output`.
///
/// The output must not exist yet. Every input is read before anything is
/// written, so a bad input leaves no partial output behind.
pub fn merge_pdfs<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<MergeResult> {
    if inputs.is_empty() {
        return Err(Error::invalid_input("No input PDFs provided"));
    }
    ensure_absent(output)?;

    let documents = inputs
        .iter()
        .map(|p| read_pdf(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let slices: Vec<&[u8]> = documents.iter().map(Vec::as_slice).collect();

    let (merged, page_count) = QpdfWrapper::merge(&slices)?;
    let output_size = write_output(output, &merged)?;

    tracing::info!(
        sources = inputs.len(),
        pages = page_count,
        output = %output.display(),
        "merged"
    );

    Ok(MergeResult {
        output_path: display(output),
        output_size,
        page_count,
        source_count: inputs.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::sample_pdf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, pages: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, sample_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn test_merge_sums_pages() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.pdf", 2);
        let b = write(&dir, "b.pdf", 3);
        let out = dir.path().join("merged.pdf");

        let result = merge_pdfs(&[&a, &b], &out).unwrap();
        assert_eq!(result.page_count, 5);
        assert_eq!(result.source_count, 2);
        assert_eq!(result.output_size, std::fs::metadata(&out).unwrap().len());
    }

    #[test]
    fn test_merge_rejects_existing_output() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.pdf", 1);
        let out = write(&dir, "taken.pdf", 1);

        assert!(matches!(
            merge_pdfs(&[&a], &out),
            Err(Error::OutputExists { .. })
        ));
    }

    #[test]
    fn test_merge_missing_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.pdf", 1);
        let missing = dir.path().join("missing.pdf");
        let out = dir.path().join("merged.pdf");

        assert!(matches!(
            merge_pdfs(&[a, missing], &out),
            Err(Error::PdfNotFound { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_merge_empty_list() {
        let dir = TempDir::new().unwrap();
        let none: [&Path; 0] = [];
        assert!(matches!(
            merge_pdfs(&none, &dir.path().join("out.pdf")),
            Err(Error::InvalidInput { .. })
        ));
    }
}
