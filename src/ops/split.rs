//! Split into fixed-size chunks, or pull out selected pages

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::{PageSelection, QpdfWrapper};
use crate::source::{ensure_distinct, prepare_dir, read_pdf, write_output};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SplitResult {
    pub output_dir: String,
    pub file_count: u32,
    pub output_paths: Vec<String>,
    pub total_size: u64,
    /// Page count of the source document
    pub page_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ExtractPagesResult {
    pub output_path: String,
    pub output_size: u64,
    pub page_count: u32,
    /// Requested 1-based pages the document does not have
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<u32>,
}

/// Write `split_1.pdf`, `split_2.pdf`, ... into `output_dir`, each holding
/// `pages_per_file` consecutive pages (the last one possibly fewer).
pub fn split_by_pages(input: &Path, output_dir: &Path, pages_per_file: u32) -> Result<SplitResult> {
    if pages_per_file == 0 {
        return Err(Error::invalid_input("pages_per_file must be at least 1"));
    }

    let data = read_pdf(input)?;
    let chunks = QpdfWrapper::split_into_chunks(&data, pages_per_file, None)?;
    prepare_dir(output_dir)?;

    let mut written: Vec<PathBuf> = Vec::with_capacity(chunks.len());
    let mut total_size = 0u64;
    let mut page_count = 0u32;

    for (n, (bytes, pages)) in chunks.iter().enumerate() {
        let path = output_dir.join(format!("split_{}.pdf", n + 1));
        match write_output(&path, bytes) {
            Ok(size) => total_size += size,
            Err(e) => {
                for done in &written {
                    let _ = std::fs::remove_file(done);
                }
                return Err(e);
            }
        }
        page_count += pages;
        written.push(path);
    }

    tracing::info!(
        files = written.len(),
        pages = page_count,
        dir = %output_dir.display(),
        "split"
    );

    Ok(SplitResult {
        output_dir: display(output_dir),
        file_count: written.len() as u32,
        output_paths: written.iter().map(|p| display(p)).collect(),
        total_size,
        page_count,
    })
}

/// Copy the selected pages, in ascending order, into a new file.
///
/// Pages past the end of the document are skipped and reported; a selection
/// with no page inside the document is rejected.
pub fn extract_pages(
    input: &Path,
    output: &Path,
    selection: &PageSelection,
) -> Result<ExtractPagesResult> {
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let total = QpdfWrapper::get_page_count(&data, None)?;
    let (present, skipped_pages) = selection.within(total);

    if present.is_empty() {
        return Err(Error::invalid_input(format!(
            "None of the selected pages exist (document has {} pages)",
            total
        )));
    }
    if !skipped_pages.is_empty() {
        tracing::warn!(?skipped_pages, total, "selected pages beyond document end");
    }

    let bytes = QpdfWrapper::select_pages(&data, &present, None)?;
    let output_size = write_output(output, &bytes)?;

    Ok(ExtractPagesResult {
        output_path: display(output),
        output_size,
        page_count: present.len() as u32,
        skipped_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::sample_pdf;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, pages: u32) -> PathBuf {
        let path = dir.path().join("in.pdf");
        std::fs::write(&path, sample_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn test_split_chunk_count_and_names() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir, 5);
        let out = dir.path().join("parts");

        let result = split_by_pages(&input, &out, 2).unwrap();
        assert_eq!(result.file_count, 3);
        assert_eq!(result.page_count, 5);
        assert!(out.join("split_1.pdf").exists());
        assert!(out.join("split_3.pdf").exists());
        assert!(!out.join("split_4.pdf").exists());

        let last = std::fs::read(out.join("split_3.pdf")).unwrap();
        assert_eq!(QpdfWrapper::get_page_count(&last, None).unwrap(), 1);
    }

    #[test]
    fn test_split_zero_rejected_before_reading() {
        let dir = TempDir::new().unwrap();
        let result = split_by_pages(&dir.path().join("missing.pdf"), dir.path(), 0);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_extract_pages_skips_missing() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir, 3);
        let out = dir.path().join("picked.pdf");
        let selection = PageSelection::parse("1,3,9").unwrap();

        let result = extract_pages(&input, &out, &selection).unwrap();
        assert_eq!(result.page_count, 2);
        assert_eq!(result.skipped_pages, vec![9]);
    }

    #[test]
    fn test_extract_pages_nothing_in_range() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir, 2);
        let selection = PageSelection::parse("5-6").unwrap();
        let result = extract_pages(&input, &dir.path().join("x.pdf"), &selection);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_extract_pages_refuses_to_overwrite_input() {
        let dir = TempDir::new().unwrap();
        let input = fixture(&dir, 2);
        let selection = PageSelection::parse("1").unwrap();
        assert!(matches!(
            extract_pages(&input, &input, &selection),
            Err(Error::OutputExists { .. })
        ));
    }
}
