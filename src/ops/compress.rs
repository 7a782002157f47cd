//! Image recompression followed by a structural rewrite

use crate::error::{Error, Result};
use crate::pdf::{xobject, QpdfWrapper};
use crate::source::{ensure_distinct, read_pdf, write_output};
use lopdf::{Document, Object};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How hard embedded images are squeezed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
    ];

    /// JPEG quality for recompressed images
    pub fn quality(self) -> u8 {
        match self {
            CompressionLevel::Low => 85,
            CompressionLevel::Medium => 60,
            CompressionLevel::High => 40,
        }
    }

    /// Linear downscale factor for recompressed images
    pub fn scale(self) -> f32 {
        match self {
            CompressionLevel::Low => 1.0,
            CompressionLevel::Medium => 0.75,
            CompressionLevel::High => 0.5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }

    /// Names accepted by `FromStr`, mildest first
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|level| level.name()).collect()
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Unknown compression level '{}' (expected one of: {})",
                    s,
                    Self::names().join(", ")
                ))
            })
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Negative when the rewrite grew the file
    pub reduction_percent: f64,
    pub images_recompressed: u32,
    pub page_count: u32,
}

/// Recompress page images as JPEG, prune and rewrite.
///
/// `progress(index, total)` fires once per page before it is processed, with
/// a 0-based index. Images shared between pages are handled once.
pub fn compress_pdf(
    input: &Path,
    output: &Path,
    level: CompressionLevel,
    mut progress: impl FnMut(u32, u32),
) -> Result<CompressionStats> {
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let original_size = data.len() as u64;
    // lopdf is strict; let qpdf repair and decrypt first
    let mut doc = Document::load_mem(&QpdfWrapper::normalize(&data)?)?;
    let pages = doc.get_pages();
    let total = pages.len() as u32;

    tracing::debug!(%level, pages = total, "compressing");

    let mut visited = HashSet::new();
    let mut images_recompressed = 0u32;

    for (index, page_id) in pages.values().enumerate() {
        progress(index as u32, total);

        for id in xobject::page_image_ids(&doc, *page_id) {
            if !visited.insert(id) {
                continue;
            }
            match recompress(&mut doc, id, level) {
                Ok(true) => images_recompressed += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(object = ?id, error = %e, "image left as is"),
            }
        }
    }

    doc.prune_objects();
    let mut rebuilt = Vec::new();
    doc.save_to(&mut rebuilt)?;

    let compressed = QpdfWrapper::compress(&rebuilt)?;
    let page_count = QpdfWrapper::get_page_count(&compressed, None)?;
    let compressed_size = write_output(output, &compressed)?;

    let reduction_percent = if original_size == 0 {
        0.0
    } else {
        (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
    };

    tracing::info!(
        original_size,
        compressed_size,
        images_recompressed,
        "compressed"
    );

    Ok(CompressionStats {
        original_size,
        compressed_size,
        reduction_percent,
        images_recompressed,
        page_count,
    })
}

/// Replace one image stream with a JPEG if that makes it smaller
fn recompress(doc: &mut Document, id: lopdf::ObjectId, level: CompressionLevel) -> Result<bool> {
    let Some(info) = xobject::describe(doc, id) else {
        return Ok(false);
    };
    if !info.is_decodable() || info.model.is_none() {
        return Ok(false);
    }

    let bitmap = xobject::decode(doc, &info)?;
    let Ok(Object::Stream(original)) = doc.get_object(id) else {
        return Ok(false);
    };
    let replacement = xobject::jpeg_stream(&original.dict, &bitmap, level.quality(), level.scale())?;

    if replacement.content.len() >= original.content.len() {
        return Ok(false);
    }
    doc.objects.insert(id, Object::Stream(replacement));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{owner_only, pdf_with_images, sample_pdf, with_broken_startxref};
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("low", CompressionLevel::Low)]
    #[case("Medium", CompressionLevel::Medium)]
    #[case(" high ", CompressionLevel::High)]
    fn test_level_from_str(#[case] text: &str, #[case] expected: CompressionLevel) {
        assert_eq!(text.parse::<CompressionLevel>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(matches!(
            "extreme".parse::<CompressionLevel>(),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_level_table() {
        let table: Vec<(u8, f32)> = CompressionLevel::ALL
            .iter()
            .map(|l| (l.quality(), l.scale()))
            .collect();
        assert_eq!(table, vec![(85, 1.0), (60, 0.75), (40, 0.5)]);
        assert_eq!(CompressionLevel::names(), vec!["low", "medium", "high"]);
    }

    #[test]
    fn test_compress_keeps_pages_and_reports_progress() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(3)).unwrap();
        let output = dir.path().join("out.pdf");

        let mut calls = Vec::new();
        let stats = compress_pdf(&input, &output, CompressionLevel::High, |c, t| {
            calls.push((c, t))
        })
        .unwrap();

        assert_eq!(stats.page_count, 3);
        assert_eq!(calls, vec![(0, 3), (1, 3), (2, 3)]);
        assert_eq!(stats.compressed_size, std::fs::metadata(&output).unwrap().len());
    }

    #[test]
    fn test_compress_recompresses_raw_images() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("photos.pdf");
        std::fs::write(&input, pdf_with_images()).unwrap();
        let output = dir.path().join("small.pdf");

        let stats = compress_pdf(&input, &output, CompressionLevel::High, |_, _| {}).unwrap();
        assert_eq!(stats.page_count, 2);
        // The raw gray image always shrinks once JPEG encoded
        assert!(stats.images_recompressed >= 1);
        assert!(stats.compressed_size < stats.original_size);
    }

    #[test]
    fn test_compress_accepts_damaged_xref() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("damaged.pdf");
        std::fs::write(&input, with_broken_startxref(&pdf_with_images())).unwrap();
        let output = dir.path().join("out.pdf");

        let stats = compress_pdf(&input, &output, CompressionLevel::Medium, |_, _| {}).unwrap();
        assert_eq!(stats.page_count, 2);
        let written = std::fs::read(&output).unwrap();
        assert_eq!(QpdfWrapper::get_page_count(&written, None).unwrap(), 2);
    }

    #[test]
    fn test_compress_opens_owner_only_protection() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("owner.pdf");
        std::fs::write(&input, owner_only(&pdf_with_images())).unwrap();
        let output = dir.path().join("out.pdf");

        let stats = compress_pdf(&input, &output, CompressionLevel::High, |_, _| {}).unwrap();
        assert_eq!(stats.page_count, 2);
        assert!(stats.images_recompressed >= 1);
    }
}
