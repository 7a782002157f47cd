//! Render pages to PNG or JPEG files

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::reader::{
    create_pdfium, get_page, load_document, page_count, page_size, render_page,
};
use crate::source::{prepare_dir, read_pdf, write_output};
use image::{DynamicImage, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

pub const MAX_DPI: u32 = 1200;
/// Largest bitmap rendered for one page
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Output format; `jpg` and `jpeg` differ only in the file extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatChoice {
    #[default]
    Png,
    Jpg,
    Jpeg,
}

impl ImageFormatChoice {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormatChoice::Png => "png",
            ImageFormatChoice::Jpg => "jpg",
            ImageFormatChoice::Jpeg => "jpeg",
        }
    }

    fn codec(self) -> ImageFormat {
        match self {
            ImageFormatChoice::Png => ImageFormat::Png,
            ImageFormatChoice::Jpg | ImageFormatChoice::Jpeg => ImageFormat::Jpeg,
        }
    }
}

impl FromStr for ImageFormatChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormatChoice::Png),
            "jpg" => Ok(ImageFormatChoice::Jpg),
            "jpeg" => Ok(ImageFormatChoice::Jpeg),
            _ => Err(Error::invalid_input(format!(
                "Unsupported image format '{}' (expected png, jpg or jpeg)",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ImageConversion {
    pub input_file: String,
    pub output_folder: String,
    /// Pages rendered
    pub page_count: u32,
    pub total_size: u64,
    pub image_paths: Vec<String>,
}

/// Render every page at `dpi` into `{stem}_page_{n}.{ext}` files
pub fn convert_to_images(
    input: &Path,
    output_dir: &Path,
    format: ImageFormatChoice,
    dpi: u32,
) -> Result<ImageConversion> {
    convert_to_images_with_limit(input, output_dir, format, dpi, DEFAULT_MAX_PIXELS)
}

/// Like [`convert_to_images`], refusing any page whose bitmap would exceed
/// `max_pixels`. All pages are checked before the first one is rendered.
pub fn convert_to_images_with_limit(
    input: &Path,
    output_dir: &Path,
    format: ImageFormatChoice,
    dpi: u32,
    max_pixels: u64,
) -> Result<ImageConversion> {
    if dpi == 0 || dpi > MAX_DPI {
        return Err(Error::invalid_input(format!(
            "dpi must be between 1 and {}, got {}",
            MAX_DPI, dpi
        )));
    }

    let data = read_pdf(input)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, &data, None)?;
    let total = page_count(&document);
    let scale = dpi as f32 / 72.0;

    for index in 0..total {
        let (w, h) = page_size(&get_page(&document, index)?);
        let pixels = (w * scale).ceil() as u64 * (h * scale).ceil() as u64;
        if pixels > max_pixels {
            return Err(Error::ImageDimensionExceeded {
                detail: format!(
                    "page {} at {} dpi is {} pixels, maximum is {}",
                    index + 1,
                    dpi,
                    pixels,
                    max_pixels
                ),
            });
        }
    }

    prepare_dir(output_dir)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());

    let mut image_paths = Vec::with_capacity(total as usize);
    let mut total_size = 0u64;

    for index in 0..total {
        let page = get_page(&document, index)?;
        let bitmap = render_page(&page, scale)?;
        let bitmap = match format.codec() {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(bitmap.to_rgb8()),
            _ => bitmap,
        };

        let mut encoded = Vec::new();
        bitmap.write_to(&mut Cursor::new(&mut encoded), format.codec())?;

        let path = output_dir.join(format!(
            "{}_page_{}.{}",
            stem,
            index + 1,
            format.extension()
        ));
        total_size += write_output(&path, &encoded)?;
        image_paths.push(display(&path));
    }

    tracing::info!(
        pages = image_paths.len(),
        dpi,
        bytes = total_size,
        "rendered pages"
    );

    Ok(ImageConversion {
        input_file: display(input),
        output_folder: display(output_dir),
        page_count: image_paths.len() as u32,
        total_size,
        image_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::pdfium_available;
    use crate::pdf::testing::sample_pdf;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("png", ImageFormatChoice::Png)]
    #[case("JPG", ImageFormatChoice::Jpg)]
    #[case("jpeg", ImageFormatChoice::Jpeg)]
    fn test_format_from_str(#[case] text: &str, #[case] expected: ImageFormatChoice) {
        assert_eq!(text.parse::<ImageFormatChoice>().unwrap(), expected);
    }

    #[test]
    fn test_bad_format_and_dpi() {
        assert!("tiff".parse::<ImageFormatChoice>().is_err());

        let dir = TempDir::new().unwrap();
        let result = convert_to_images(
            &dir.path().join("x.pdf"),
            dir.path(),
            ImageFormatChoice::Png,
            0,
        );
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_renders_each_page() {
        if !pdfium_available() {
            eprintln!("Skipping: PDFium not available");
            return;
        }
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, sample_pdf(2)).unwrap();
        let out = dir.path().join("pages");

        let result = convert_to_images(&input, &out, ImageFormatChoice::Jpg, 72).unwrap();
        assert_eq!(result.page_count, 2);
        assert!(out.join("report_page_2.jpg").exists());

        let first = image::open(out.join("report_page_1.jpg")).unwrap();
        assert!((611..=613).contains(&first.width()));
    }

    #[test]
    fn test_pixel_limit() {
        if !pdfium_available() {
            eprintln!("Skipping: PDFium not available");
            return;
        }
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, sample_pdf(1)).unwrap();

        let result = convert_to_images_with_limit(
            &input,
            &dir.path().join("out"),
            ImageFormatChoice::Png,
            300,
            1_000_000,
        );
        assert!(matches!(result, Err(Error::ImageDimensionExceeded { .. })));
        assert!(!dir.path().join("out").exists());
    }
}
