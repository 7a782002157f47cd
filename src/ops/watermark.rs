//! Diagonal text stamp on every page

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::reader::{create_pdfium, load_document, map_pdfium_error};
use crate::source::{ensure_distinct, read_pdf, write_output};
use pdfium_render::prelude::*;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

const MAX_FONT_SIZE: f32 = 60.0;
const ANGLE_DEGREES: f32 = 45.0;
const GREY: u8 = 128;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct WatermarkResult {
    pub input_file: String,
    pub output_file: String,
    pub output_size: u64,
    pub page_count: u32,
}

/// Font size that keeps the stamp inside the page width
pub fn font_size_for(page_width: f32, text: &str) -> f32 {
    let chars = text.chars().count().max(1) as f32;
    (page_width / chars * 1.5).min(MAX_FONT_SIZE)
}

/// Stamp `text` across every page at 45 degrees, centred on the page.
///
/// `opacity` is the fill alpha in `[0, 1]`.
pub fn add_watermark(
    input: &Path,
    output: &Path,
    text: &str,
    opacity: f32,
) -> Result<WatermarkResult> {
    if text.trim().is_empty() {
        return Err(Error::invalid_input("Watermark text must not be empty"));
    }
    if !(0.0..=1.0).contains(&opacity) {
        return Err(Error::invalid_input(format!(
            "Opacity must be between 0 and 1, got {}",
            opacity
        )));
    }
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let pdfium = create_pdfium()?;
    let mut document = load_document(&pdfium, &data, None)?;
    let font = document.fonts_mut().helvetica_bold();
    let color = PdfColor::new(GREY, GREY, GREY, (opacity * 255.0).round() as u8);

    let (cos, sin) = {
        let radians = ANGLE_DEGREES.to_radians();
        (radians.cos(), radians.sin())
    };

    let mut page_count = 0u32;
    for mut page in document.pages().iter() {
        let width = page.width().value;
        let height = page.height().value;
        let size = font_size_for(width, text);

        let mut stamp = PdfPageTextObject::new(&document, text, font, PdfPoints::new(size))
            .map_err(map_pdfium_error)?;
        stamp.set_fill_color(color).map_err(map_pdfium_error)?;

        // Approximate Helvetica-Bold advance when bounds are not available yet
        let text_width = stamp
            .width()
            .map(|w| w.value)
            .unwrap_or(text.chars().count() as f32 * size * 0.6);

        // Baseline midpoint of the rotated text lands on the page centre
        stamp
            .rotate_counter_clockwise_degrees(ANGLE_DEGREES)
            .map_err(map_pdfium_error)?;
        stamp
            .translate(
                PdfPoints::new(width / 2.0 - text_width / 2.0 * cos),
                PdfPoints::new(height / 2.0 - text_width / 2.0 * sin),
            )
            .map_err(map_pdfium_error)?;

        page.objects_mut()
            .add_text_object(stamp)
            .map_err(map_pdfium_error)?;
        page_count += 1;
    }

    let bytes = document.save_to_bytes().map_err(|e| Error::Pdfium {
        reason: format!("Failed to save watermarked PDF: {}", e),
    })?;
    let output_size = write_output(output, &bytes)?;

    tracing::info!(pages = page_count, output = %output.display(), "watermarked");

    Ok(WatermarkResult {
        input_file: display(input),
        output_file: display(output),
        output_size,
        page_count,
    })
}
