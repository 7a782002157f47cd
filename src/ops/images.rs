//! Save embedded images to disk

use crate::error::Result;
use crate::ops::display;
use crate::pdf::{xobject, PageSelection, QpdfWrapper};
use crate::source::{prepare_dir, read_pdf, write_output};
use lopdf::Document;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ImageExtraction {
    pub output_dir: String,
    pub image_count: u32,
    pub image_paths: Vec<String>,
    pub total_size: u64,
}

/// Images from every page
pub fn extract_all_images(input: &Path, output_dir: &Path) -> Result<ImageExtraction> {
    extract(input, output_dir, None)
}

/// Images from the selected pages; indices past the end are ignored
pub fn extract_page_images(
    input: &Path,
    output_dir: &Path,
    selection: &PageSelection,
) -> Result<ImageExtraction> {
    extract(input, output_dir, Some(selection))
}

fn extract(
    input: &Path,
    output_dir: &Path,
    selection: Option<&PageSelection>,
) -> Result<ImageExtraction> {
    let data = read_pdf(input)?;
    let doc = Document::load_mem(&QpdfWrapper::normalize(&data)?)?;
    prepare_dir(output_dir)?;

    let mut image_paths = Vec::new();
    let mut total_size = 0u64;

    // get_pages is keyed by 1-based page number
    for (page_number, page_id) in doc.get_pages() {
        if let Some(selection) = selection {
            if !selection.contains(page_number - 1) {
                continue;
            }
        }

        let mut index = 0;
        for id in xobject::page_image_ids(&doc, page_id) {
            let Some(info) = xobject::describe(&doc, id) else {
                continue;
            };
            let (bytes, ext) = match xobject::export(&doc, &info) {
                Ok(exported) => exported,
                Err(e) => {
                    tracing::warn!(page = page_number, object = ?id, error = %e, "skipping image");
                    continue;
                }
            };

            index += 1;
            let path = output_dir.join(format!("page_{}_image_{}.{}", page_number, index, ext));
            total_size += write_output(&path, &bytes)?;
            image_paths.push(display(&path));
        }
    }

    tracing::info!(
        images = image_paths.len(),
        bytes = total_size,
        dir = %output_dir.display(),
        "images extracted"
    );

    Ok(ImageExtraction {
        output_dir: display(output_dir),
        image_count: image_paths.len() as u32,
        image_paths,
        total_size,
    })
}
