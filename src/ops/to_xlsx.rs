//! Detected tables to spreadsheet sheets

use crate::error::Result;
use crate::ops::display;
use crate::pdf::reader::{create_pdfium, get_page, load_document, page_count, page_layout};
use crate::source::{ensure_distinct, read_pdf, write_output};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

const EMPTY_SHEET: &str = "No Tables Found";
const EMPTY_NOTE: &str = "No tables detected in PDF";

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct XlsxConversion {
    pub input_file: String,
    pub output_file: String,
    pub output_size: u64,
    pub table_count: u32,
}

/// One sheet per detected table, named `Page{p}_Table{t}`.
///
/// Unless `extract_all_pages` is set, pages after the first one with tables
/// are not examined.
pub fn convert_to_xlsx(
    input: &Path,
    output: &Path,
    extract_all_pages: bool,
) -> Result<XlsxConversion> {
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, &data, None)?;

    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    let mut workbook = Workbook::new();
    let mut table_count = 0u32;

    for index in 0..page_count(&document) {
        let page = get_page(&document, index)?;
        let tables = page_layout(&page).tables();
        if tables.is_empty() {
            continue;
        }

        for (t, rows) in tables.iter().enumerate() {
            table_count += 1;
            let sheet = workbook.add_worksheet();
            sheet.set_name(format!("Page{}_Table{}", index + 1, t + 1))?;

            for (r, cells) in rows.iter().enumerate() {
                for (c, cell) in cells.iter().enumerate() {
                    if r == 0 {
                        sheet.write_string_with_format(0, c as u16, cell, &header)?;
                    } else {
                        sheet.write_string(r as u32, c as u16, cell)?;
                    }
                }
            }
        }

        if !extract_all_pages {
            break;
        }
    }

    if table_count == 0 {
        let sheet = workbook.add_worksheet();
        sheet.set_name(EMPTY_SHEET)?;
        sheet.write_string(0, 0, EMPTY_NOTE)?;
    }

    let bytes = workbook.save_to_buffer()?;
    let output_size = write_output(output, &bytes)?;

    tracing::info!(tables = table_count, output = %output.display(), "converted to xlsx");

    Ok(XlsxConversion {
        input_file: display(input),
        output_file: display(output),
        output_size,
        table_count,
    })
}
