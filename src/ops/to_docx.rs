//! Rebuild page text as a Word document

use crate::error::{Error, Result};
use crate::ops::display;
use crate::pdf::reader::{create_pdfium, get_page, load_document, page_count, page_layout};
use crate::pdf::Block;
use crate::source::{ensure_distinct, read_pdf, write_output};
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use schemars::JsonSchema;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

/// 11pt, in the half-points docx uses
const BODY_SIZE: usize = 22;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DocxConversion {
    pub input_file: String,
    pub output_file: String,
    pub output_size: u64,
    /// Pages converted
    pub page_count: u32,
    pub table_count: u32,
}

fn paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text).size(BODY_SIZE))
}

fn table(rows: &[Vec<String>]) -> Table {
    Table::new(
        rows.iter()
            .map(|cells| {
                TableRow::new(
                    cells
                        .iter()
                        .map(|cell| TableCell::new().add_paragraph(paragraph(cell)))
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Convert pages `[start_page, end_page)` (0-based) to DOCX.
///
/// `end_page` of `None` means through the last page; an end past the last
/// page is clamped. With `detect_tables`, aligned multi-column runs become
/// tables instead of paragraphs.
pub fn convert_to_docx(
    input: &Path,
    output: &Path,
    start_page: u32,
    end_page: Option<u32>,
    detect_tables: bool,
) -> Result<DocxConversion> {
    ensure_distinct(output, &[input])?;

    let data = read_pdf(input)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, &data, None)?;
    let total = page_count(&document);

    let end = end_page.unwrap_or(total).min(total);
    if start_page >= end {
        return Err(Error::invalid_input(format!(
            "Page range {}..{} selects nothing (document has {} pages)",
            start_page, end, total
        )));
    }

    let mut docx = Docx::new();
    let mut table_count = 0u32;

    for index in start_page..end {
        let page = get_page(&document, index)?;
        let layout = page_layout(&page);

        if detect_tables {
            for block in layout.blocks() {
                match block {
                    Block::Line(text) => docx = docx.add_paragraph(paragraph(&text)),
                    Block::Table(rows) => {
                        table_count += 1;
                        docx = docx.add_table(table(&rows));
                    }
                }
            }
        } else {
            for line in layout.lines.iter().filter(|l| !l.is_blank()) {
                docx = docx.add_paragraph(paragraph(&line.text(layout.thresholds.word_gap)));
            }
        }
    }

    let mut buf = Vec::new();
    docx.build()
        .pack(Cursor::new(&mut buf))
        .map_err(|e| Error::Docx {
            reason: e.to_string(),
        })?;
    let output_size = write_output(output, &buf)?;

    tracing::info!(
        pages = end - start_page,
        tables = table_count,
        output = %output.display(),
        "converted to docx"
    );

    Ok(DocxConversion {
        input_file: display(input),
        output_file: display(output),
        output_size,
        page_count: end - start_page,
        table_count,
    })
}
