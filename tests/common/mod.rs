//! Fixture PDFs built on the fly with lopdf

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// Content of one fixture page
#[derive(Default, Clone)]
pub struct PageFixture {
    pub lines: Vec<String>,
    /// Width and height of an uncompressed gray image drawn on the page
    pub gray_image: Option<(u32, u32)>,
}

impl PageFixture {
    pub fn text(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            gray_image: None,
        }
    }

    pub fn with_image(mut self, width: u32, height: u32) -> Self {
        self.gray_image = Some((width, height));
        self
    }
}

pub fn build(pages: &[PageFixture]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for fixture in pages {
        let mut ops = String::new();
        for (i, line) in fixture.lines.iter().enumerate() {
            ops.push_str(&format!(
                "BT /F1 14 Tf 72 {} Td ({}) Tj ET\n",
                720 - i as i64 * 20,
                line
            ));
        }

        let mut xobjects = lopdf::Dictionary::new();
        if let Some((w, h)) = fixture.gray_image {
            let samples: Vec<u8> = (0..w * h).map(|i| (i % 251) as u8).collect();
            let image_id = doc.add_object(
                Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => w as i64,
                        "Height" => h as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    samples,
                )
                .with_compression(false),
            );
            xobjects.set("Gray", Object::Reference(image_id));
            ops.push_str(&format!("q {} 0 0 {} 72 300 cm /Gray Do Q\n", w, h));
        }

        let contents = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));
        let page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => contents,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize fixture");
    out
}

/// `n` pages labelled "Page 1" .. "Page n"
pub fn numbered(n: u32) -> Vec<u8> {
    let pages: Vec<PageFixture> = (1..=n).map(|i| PageFixture::text(format!("Page {}", i))).collect();
    build(&pages)
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}

/// Page count as seen by the lenient reader
pub fn page_count(path: &Path) -> u32 {
    akupdf::ops::get_pdf_info(path)
        .expect("open output")
        .total_pages
}

/// The "Page N" label drawn on each page, in page order
pub fn page_labels(path: &Path) -> Vec<u32> {
    let data = std::fs::read(path).expect("read output");
    let plain = akupdf::pdf::QpdfWrapper::normalize(&data).expect("normalize output");
    let doc = Document::load_mem(&plain).expect("parse output");

    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("page content");
            let text = String::from_utf8_lossy(&content);
            let start = text.find("(Page ").expect("page label") + "(Page ".len();
            let digits: String = text[start..].chars().take_while(char::is_ascii_digit).collect();
            digits.parse().expect("label number")
        })
        .collect()
}

pub fn pdfium_or_skip() -> bool {
    if akupdf::pdf::pdfium_available() {
        true
    } else {
        eprintln!("Skipping: PDFium not available");
        false
    }
}
