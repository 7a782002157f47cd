//! In-memory PDF fixtures for unit tests

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

/// Text placed at (x, y) in points on a US Letter page
pub type TextRun = (i64, i64, String);

/// Embedded image kinds the fixtures can produce
#[derive(Debug, Clone, Copy)]
pub enum FixtureImage {
    /// 8-bit DeviceRGB, Flate compressed
    FlateRgb,
    /// 8-bit DeviceGray, uncompressed
    RawGray,
    /// Baseline JPEG (DCTDecode)
    Jpeg,
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn image_stream(kind: FixtureImage) -> Stream {
    let (width, height) = (96u32, 64u32);
    let rgb = gradient(width, height);
    match kind {
        FixtureImage::FlateRgb => {
            let mut stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                rgb.into_raw(),
            );
            stream.compress().unwrap();
            stream
        }
        FixtureImage::RawGray => {
            let gray = DynamicImage::ImageRgb8(rgb).to_luma8();
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                gray.into_raw(),
            )
            .with_compression(false)
        }
        FixtureImage::Jpeg => {
            let mut jpeg = Vec::new();
            DynamicImage::ImageRgb8(rgb)
                .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
                .unwrap();
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg,
            )
            .with_compression(false)
        }
    }
}

/// Build a document where each entry describes one page's text runs and images
pub fn build_pdf(pages: &[(Vec<TextRun>, Vec<FixtureImage>)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for (runs, images) in pages {
        let mut content = String::new();
        for (x, y, text) in runs {
            content.push_str(&format!("BT /F1 12 Tf {} {} Td ({}) Tj ET\n", x, y, text));
        }

        let mut xobjects = lopdf::Dictionary::new();
        for (i, kind) in images.iter().enumerate() {
            let name = format!("Im{}", i + 1);
            let image_id = doc.add_object(image_stream(*kind));
            xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
            content.push_str(&format!(
                "q 96 0 0 64 {} {} cm /{} Do Q\n",
                72 + (i as i64) * 120,
                400,
                name
            ));
        }

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// `n` pages, each carrying the line "Page i"
pub fn sample_pdf(n: u32) -> Vec<u8> {
    let pages: Vec<_> = (1..=n)
        .map(|i| (vec![(72, 700, format!("Page {}", i))], Vec::new()))
        .collect();
    build_pdf(&pages)
}

/// Two pages: RGB and JPEG images on the first, a gray image on the second
pub fn pdf_with_images() -> Vec<u8> {
    build_pdf(&[
        (
            vec![(72, 700, "Photos".to_string())],
            vec![FixtureImage::FlateRgb, FixtureImage::Jpeg],
        ),
        (Vec::new(), vec![FixtureImage::RawGray]),
    ])
}

/// Point `startxref` past the end of the file so the xref must be rebuilt
pub fn with_broken_startxref(data: &[u8]) -> Vec<u8> {
    let marker = b"startxref";
    let at = data
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("fixture has a startxref");
    let mut broken = data[..at].to_vec();
    broken.extend_from_slice(b"startxref\n999999999\n%%EOF\n");
    broken
}

/// Owner-password protected copy that opens without a user password
pub fn owner_only(data: &[u8]) -> Vec<u8> {
    crate::pdf::QpdfWrapper::encrypt(data, "", Some("owner")).expect("encrypt fixture")
}
