//! Image XObject access through lopdf
//!
//! PDFium hands back rendered bitmaps; extraction and recompression need the
//! stored streams themselves, so those go through the object model directly.

use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;

/// Color models whose samples can be rebuilt into an `image` buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleModel {
    Rgb,
    Gray,
}

/// How an image's bytes are stored in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredEncoding {
    Raw,
    Flate,
    Jpeg,
    Jpeg2000,
    Other,
}

/// Decoded view of an image XObject dictionary
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub model: Option<SampleModel>,
    pub encoding: StoredEncoding,
    pub is_mask: bool,
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

fn name_of(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    match resolve(doc, obj)? {
        Object::Name(n) => Some(n.clone()),
        _ => None,
    }
}

fn int_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::Integer(n) => Some(*n),
        Object::Real(r) => Some(*r as i64),
        _ => None,
    }
}

fn filters(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) {
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(arr)) => arr.iter().filter_map(|f| name_of(doc, f)).collect(),
        _ => Vec::new(),
    }
}

/// Resources of a page, following inheritance through the page tree
fn page_resources<'a>(doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Some(res) = current.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
            return Some(res);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// XObject references of a resource dictionary, ordered by resource name
fn xobject_refs(doc: &Document, resources: &Dictionary) -> BTreeMap<Vec<u8>, ObjectId> {
    let mut refs = BTreeMap::new();
    if let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    {
        for (name, value) in xobjects.iter() {
            if let Object::Reference(id) = value {
                refs.insert(name.clone(), *id);
            }
        }
    }
    refs
}

fn collect_images(
    doc: &Document,
    obj_id: ObjectId,
    images: &mut Vec<ObjectId>,
    seen: &mut HashSet<ObjectId>,
) {
    if !seen.insert(obj_id) {
        return;
    }
    let Ok(Object::Stream(stream)) = doc.get_object(obj_id) else {
        return;
    };

    match stream.dict.get(b"Subtype").ok().and_then(|s| name_of(doc, s)).as_deref() {
        Some(b"Image") => images.push(obj_id),
        Some(b"Form") => {
            if let Some(res) = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|r| resolve_dict(doc, r))
            {
                for child in xobject_refs(doc, res).into_values() {
                    collect_images(doc, child, images, seen);
                }
            }
        }
        _ => {}
    }
}

/// Image XObjects drawn by a page, including those nested in form XObjects
pub fn page_image_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();
    if let Some(resources) = page_resources(doc, page_id) {
        for id in xobject_refs(doc, resources).into_values() {
            collect_images(doc, id, &mut images, &mut seen);
        }
    }
    images
}

/// Describe an image stream; `None` if the object is not an image
pub fn describe(doc: &Document, id: ObjectId) -> Option<ImageXObject> {
    let Ok(Object::Stream(stream)) = doc.get_object(id) else {
        return None;
    };
    let dict = &stream.dict;

    let encoding = match filters(doc, dict).as_slice() {
        [] => StoredEncoding::Raw,
        [f] if f.as_slice() == b"FlateDecode" => StoredEncoding::Flate,
        [f] if f.as_slice() == b"DCTDecode" => StoredEncoding::Jpeg,
        [f] if f.as_slice() == b"JPXDecode" => StoredEncoding::Jpeg2000,
        _ => StoredEncoding::Other,
    };

    let model = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| name_of(doc, cs))
        .and_then(|cs| match cs.as_slice() {
            b"DeviceRGB" => Some(SampleModel::Rgb),
            b"DeviceGray" => Some(SampleModel::Gray),
            _ => None,
        });

    let is_mask = matches!(
        dict.get(b"ImageMask").ok().and_then(|m| resolve(doc, m)),
        Some(Object::Boolean(true))
    );

    Some(ImageXObject {
        id,
        width: int_of(doc, dict, b"Width").unwrap_or(0).max(0) as u32,
        height: int_of(doc, dict, b"Height").unwrap_or(0).max(0) as u32,
        bits_per_component: int_of(doc, dict, b"BitsPerComponent").unwrap_or(8).max(0) as u32,
        model,
        encoding,
        is_mask,
    })
}

impl ImageXObject {
    /// Whether the samples can be rebuilt losslessly into an 8-bit buffer
    pub fn is_decodable(&self) -> bool {
        !self.is_mask
            && self.width > 0
            && self.height > 0
            && match self.encoding {
                StoredEncoding::Jpeg => true,
                StoredEncoding::Raw | StoredEncoding::Flate => {
                    self.model.is_some() && self.bits_per_component == 8
                }
                _ => false,
            }
    }
}

fn stream_of(doc: &Document, id: ObjectId) -> Result<&Stream> {
    match doc.get_object(id)? {
        Object::Stream(stream) => Ok(stream),
        _ => Err(Error::InvalidPdf {
            reason: format!("object {} {} is not a stream", id.0, id.1),
        }),
    }
}

/// Decode image samples into a bitmap
pub fn decode(doc: &Document, info: &ImageXObject) -> Result<DynamicImage> {
    let stream = stream_of(doc, info.id)?;

    let samples = match info.encoding {
        StoredEncoding::Jpeg => {
            return Ok(image::load_from_memory_with_format(
                &stream.content,
                ImageFormat::Jpeg,
            )?)
        }
        StoredEncoding::Flate => stream.decompressed_content()?,
        StoredEncoding::Raw => stream.content.clone(),
        _ => {
            return Err(Error::invalid_input("unsupported image filter"));
        }
    };

    if info.bits_per_component != 8 {
        return Err(Error::invalid_input(format!(
            "unsupported bits per component: {}",
            info.bits_per_component
        )));
    }

    let pixels = info.width as usize * info.height as usize;
    let bitmap = match info.model {
        Some(SampleModel::Rgb) if samples.len() >= pixels * 3 => {
            RgbImage::from_raw(info.width, info.height, samples[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        Some(SampleModel::Gray) if samples.len() >= pixels => {
            GrayImage::from_raw(info.width, info.height, samples[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => None,
    };

    bitmap.ok_or_else(|| {
        Error::invalid_input(format!(
            "image samples do not match {}x{} {:?}",
            info.width, info.height, info.model
        ))
    })
}

/// Bytes and file extension for saving an image to disk.
///
/// JPEG data is written as stored. Raw and Flate samples become PNG. Anything
/// that cannot be interpreted is written verbatim with a `bin` extension.
pub fn export(doc: &Document, info: &ImageXObject) -> Result<(Vec<u8>, &'static str)> {
    let stream = stream_of(doc, info.id)?;

    match info.encoding {
        StoredEncoding::Jpeg => {
            let ext = match image::guess_format(&stream.content) {
                Ok(ImageFormat::Jpeg) => "jpeg",
                _ => "bin",
            };
            return Ok((stream.content.clone(), ext));
        }
        StoredEncoding::Jpeg2000 => return Ok((stream.content.clone(), "jpx")),
        _ => {}
    }

    match decode(doc, info) {
        Ok(bitmap) => {
            let mut png = Vec::new();
            bitmap.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            Ok((png, "png"))
        }
        Err(e) => {
            tracing::debug!(object = ?info.id, error = %e, "image kept in stored form");
            Ok((stream.content.clone(), "bin"))
        }
    }
}

/// Downscale by `scale` and encode as a JPEG image XObject.
///
/// The returned stream keeps every dictionary entry of `original` except the
/// ones describing the sample encoding.
pub fn jpeg_stream(
    original: &Dictionary,
    bitmap: &DynamicImage,
    quality: u8,
    scale: f32,
) -> Result<Stream> {
    let bitmap = if scale < 1.0 {
        let width = ((bitmap.width() as f32 * scale).round() as u32).max(1);
        let height = ((bitmap.height() as f32 * scale).round() as u32).max(1);
        bitmap.resize_exact(width, height, FilterType::Triangle)
    } else {
        bitmap.clone()
    };

    let mut jpeg = Vec::new();
    let color_space: &str = match &bitmap {
        DynamicImage::ImageLuma8(gray) => {
            gray.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))?;
            "DeviceGray"
        }
        other => {
            other
                .to_rgb8()
                .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))?;
            "DeviceRGB"
        }
    };

    let mut dict = original.clone();
    dict.remove(b"DecodeParms");
    dict.remove(b"Length");
    dict.set("Width", bitmap.width() as i64);
    dict.set("Height", bitmap.height() as i64);
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", 8);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    Ok(Stream::new(dict, jpeg).with_compression(false))
}
