//! Raster extraction of image XObjects.

use std::collections::HashSet;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::RasterImage;

/// Enumerate the image XObjects of a resource dictionary.
///
/// Form XObjects are searched recursively through their own resources.
/// Every image yields one entry, in resource order, so a failed image
/// still occupies its index. An XObject referenced more than once is
/// reported once.
pub fn page_images(doc: &LopdfDocument, resources: &Dictionary) -> Vec<Result<RasterImage>> {
    let mut images = Vec::new();
    let mut visited = HashSet::new();
    collect_images(doc, resources, &mut visited, &mut images);
    images
}

fn collect_images(
    doc: &LopdfDocument,
    resources: &Dictionary,
    visited: &mut HashSet<ObjectId>,
    images: &mut Vec<Result<RasterImage>>,
) {
    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => match resolve_dict(doc, obj) {
            Some(dict) => dict,
            None => return,
        },
        Err(_) => return,
    };

    for (name, obj) in xobjects.iter() {
        let stream = match obj {
            Object::Reference(id) => {
                if !visited.insert(*id) {
                    continue;
                }
                match stream_at(doc, *id) {
                    Ok(stream) => stream,
                    Err(e) => {
                        images.push(Err(e));
                        continue;
                    }
                }
            }
            Object::Stream(stream) => stream,
            _ => continue,
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok());
        match subtype {
            Some("Image") => {
                log::trace!("Extracting image XObject /{}", String::from_utf8_lossy(name));
                images.push(extract_image(doc, stream));
            }
            Some("Form") => {
                let nested = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r));
                if let Some(nested) = nested {
                    collect_images(doc, nested, visited, images);
                }
            }
            _ => {}
        }
    }
}

fn stream_at(doc: &LopdfDocument, id: ObjectId) -> Result<&Stream> {
    match doc.get_object(id) {
        Ok(Object::Stream(stream)) => Ok(stream),
        Ok(_) => Err(Error::ImageExtract(format!("object {:?} is not a stream", id))),
        Err(e) => Err(Error::ImageExtract(e.to_string())),
    }
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Convert one image XObject stream into an encoded raster.
pub fn extract_image(doc: &LopdfDocument, stream: &Stream) -> Result<RasterImage> {
    let dict = &stream.dict;

    let width = dict
        .get(b"Width")
        .ok()
        .and_then(|w| w.as_i64().ok())
        .map(|w| w as u32);

    let height = dict
        .get(b"Height")
        .ok()
        .and_then(|h| h.as_i64().ok())
        .map(|h| h as u32);

    let filters = filter_names(dict);
    let last = filters.last().map(String::as_str).unwrap_or("");

    let mut image = match (last, filters.len()) {
        ("DCTDecode", 1) => RasterImage::new(stream.content.clone(), "jpg"),
        ("JPXDecode", 1) => RasterImage::new(stream.content.clone(), "jp2"),
        ("", _) => encode_png(doc, dict, &stream.content, width, height)?,
        ("FlateDecode", _) | ("LZWDecode", _) => {
            let decoded = stream
                .decompressed_content()
                .map_err(|e| Error::ImageExtract(format!("decompression failed: {}", e)))?;
            encode_png(doc, dict, &decoded, width, height)?
        }
        _ => {
            return Err(Error::ImageExtract(format!(
                "unsupported filter chain {:?}",
                filters
            )))
        }
    };

    image.width = width;
    image.height = height;
    Ok(image)
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name_str().ok())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Number of colour components for the supported colour spaces.
fn components(doc: &LopdfDocument, dict: &Dictionary) -> Option<u32> {
    let cs = dict.get(b"ColorSpace").ok()?;
    let cs = match cs {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    match cs {
        Object::Name(name) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Some(3),
            b"DeviceGray" | b"CalGray" => Some(1),
            _ => None,
        },
        Object::Array(items) => {
            // [/ICCBased <stream>] carries its component count as /N
            if items.first().and_then(|o| o.as_name_str().ok()) != Some("ICCBased") {
                return None;
            }
            let id = items.get(1)?.as_reference().ok()?;
            let profile = stream_at(doc, id).ok()?;
            match profile.dict.get(b"N").ok()?.as_i64().ok()? {
                1 => Some(1),
                3 => Some(3),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Encode 8-bit Gray or RGB samples as PNG.
fn encode_png(
    doc: &LopdfDocument,
    dict: &Dictionary,
    samples: &[u8],
    width: Option<u32>,
    height: Option<u32>,
) -> Result<RasterImage> {
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(Error::ImageExtract("missing image dimensions".to_string())),
    };

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return Err(Error::ImageExtract(format!(
            "unsupported bits per component: {}",
            bits
        )));
    }

    let (color, comps) = match components(doc, dict) {
        Some(1) => (ColorType::L8, 1u64),
        Some(3) => (ColorType::Rgb8, 3u64),
        _ => {
            return Err(Error::ImageExtract(
                "unsupported color space".to_string(),
            ))
        }
    };

    let expected = width as u64 * height as u64 * comps;
    if (samples.len() as u64) < expected {
        return Err(Error::ImageExtract(format!(
            "expected {} sample bytes, found {}",
            expected,
            samples.len()
        )));
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&samples[..expected as usize], width, height, color)
        .map_err(|e| Error::ImageExtract(e.to_string()))?;

    Ok(RasterImage::new(png, "png"))
}
