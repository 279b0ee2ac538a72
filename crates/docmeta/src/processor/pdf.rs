use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use fax::{decoder, Color};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::ProcessError;
use crate::processor::image::{
    decode_encoded, from_raw_samples, ColorModel, ImageOrigin, RasterImage, SampleLayout,
};
use crate::processor::{DocumentFormat, DocumentProcessor, ExtractedContent};
use crate::sanitize;

/// Form XObjects nested deeper than this are not searched for images.
const MAX_FORM_DEPTH: usize = 8;

pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for PdfProcessor {
    fn process(&self, path: &Path) -> Result<ExtractedContent, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let pdf_bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = match Document::load_mem(&pdf_bytes) {
            Ok(doc) => doc,
            Err(e) => {
                // Neither pass can run without a parsed document.
                tracing::warn!(
                    "lopdf failed to parse {}: {}. Returning empty extraction.",
                    sanitize::redact_path(path),
                    e
                );
                return Ok(ExtractedContent::default());
            }
        };

        let text = extract_text_layer(&doc);
        let images = extract_page_images(&doc);

        tracing::debug!(
            pages = doc.get_pages().len(),
            images = images.len(),
            text_chars = text.chars().count(),
            "PDF extraction finished"
        );

        Ok(ExtractedContent { text, images })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

/// Reads the embedded text of every page, joined by newlines.
///
/// A page whose text cannot be extracted contributes an empty line.
fn extract_text_layer(doc: &Document) -> String {
    doc.get_pages()
        .keys()
        .map(|&page_num| match doc.extract_text(&[page_num]) {
            Ok(page_text) => page_text,
            Err(e) => {
                tracing::debug!("No text layer on page {}: {}", page_num, e);
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collects every decodable image XObject, page by page.
fn extract_page_images(doc: &Document) -> Vec<RasterImage> {
    let mut images = Vec::new();

    for (page_num, page_id) in doc.get_pages() {
        let Some(resources) = page_resources(doc, page_id) else {
            continue;
        };

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        collect_image_xobjects(doc, resources, 0, &mut seen, &mut found);

        for (name, stream) in found {
            match decode_image_xobject(doc, stream) {
                Ok(pixels) => images.push(RasterImage::new(
                    pixels,
                    ImageOrigin::PdfXObject {
                        page: page_num,
                        name,
                    },
                )),
                Err(e) => {
                    tracing::warn!("Skipping image /{} on page {}: {}", name, page_num, e);
                }
            }
        }
    }

    images
}

/// Follows a reference to the object it points at; direct objects pass through.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Finds the resource dictionary of a page, walking up the page tree for
/// inherited resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let mut visited = HashSet::new();

    loop {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(doc, resources);
        }

        let parent_id = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        if !visited.insert(parent_id) {
            return None;
        }
        node = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
}

fn name_is(obj: Option<&Object>, expected: &[u8]) -> bool {
    matches!(obj, Some(Object::Name(name)) if name.as_slice() == expected)
}

/// Walks `/XObject` entries in declaration order, descending into form XObjects.
fn collect_image_xobjects<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    found: &mut Vec<(String, &'a Stream)>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return;
    };

    for (name, entry) in xobjects.iter() {
        if let Object::Reference(id) = entry {
            if !seen.insert(*id) {
                continue;
            }
        }

        let Some(Object::Stream(stream)) = resolve(doc, entry) else {
            continue;
        };

        let subtype = stream.dict.get(b"Subtype").ok().and_then(|s| resolve(doc, s));
        if name_is(subtype, b"Image") {
            found.push((String::from_utf8_lossy(name).into_owned(), stream));
        } else if name_is(subtype, b"Form") && depth < MAX_FORM_DEPTH {
            if let Some(form_resources) = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|obj| resolve_dict(doc, obj))
            {
                collect_image_xobjects(doc, form_resources, depth + 1, seen, found);
            }
        }
    }
}

fn stream_filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Filters that produce an image rather than a byte stream. Only the last
/// filter of a chain may be one of these.
fn is_image_filter(filter: &[u8]) -> bool {
    matches!(
        filter,
        b"DCTDecode" | b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode"
    )
}

/// The `/DecodeParms` entry for the filter at `index`.
fn decode_parms<'a>(
    doc: &'a Document,
    stream: &'a Stream,
    index: usize,
) -> Option<&'a Dictionary> {
    match resolve(doc, stream.dict.get(b"DecodeParms").ok()?)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Array(items) => resolve_dict(doc, items.get(index)?),
        _ => None,
    }
}

fn dict_integer(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key).ok()? {
        Object::Integer(value) => Some(*value),
        Object::Real(value) => Some(*value as i64),
        _ => None,
    }
}

fn dict_bool(dict: &Dictionary, key: &[u8]) -> bool {
    matches!(dict.get(key), Ok(Object::Boolean(true)))
}

fn unsupported_color_space(name: &[u8]) -> ProcessError {
    ProcessError::ImageDecode(format!(
        "Unsupported color space /{}",
        String::from_utf8_lossy(name)
    ))
}

/// Parses an image color space: a device name or a family array.
fn color_model(doc: &Document, obj: &Object) -> Result<ColorModel, ProcessError> {
    match resolve(doc, obj) {
        Some(Object::Name(name)) => match name.as_slice() {
            b"DeviceRGB" | b"CalRGB" => Ok(ColorModel::Rgb),
            b"DeviceGray" | b"CalGray" => Ok(ColorModel::Gray),
            b"DeviceCMYK" => Ok(ColorModel::Cmyk),
            other => Err(unsupported_color_space(other)),
        },
        Some(Object::Array(items)) => {
            let Some(Object::Name(family)) = items.first() else {
                return Err(ProcessError::ImageDecode("Malformed color space".into()));
            };
            match family.as_slice() {
                b"ICCBased" => {
                    let profile = items
                        .get(1)
                        .and_then(|obj| resolve_dict(doc, obj))
                        .and_then(|dict| dict_integer(dict, b"N"));
                    match profile {
                        Some(1) => Ok(ColorModel::Gray),
                        Some(3) => Ok(ColorModel::Rgb),
                        Some(4) => Ok(ColorModel::Cmyk),
                        Some(n) => Err(ProcessError::ImageDecode(format!(
                            "Unsupported ICC component count {}",
                            n
                        ))),
                        None => Err(ProcessError::ImageDecode("ICC profile without /N".into())),
                    }
                }
                b"Indexed" | b"I" => indexed_color_model(doc, items),
                b"DeviceRGB" | b"CalRGB" | b"DeviceGray" | b"CalGray" | b"DeviceCMYK" => {
                    color_model(doc, &items[0])
                }
                other => Err(unsupported_color_space(other)),
            }
        }
        _ => Err(ProcessError::ImageDecode("Missing color space".into())),
    }
}

/// `[/Indexed base hival lookup]`, where the lookup table is a string or a stream.
fn indexed_color_model(doc: &Document, items: &[Object]) -> Result<ColorModel, ProcessError> {
    let [_, base, hival, lookup, ..] = items else {
        return Err(ProcessError::ImageDecode("Indexed color space too short".into()));
    };

    let base = color_model(doc, base)?;
    if matches!(base, ColorModel::Indexed { .. }) {
        return Err(ProcessError::ImageDecode("Nested indexed color space".into()));
    }
    let hival = match resolve(doc, hival) {
        Some(Object::Integer(n)) => (*n).clamp(0, 255) as usize,
        _ => return Err(ProcessError::ImageDecode("Indexed color space without hival".into())),
    };
    let mut palette = match resolve(doc, lookup) {
        Some(Object::String(bytes, _)) => bytes.clone(),
        Some(Object::Stream(stream)) => stream
            .get_plain_content()
            .map_err(|e| ProcessError::ImageDecode(format!("Unreadable palette: {}", e)))?,
        _ => return Err(ProcessError::ImageDecode("Indexed color space without lookup".into())),
    };
    palette.truncate((hival + 1) * base.components());

    Ok(ColorModel::Indexed {
        base: Box::new(base),
        palette,
    })
}

/// Reads the dimensions, depth, color space and `/Decode` array of an image.
fn sample_layout(doc: &Document, stream: &Stream) -> Result<SampleLayout, ProcessError> {
    let width = dict_integer(&stream.dict, b"Width")
        .ok_or_else(|| ProcessError::ImageDecode("Missing /Width".into()))?;
    let height = dict_integer(&stream.dict, b"Height")
        .ok_or_else(|| ProcessError::ImageDecode("Missing /Height".into()))?;
    let width = u32::try_from(width)
        .map_err(|_| ProcessError::ImageDecode(format!("Invalid /Width {}", width)))?;
    let height = u32::try_from(height)
        .map_err(|_| ProcessError::ImageDecode(format!("Invalid /Height {}", height)))?;

    // A stencil mask is 1-bit where 0 paints, which reads as black on white.
    let (color, bits) = if dict_bool(&stream.dict, b"ImageMask") {
        (ColorModel::Gray, 1)
    } else {
        let color_space = stream
            .dict
            .get(b"ColorSpace")
            .map_err(|_| ProcessError::ImageDecode("Missing color space".into()))?;
        let bits = dict_integer(&stream.dict, b"BitsPerComponent").unwrap_or(8);
        let bits = u8::try_from(bits)
            .map_err(|_| ProcessError::ImageDecode(format!("Invalid /BitsPerComponent {}", bits)))?;
        (color_model(doc, color_space)?, bits)
    };

    let mut layout = SampleLayout::new(width, height, color, bits);
    let decode = stream.dict.get(b"Decode").ok().and_then(|d| resolve(doc, d));
    if let Some(Object::Array(items)) = decode {
        let decode: Vec<f32> = items
            .iter()
            .filter_map(|item| match item {
                Object::Integer(value) => Some(*value as f32),
                Object::Real(value) => Some(*value as f32),
                _ => None,
            })
            .collect();
        if decode.len() >= 2 * layout.color.components() {
            layout = layout.with_decode(decode);
        }
    }
    Ok(layout)
}

fn decode_image_xobject(
    doc: &Document,
    stream: &Stream,
) -> Result<image::RgbImage, ProcessError> {
    let filters = stream_filters(stream);
    let (image_filter, byte_filters) = match filters.split_last() {
        Some((last, rest)) if is_image_filter(last) => (Some(last.as_slice()), rest),
        _ => (None, filters.as_slice()),
    };
    if let Some(misplaced) = byte_filters.iter().find(|f| is_image_filter(f)) {
        return Err(ProcessError::ImageDecode(format!(
            "/{} must be the last filter",
            String::from_utf8_lossy(misplaced)
        )));
    }

    let data = if byte_filters.is_empty() {
        Cow::Borrowed(stream.content.as_slice())
    } else {
        Cow::Owned(apply_byte_filters(doc, stream, byte_filters, image_filter.is_some())?)
    };

    match image_filter {
        None => from_raw_samples(&data, &sample_layout(doc, stream)?),
        Some(b"DCTDecode") => decode_encoded(&data),
        Some(b"CCITTFaxDecode") => {
            // Fax data is always one bit per pixel.
            let layout = SampleLayout {
                bits_per_component: 1,
                ..sample_layout(doc, stream)?
            };
            let parms = decode_parms(doc, stream, byte_filters.len());
            let params = CcittParams::read(parms, &layout);
            let packed = decode_ccitt(&data, &params, layout.width)?;
            from_raw_samples(&packed, &layout)
        }
        Some(other) => Err(ProcessError::ImageDecode(format!(
            "/{} images are not supported",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Undoes the general-purpose filters ahead of the image data.
fn apply_byte_filters(
    doc: &Document,
    stream: &Stream,
    filters: &[Vec<u8>],
    chained: bool,
) -> Result<Vec<u8>, ProcessError> {
    let decoded = if chained {
        let mut dict = stream.dict.clone();
        dict.set(
            "Filter",
            Object::Array(filters.iter().map(|f| Object::Name(f.clone())).collect()),
        );
        match decode_parms(doc, stream, 0) {
            Some(params) => dict.set("DecodeParms", Object::Dictionary(params.clone())),
            None => {
                dict.remove(b"DecodeParms");
            }
        }
        Stream::new(dict, stream.content.clone()).decompressed_content()
    } else {
        stream.decompressed_content()
    };

    decoded.map_err(|e| {
        ProcessError::ImageDecode(format!(
            "{} failed: {}",
            filters
                .iter()
                .map(|f| String::from_utf8_lossy(f).into_owned())
                .collect::<Vec<_>>()
                .join("+"),
            e
        ))
    })
}

/// `/DecodeParms` of a CCITTFaxDecode filter.
#[derive(Debug, Clone, PartialEq)]
struct CcittParams {
    /// Negative: Group 4. Zero: Group 3 one-dimensional. Positive: mixed Group 3.
    k: i64,
    columns: u16,
    rows: u16,
    black_is_1: bool,
}

impl CcittParams {
    fn read(params: Option<&Dictionary>, layout: &SampleLayout) -> Self {
        let dims = |value: Option<i64>, fallback: u32| {
            value
                .filter(|v| *v > 0)
                .map(|v| v.min(u16::MAX as i64) as u16)
                .unwrap_or(fallback.min(u16::MAX as u32) as u16)
        };
        Self {
            k: params.and_then(|p| dict_integer(p, b"K")).unwrap_or(0),
            columns: dims(params.and_then(|p| dict_integer(p, b"Columns")), 1728),
            rows: dims(params.and_then(|p| dict_integer(p, b"Rows")), layout.height),
            black_is_1: params.is_some_and(|p| dict_bool(p, b"BlackIs1")),
        }
    }
}

/// Decodes CCITT fax data into 1-bit rows of `width` pixels.
///
/// Black pixels become 0 bits unless `/BlackIs1` is set, so the usual gray
/// mapping applies afterwards.
fn decode_ccitt(data: &[u8], params: &CcittParams, width: u32) -> Result<Vec<u8>, ProcessError> {
    let row_bytes = (width as usize).div_ceil(8);
    let mut packed = Vec::with_capacity(row_bytes * params.rows as usize);
    let mut rows = 0u16;

    let mut emit_row = |transitions: &[u16]| {
        if rows >= params.rows {
            return;
        }
        rows += 1;
        let fill = if params.black_is_1 { 0x00 } else { 0xFF };
        let start = packed.len();
        packed.resize(start + row_bytes, fill);
        let row = &mut packed[start..];
        for (x, color) in decoder::pels(transitions, params.columns)
            .take(width as usize)
            .enumerate()
        {
            if color == Color::Black {
                row[x / 8] ^= 0x80 >> (x % 8);
            }
        }
    };

    let decoded = if params.k < 0 {
        let height = Some(params.rows);
        decoder::decode_g4(data.iter().copied(), params.columns, height, &mut emit_row)
    } else if params.k == 0 {
        decoder::decode_g3(data.iter().copied(), &mut emit_row)
    } else {
        return Err(ProcessError::ImageDecode(format!(
            "Mixed CCITT Group 3 (K={}) is not supported",
            params.k
        )));
    };

    if decoded.is_none() && rows == 0 {
        return Err(ProcessError::ImageDecode("CCITT fax data could not be decoded".into()));
    }
    if rows < params.rows {
        tracing::debug!("CCITT data ended after {} of {} rows", rows, params.rows);
    }

    // Missing rows stay white.
    let white = if params.black_is_1 { 0x00 } else { 0xFF };
    packed.resize(row_bytes * params.rows as usize, white);
    Ok(packed)
}
