//! In-memory document fixtures for unit tests.

use std::io::{Cursor, Write};

use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const HYPERLINK_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 17 % 256) as u8, (y * 29 % 256) as u8, 128])
    })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .unwrap();
    data
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Jpeg)
        .unwrap();
    data
}

/// An image XObject placed on a fixture page.
pub enum PdfImage {
    Jpeg { width: u32, height: u32 },
    RawRgb { width: u32, height: u32 },
    FlateGray { width: u32, height: u32 },
    /// Declares DCTDecode but carries garbage.
    Corrupt,
    /// A hand-built image XObject.
    Custom(Stream),
}

#[derive(Default)]
pub struct PdfPage {
    pub text: Option<&'static str>,
    pub images: Vec<PdfImage>,
    /// Point /Contents at an object that does not exist.
    pub dangling_contents: bool,
}

fn image_stream(image: &PdfImage) -> Stream {
    match image {
        PdfImage::Jpeg { width, height } => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => *width as i64,
                "Height" => *height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_bytes(*width, *height),
        ),
        PdfImage::RawRgb { width, height } => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => *width as i64,
                "Height" => *height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            gradient(*width, *height).into_raw(),
        ),
        PdfImage::FlateGray { width, height } => {
            let mut stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width as i64,
                    "Height" => *height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![200u8; (*width * *height) as usize],
            );
            stream.compress().unwrap();
            stream
        }
        PdfImage::Corrupt => Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 10,
                "Height" => 10,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            b"definitely not a jpeg".to_vec(),
        ),
        PdfImage::Custom(stream) => stream.clone(),
    }
}

/// Zlib-compresses `data` for a FlateDecode stream.
pub fn flate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Encodes a bilevel bitmap as CCITT Group 4 (`true` is black).
pub fn ccitt_g4(rows: &[Vec<bool>]) -> Vec<u8> {
    use fax::{encoder::Encoder, Color, VecWriter};

    let width = rows.first().map_or(0, Vec::len) as u16;
    let mut encoder = Encoder::new(VecWriter::new());
    for row in rows {
        let pels = row
            .iter()
            .map(|&black| if black { Color::Black } else { Color::White });
        encoder.encode_line(pels, width).unwrap();
    }
    encoder.finish().unwrap().finish()
}

pub fn build_pdf(pages: &[PdfPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let mut xobjects = Dictionary::new();
        let mut content = String::new();

        if let Some(text) = page.text {
            content.push_str(&format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET\n", text));
        }

        for (idx, image) in page.images.iter().enumerate() {
            let name = format!("Im{}", idx + 1);
            let image_id = doc.add_object(image_stream(image));
            xobjects.set(name.as_bytes(), image_id);
            content.push_str(&format!("q 100 0 0 100 50 50 cm /{} Do Q\n", name));
        }

        let contents = if page.dangling_contents {
            Object::Reference((9999, 0))
        } else {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            Object::Reference(content_id)
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
            "Contents" => contents,
        });
        kids.push(page_id.into());
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

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut pdf_bytes = Vec::new();
    doc.save_to(&mut pdf_bytes).unwrap();
    pdf_bytes
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn document_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                escape_xml(p)
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    )
}

pub fn rels_xml(rels: &[(&str, &str, &str)]) -> String {
    let entries: String = rels
        .iter()
        .map(|(id, rel_type, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, rel_type, target
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        entries
    )
}

/// Zips the given parts into an OPC package.
pub fn build_zip(parts: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn build_docx(
    paragraphs: &[&str],
    rels: &[(&str, &str, &str)],
    media: &[(&str, Vec<u8>)],
) -> Vec<u8> {
    let mut parts: Vec<(&str, Vec<u8>)> = vec![
        ("word/document.xml", document_xml(paragraphs).into_bytes()),
        ("word/_rels/document.xml.rels", rels_xml(rels).into_bytes()),
    ];
    parts.extend(media.iter().map(|(name, data)| (*name, data.clone())));
    build_zip(&parts)
}
