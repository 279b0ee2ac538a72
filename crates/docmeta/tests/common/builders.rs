//! Builders for creating test documents programmatically.
//!
//! Every fixture is generated in memory, so the tests carry no binary files.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const IMAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

fn checkerboard(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut data = Vec::new();
    checkerboard(width, height)
        .write_to(&mut Cursor::new(&mut data), format)
        .expect("Failed to encode fixture image");
    data
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

struct PageSpec {
    text: Option<String>,
    images: Vec<(u32, u32)>,
    unreadable_text: bool,
}

/// Builder for single-file PDFs with text and JPEG image XObjects.
pub struct PdfBuilder {
    pages: Vec<PageSpec>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// Add a page with a line of text.
    pub fn text_page(mut self, text: &str) -> Self {
        self.pages.push(PageSpec {
            text: Some(text.to_string()),
            images: Vec::new(),
            unreadable_text: false,
        });
        self
    }

    /// Add a page whose content stream is missing, so its text layer cannot be read.
    pub fn unreadable_page(mut self) -> Self {
        self.pages.push(PageSpec {
            text: None,
            images: Vec::new(),
            unreadable_text: true,
        });
        self
    }

    /// Place a JPEG image of the given size on the most recent page.
    pub fn image(mut self, width: u32, height: u32) -> Self {
        if self.pages.is_empty() {
            self.pages.push(PageSpec {
                text: None,
                images: Vec::new(),
                unreadable_text: false,
            });
        }
        if let Some(page) = self.pages.last_mut() {
            page.images.push((width, height));
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in &self.pages {
            let mut xobjects = Dictionary::new();
            let mut content = String::new();

            if let Some(text) = &page.text {
                content.push_str(&format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET\n", text));
            }

            for (idx, (width, height)) in page.images.iter().enumerate() {
                let name = format!("Im{}", idx + 1);
                let image_id = doc.add_object(Stream::new(
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
                ));
                xobjects.set(name.as_bytes(), image_id);
                content.push_str(&format!("q 200 0 0 200 72 300 cm /{} Do Q\n", name));
            }

            let contents = if page.unreadable_text {
                Object::Reference((4242, 0))
            } else {
                Object::Reference(doc.add_object(Stream::new(dictionary! {}, content.into_bytes())))
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

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("Failed to save fixture PDF");
        bytes
    }
}

/// Builder for DOCX packages: body paragraphs plus relationship-backed media.
pub struct DocxBuilder {
    paragraphs: Vec<String>,
    relationships: Vec<(String, String, String)>,
    media: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            paragraphs: Vec::new(),
            relationships: vec![(
                "rIdStyles".to_string(),
                STYLES_REL.to_string(),
                "styles.xml".to_string(),
            )],
            media: Vec::new(),
        }
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    /// Add a PNG image part under `word/media/` with an image relationship.
    pub fn png(mut self, name: &str, width: u32, height: u32) -> Self {
        let id = format!("rIdImg{}", self.media.len() + 1);
        self.relationships.push((
            id,
            IMAGE_REL.to_string(),
            format!("media/{}", name),
        ));
        self.media
            .push((format!("word/media/{}", name), png_bytes(width, height)));
        self
    }

    fn document_xml(&self) -> String {
        let body: String = self
            .paragraphs
            .iter()
            .map(|p| {
                format!(
                    r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    p.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    fn rels_xml(&self) -> String {
        let entries: String = self
            .relationships
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

    pub fn build(self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        let mut parts = vec![
            ("word/document.xml".to_string(), self.document_xml().into_bytes()),
            (
                "word/_rels/document.xml.rels".to_string(),
                self.rels_xml().into_bytes(),
            ),
        ];
        parts.extend(self.media);

        for (name, data) in &parts {
            zip.start_file(name.as_str(), options)
                .expect("Failed to start zip entry");
            zip.write_all(data).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish zip").into_inner()
    }
}
