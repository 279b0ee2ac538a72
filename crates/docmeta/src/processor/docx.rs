use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Decoder, Reader};

use crate::error::ProcessError;
use crate::processor::image::{decode_encoded, ImageOrigin, RasterImage};
use crate::processor::{DocumentFormat, DocumentProcessor, ExtractedContent};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

pub struct DocxProcessor;

impl DocxProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for DocxProcessor {
    fn process(&self, path: &Path) -> Result<ExtractedContent, ProcessError> {
        let _span = tracing::info_span!("processor.docx").entered();

        let file = std::fs::File::open(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ProcessError::DocxProcessing(format!("Failed to open DOCX: {}", e)))?;

        let document_xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
            ProcessError::DocxProcessing(format!("Missing {} in package", DOCUMENT_PART))
        })?;
        let document_xml = String::from_utf8(document_xml).map_err(|e| {
            ProcessError::DocxProcessing(format!("{} is not valid UTF-8: {}", DOCUMENT_PART, e))
        })?;

        let text = parse_body_paragraphs(&document_xml)?.join("\n");
        let images = extract_images(&mut archive);

        tracing::debug!(
            images = images.len(),
            text_chars = text.chars().count(),
            "DOCX extraction finished"
        );

        Ok(ExtractedContent { text, images })
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

/// Reads a package part, returning `None` if the archive has no such entry.
fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, ProcessError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ProcessError::DocxProcessing(format!(
                "Failed to open {}: {}",
                name, e
            )))
        }
    };

    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read {}: {}", name, e)))?;
    Ok(Some(data))
}

/// Appends the text of an entity or character reference (`amp`, `#x41`, ...).
fn push_reference(out: &mut String, name: &str) {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|code| {
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value.and_then(char::from_u32)
        }),
    };

    match resolved {
        Some(c) => out.push(c),
        None => tracing::debug!("Ignoring unknown XML reference &{};", name),
    }
}

fn innermost_is(stack: &[Vec<u8>], local_name: &[u8]) -> bool {
    stack.last().map(Vec::as_slice) == Some(local_name)
}

/// Text of each paragraph that is a direct child of `w:body`, in document order.
///
/// Paragraphs inside tables, text boxes and other containers are skipped.
fn parse_body_paragraphs(xml: &str) -> Result<Vec<String>, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    // Local names of the currently open elements.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<String> = None;
    // Depth of `w:p` elements opened inside the current body paragraph.
    let mut nested_paragraphs = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name().as_ref().to_vec();
                if local_name == b"p" {
                    if current.is_none() && innermost_is(&stack, b"body") {
                        current = Some(String::new());
                    } else if current.is_some() {
                        nested_paragraphs += 1;
                    }
                }
                stack.push(local_name);
            }
            Ok(Event::Empty(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"p" if current.is_none() && innermost_is(&stack, b"body") => {
                        paragraphs.push(String::new());
                    }
                    b"tab" | b"ptab" | b"br" | b"cr" | b"noBreakHyphen"
                        if innermost_is(&stack, b"r") && nested_paragraphs == 0 =>
                    {
                        if let Some(text) = current.as_mut() {
                            text.push(match local_name.as_ref() {
                                b"tab" | b"ptab" => '\t',
                                b"noBreakHyphen" => '-',
                                _ => '\n',
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                let closed = stack.pop();
                if closed.as_deref() == Some(b"p".as_slice()) && current.is_some() {
                    if nested_paragraphs > 0 {
                        nested_paragraphs -= 1;
                    } else if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if innermost_is(&stack, b"t") && nested_paragraphs == 0 {
                    if let Some(text) = current.as_mut() {
                        let decoded = e.decode().map_err(|e| {
                            ProcessError::DocxProcessing(format!("XML text error: {}", e))
                        })?;
                        text.push_str(&decoded);
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if innermost_is(&stack, b"t") && nested_paragraphs == 0 {
                    if let Some(text) = current.as_mut() {
                        push_reference(text, &String::from_utf8_lossy(&e));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

impl Relationship {
    fn is_image(&self) -> bool {
        self.rel_type.ends_with("/image")
    }
}

fn relationship_from(e: &BytesStart, decoder: Decoder) -> Relationship {
    let mut rel = Relationship {
        id: String::new(),
        rel_type: String::new(),
        target: String::new(),
        external: false,
    };

    for attr in e.attributes().flatten() {
        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                tracing::debug!("Keeping raw relationship attribute: {}", e);
                String::from_utf8_lossy(&attr.value).into_owned()
            }
        };
        match attr.key.local_name().as_ref() {
            b"Id" => rel.id = value,
            b"Type" => rel.rel_type = value,
            b"Target" => rel.target = value,
            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("External"),
            _ => {}
        }
    }

    rel
}

/// Relationship entries in the order they appear in the part.
fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, ProcessError> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                rels.push(relationship_from(e, reader.decoder()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "Relationships parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolves a relationship target against the `word/` directory of the main part.
fn resolve_part_name(target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Decodes every image the main part links to. Individual failures are logged
/// and skipped.
fn extract_images<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Vec<RasterImage> {
    let rels_xml = match read_part(archive, DOCUMENT_RELS_PART) {
        Ok(Some(data)) => String::from_utf8_lossy(&data).into_owned(),
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Skipping DOCX images: {}", e);
            return Vec::new();
        }
    };

    let rels = match parse_relationships(&rels_xml) {
        Ok(rels) => rels,
        Err(e) => {
            tracing::warn!("Skipping DOCX images: {}", e);
            return Vec::new();
        }
    };

    let mut images = Vec::new();
    for rel in rels.into_iter().filter(Relationship::is_image) {
        if rel.external {
            tracing::debug!("Skipping external image relationship {}", rel.id);
            continue;
        }

        let part = resolve_part_name(&rel.target);
        let data = match read_part(archive, &part) {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::warn!("Image part {} for {} not found in package", part, rel.id);
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping image {}: {}", rel.id, e);
                continue;
            }
        };

        match decode_encoded(&data) {
            Ok(pixels) => images.push(RasterImage::new(
                pixels,
                ImageOrigin::DocxRelationship { id: rel.id, part },
            )),
            Err(e) => tracing::warn!("Skipping image {} ({}): {}", rel.id, part, e),
        }
    }

    images
}
