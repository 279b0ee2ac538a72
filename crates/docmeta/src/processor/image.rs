use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use serde::Serialize;

use crate::error::ProcessError;

/// Where an extracted image came from inside its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageOrigin {
    /// An image XObject on a PDF page (1-based page number, resource name).
    PdfXObject { page: u32, name: String },
    /// An image part referenced from the DOCX relationship table.
    DocxRelationship { id: String, part: String },
}

/// A decoded bitmap, always normalized to 8-bit RGB.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
    origin: ImageOrigin,
}

impl RasterImage {
    pub fn new(pixels: RgbImage, origin: ImageOrigin) -> Self {
        Self { pixels, origin }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// Encodes the bitmap as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, ProcessError> {
        let mut png_data = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut png_data), ImageFormat::Png)
            .map_err(|e| ProcessError::ImageDecode(format!("Failed to encode PNG: {}", e)))?;
        Ok(png_data)
    }
}

/// Decodes a compressed image file (JPEG, PNG, GIF, ...) and converts it to RGB.
pub fn decode_encoded(data: &[u8]) -> Result<RgbImage, ProcessError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ProcessError::ImageDecode(format!("Failed to load image: {}", e)))?;
    Ok(img.to_rgb8())
}

/// How raw PDF image samples map to color.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// One sample per pixel indexing a palette of 8-bit entries in `base`.
    Indexed {
        base: Box<ColorModel>,
        palette: Vec<u8>,
    },
}

impl ColorModel {
    /// Samples per pixel.
    pub fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn to_rgb(&self, sample: &[u8]) -> [u8; 3] {
        match self {
            ColorModel::Gray => [sample[0]; 3],
            ColorModel::Rgb => [sample[0], sample[1], sample[2]],
            ColorModel::Cmyk => cmyk_to_rgb(sample),
            ColorModel::Indexed { base, palette } => {
                let n = base.components();
                let start = sample[0] as usize * n;
                // Short palettes leave the missing entries black.
                match palette.get(start..start + n) {
                    Some(entry) => base.to_rgb(entry),
                    None => base.to_rgb(&[0, 0, 0, 0][..n]),
                }
            }
        }
    }
}

/// Shape of an uncompressed sample buffer.
#[derive(Debug, Clone)]
pub struct SampleLayout {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub color: ColorModel,
    /// The `/Decode` array, one `[min, max]` pair per component.
    pub decode: Option<Vec<f32>>,
}

impl SampleLayout {
    pub fn new(width: u32, height: u32, color: ColorModel, bits_per_component: u8) -> Self {
        Self {
            width,
            height,
            bits_per_component,
            color,
            decode: None,
        }
    }

    pub fn with_decode(mut self, decode: Vec<f32>) -> Self {
        self.decode = Some(decode);
        self
    }

    /// Per-component table from raw sample value to 8-bit intensity, or to
    /// palette index for indexed images.
    fn sample_tables(&self) -> Vec<Vec<u8>> {
        let max = (1u32 << self.bits_per_component) - 1;
        let indexed = matches!(self.color, ColorModel::Indexed { .. });
        let top = if indexed { 255.0 } else { 1.0 };
        let scale = if indexed { 1.0 } else { 255.0 };

        (0..self.color.components())
            .map(|c| {
                let range = self
                    .decode
                    .as_deref()
                    .and_then(|d| d.get(2 * c..2 * c + 2))
                    .map(|pair| (pair[0], pair[1]));

                (0..=max)
                    .map(|raw| match range {
                        Some((lo, hi)) => {
                            let v = lo + raw as f32 * (hi - lo) / max as f32;
                            (v.clamp(0.0, top) * scale).round() as u8
                        }
                        None if indexed => raw.min(255) as u8,
                        None => ((raw * 255 + max / 2) / max) as u8,
                    })
                    .collect()
            })
            .collect()
    }
}

/// Builds an RGB bitmap from uncompressed PDF image samples.
///
/// Samples may be 1, 2, 4, 8 or 16 bits wide. Rows start on byte boundaries
/// and 16-bit samples are big-endian.
pub fn from_raw_samples(data: &[u8], layout: &SampleLayout) -> Result<RgbImage, ProcessError> {
    let (width, height, bits) = (layout.width, layout.height, layout.bits_per_component);
    if width == 0 || height == 0 {
        return Err(ProcessError::ImageDecode(format!(
            "Invalid image dimensions {}x{}",
            width, height
        )));
    }
    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(ProcessError::ImageDecode(format!(
            "Unsupported sample depth of {} bits",
            bits
        )));
    }
    if let ColorModel::Indexed { base, .. } = &layout.color {
        if matches!(**base, ColorModel::Indexed { .. }) || bits == 16 {
            return Err(ProcessError::ImageDecode("Malformed indexed color space".into()));
        }
    }

    let components = layout.color.components();
    let overflow = || ProcessError::ImageDecode("Image dimensions overflow".into());
    let row_bytes = (width as usize)
        .checked_mul(components * bits as usize)
        .map(|row_bits| row_bits.div_ceil(8))
        .ok_or_else(overflow)?;
    let expected = row_bytes.checked_mul(height as usize).ok_or_else(overflow)?;
    let pixel_bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(overflow)?;

    if data.len() < expected {
        return Err(ProcessError::ImageDecode(format!(
            "Expected {} bytes of samples, found {}",
            expected,
            data.len()
        )));
    }

    let tables = layout.sample_tables();
    let mut pixels = Vec::with_capacity(pixel_bytes);
    let mut sample = vec![0u8; components];

    for row in data[..expected].chunks_exact(row_bytes) {
        for x in 0..width as usize {
            for (c, value) in sample.iter_mut().enumerate() {
                let raw = read_sample(row, x * components + c, bits);
                *value = tables[c][raw as usize];
            }
            pixels.extend_from_slice(&layout.color.to_rgb(&sample));
        }
    }

    RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| ProcessError::ImageDecode("RGB buffer size mismatch".into()))
}

/// Reads the `index`-th sample of a row packed at `bits` per sample.
fn read_sample(row: &[u8], index: usize, bits: u8) -> u16 {
    match bits {
        8 => row[index] as u16,
        16 => u16::from_be_bytes([row[2 * index], row[2 * index + 1]]),
        _ => {
            let bit = index * bits as usize;
            let shift = 8 - bits as usize - bit % 8;
            let mask = (1u16 << bits) - 1;
            (row[bit / 8] as u16 >> shift) & mask
        }
    }
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u16;
    let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}
