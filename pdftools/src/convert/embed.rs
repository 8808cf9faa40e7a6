//! Turning image files into PDF image XObjects.
//!
//! Baseline and progressive gray or RGB JPEG files are embedded as they are
//! (`DCTDecode`). Everything else is decoded and stored as 8-bit pixels with
//! `FlateDecode`; an alpha channel becomes a separate gray soft mask.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat};
use lopdf::{Object, Stream, dictionary};
use std::io::Write;
use std::path::Path;

use crate::error::{ImageLocation, PdfToolsError, Result};

/// Formats the converter accepts.
const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Bmp,
    ImageFormat::Gif,
];

/// An image ready to be added to a document.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The image XObject stream, without its `SMask` entry.
    pub image: Stream,
    /// Gray soft mask carrying the alpha channel, if any.
    pub soft_mask: Option<Stream>,
}

/// Read and decode the image at `path`.
///
/// # Errors
///
/// I/O errors for unreadable files; decode errors for unsupported formats or
/// corrupt data.
pub fn embed_image_file(path: &Path) -> Result<EmbeddedImage> {
    let bytes =
        std::fs::read(path).map_err(|e| PdfToolsError::from_read_error(path.to_path_buf(), e))?;
    embed_image_bytes(path, bytes)
}

/// Decode `bytes`, read from `path`, into an [`EmbeddedImage`].
pub fn embed_image_bytes(path: &Path, bytes: Vec<u8>) -> Result<EmbeddedImage> {
    let location = || ImageLocation::File(path.to_path_buf());

    let format = image::guess_format(&bytes).map_err(|_| PdfToolsError::UnsupportedImageFormat {
        path: path.to_path_buf(),
        format: "unknown".to_string(),
    })?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(PdfToolsError::UnsupportedImageFormat {
            path: path.to_path_buf(),
            format: format!("{format:?}"),
        });
    }

    // For GIF this is the first frame.
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| PdfToolsError::image_decode(location(), e))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(PdfToolsError::InvalidDimensions {
            location: location(),
            width,
            height,
        });
    }

    if format == ImageFormat::Jpeg
        && let Some(components @ (1 | 3)) = jpeg_components(&bytes)
    {
        tracing::debug!(path = %path.display(), components, "embedding JPEG as is");
        let color_space = if components == 1 { "DeviceGray" } else { "DeviceRGB" };
        return Ok(EmbeddedImage {
            width,
            height,
            image: image_stream(width, height, color_space, "DCTDecode", bytes),
            soft_mask: None,
        });
    }

    embed_pixels(&decoded).map_err(|e| PdfToolsError::image_encode(location(), e))
}

fn embed_pixels(decoded: &DynamicImage) -> std::io::Result<EmbeddedImage> {
    let (width, height) = (decoded.width(), decoded.height());
    let grayscale = decoded.color().channel_count() <= 2;

    let (pixels, color_space) = if grayscale {
        (decoded.to_luma8().into_raw(), "DeviceGray")
    } else {
        (decoded.to_rgb8().into_raw(), "DeviceRGB")
    };
    let image = image_stream(width, height, color_space, "FlateDecode", deflate(&pixels)?);

    let soft_mask = if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        Some(image_stream(
            width,
            height,
            "DeviceGray",
            "FlateDecode",
            deflate(&alpha)?,
        ))
    } else {
        None
    };

    Ok(EmbeddedImage {
        width,
        height,
        image,
        soft_mask,
    })
}

fn image_stream(width: u32, height: u32, color_space: &str, filter: &str, data: Vec<u8>) -> Stream {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => filter,
        },
        data,
    );
    stream.allows_compression = false;
    stream
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Component count of a Huffman-coded (baseline, extended or progressive)
/// JPEG, read from its frame header.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill bytes between markers.
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        match marker {
            0xC0..=0xC2 => return bytes.get(pos + 9).copied(),
            0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => return None,
            _ => pos += 2 + length,
        }
    }

    None
}
