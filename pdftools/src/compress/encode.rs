//! Baseline JPEG re-encoding and in-place payload replacement.

use image::DynamicImage;
use jpeg_encoder::{ColorType, Encoder, EncodingError, SamplingFactor};
use lopdf::{Object, Stream};

/// Why an image could not be re-encoded.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Baseline JPEG sides are limited to 65535 pixels.
    #[error("{width}x{height} exceeds the JPEG size limit")]
    TooLarge {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The encoder rejected the pixels.
    #[error(transparent)]
    Jpeg(#[from] EncodingError),
}

/// A re-encoded JPEG payload.
#[derive(Debug, Clone)]
pub struct EncodedJpeg {
    /// JFIF bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Single-channel payload.
    pub grayscale: bool,
}

/// Encode `image` as baseline JPEG with optimized Huffman tables.
///
/// Gray images (with or without alpha) stay single-channel; everything else
/// is encoded as RGB with 4:2:0 chroma subsampling. Alpha is discarded.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<EncodedJpeg, EncodeError> {
    let (width, height) = (image.width(), image.height());
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(EncodeError::TooLarge { width, height });
    };
    let grayscale = image.color().channel_count() <= 2;

    let (pixels, color_type) = if grayscale {
        (image.to_luma8().into_raw(), ColorType::Luma)
    } else {
        (image.to_rgb8().into_raw(), ColorType::Rgb)
    };

    let mut data = Vec::new();
    let mut encoder = Encoder::new(&mut data, quality);
    encoder.set_optimized_huffman_tables(true);
    encoder.set_sampling_factor(SamplingFactor::R_4_2_0);
    encoder.encode(&pixels, w, h, color_type)?;

    Ok(EncodedJpeg {
        data,
        width,
        height,
        grayscale,
    })
}

/// Replace the payload of an image stream with `jpeg`, keeping its object id.
///
/// Entries describing the old encoding are rewritten or dropped. A soft mask
/// reference is kept as it is.
pub fn replace_payload(stream: &mut Stream, jpeg: EncodedJpeg) {
    let dict = &mut stream.dict;
    dict.set("Width", Object::Integer(i64::from(jpeg.width)));
    dict.set("Height", Object::Integer(i64::from(jpeg.height)));
    dict.set(
        "ColorSpace",
        Object::Name(if jpeg.grayscale {
            b"DeviceGray".to_vec()
        } else {
            b"DeviceRGB".to_vec()
        }),
    );
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");
    // Colour-key masks index the old samples.
    if matches!(dict.get(b"Mask"), Ok(Object::Array(_))) {
        dict.remove(b"Mask");
    }

    stream.set_content(jpeg.data);
    stream.allows_compression = false;
}
