//! Decoding of image XObject payloads into pixels.
//!
//! Supported: no filter, `FlateDecode` (PNG and TIFF predictors), and
//! `DCTDecode`, optionally chained after `FlateDecode`. Colour spaces are
//! `DeviceGray`, `DeviceRGB`, `DeviceCMYK`, `ICCBased` (by component count) and
//! `Indexed` over any of them, at 1, 2, 4, 8 or 16 bits per component.

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Read;

use super::images::resolve;

/// Why a payload could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Device colour model of decoded samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorModel>,
        hival: usize,
        lookup: Vec<u8>,
    },
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
            Self::Indexed { .. } => 1,
        }
    }
}

/// Width and height declared by an image dictionary.
pub fn declared_dimensions(dict: &Dictionary) -> Option<(u32, u32)> {
    Some((dimension(dict, b"Width")?, dimension(dict, b"Height")?))
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
}

/// Whether the stream is a stencil mask (`/ImageMask true`).
pub fn is_stencil_mask(dict: &Dictionary) -> bool {
    matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)))
}

/// Decode an image XObject stream to pixels.
pub fn decode_image(doc: &Document, stream: &Stream) -> DecodeResult<DynamicImage> {
    let dict = &stream.dict;
    let (width, height) = declared_dimensions(dict)
        .ok_or_else(|| DecodeError::new("missing or invalid Width/Height"))?;

    let filters = filter_names(doc, dict)?;
    let params = decode_parms(doc, dict);

    let mut data = stream.content.clone();
    for (index, filter) in filters.iter().enumerate() {
        match filter.as_slice() {
            b"FlateDecode" | b"Fl" => {
                data = inflate(&data)?;
                if let Some(parms) = params.get(index).and_then(Option::as_ref) {
                    data = unpredict(&data, parms)?;
                }
            }
            b"DCTDecode" | b"DCT" if index + 1 == filters.len() => {
                return image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
                    .map_err(|e| DecodeError::new(format!("invalid JPEG data: {e}")));
            }
            other => {
                return Err(DecodeError::new(format!(
                    "unsupported filter /{}",
                    String::from_utf8_lossy(other)
                )));
            }
        }
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .map_err(|_| DecodeError::new("missing BitsPerComponent"))?;
    let bits = match bits {
        1 | 2 | 4 | 8 | 16 => bits as usize,
        other => {
            return Err(DecodeError::new(format!(
                "unsupported BitsPerComponent {other}"
            )));
        }
    };

    let color_space = dict
        .get(b"ColorSpace")
        .map_err(|_| DecodeError::new("missing ColorSpace"))?;
    let model = color_model(doc, color_space)?;
    let invert = decode_inversions(dict, model.components());

    samples_to_image(&data, width, height, bits, &model, &invert)
}

fn filter_names(doc: &Document, dict: &Dictionary) -> DecodeResult<Vec<Vec<u8>>> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    match resolve(doc, filter) {
        Some(Object::Name(name)) => Ok(vec![name.clone()]),
        Some(Object::Array(names)) => names
            .iter()
            .map(|name| {
                resolve(doc, name)
                    .and_then(|name| name.as_name().ok())
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| DecodeError::new("malformed Filter array"))
            })
            .collect(),
        _ => Err(DecodeError::new("malformed Filter entry")),
    }
}

fn decode_parms<'a>(doc: &'a Document, dict: &'a Dictionary) -> Vec<Option<&'a Dictionary>> {
    let as_dict = |object: &'a Object| match resolve(doc, object) {
        Some(Object::Dictionary(parms)) => Some(parms),
        _ => None,
    };
    match dict.get(b"DecodeParms").ok().and_then(|p| resolve(doc, p)) {
        Some(Object::Array(items)) => items.iter().map(as_dict).collect(),
        Some(Object::Dictionary(parms)) => vec![Some(parms)],
        _ => Vec::new(),
    }
}

fn inflate(data: &[u8]) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::new(format!("invalid Flate data: {e}")))?;
    Ok(out)
}

fn parm(parms: &Dictionary, key: &[u8], default: i64) -> i64 {
    parms.get(key).and_then(Object::as_i64).unwrap_or(default)
}

/// Undo a PNG (>= 10) or TIFF (2) predictor.
fn unpredict(data: &[u8], parms: &Dictionary) -> DecodeResult<Vec<u8>> {
    let predictor = parm(parms, b"Predictor", 1);
    if predictor == 1 {
        return Ok(data.to_vec());
    }

    let colors = parm(parms, b"Colors", 1).max(1) as usize;
    let bits = parm(parms, b"BitsPerComponent", 8).max(1) as usize;
    let columns = parm(parms, b"Columns", 1).max(1) as usize;
    let row_len = (colors * bits * columns).div_ceil(8);
    let bpp = (colors * bits).div_ceil(8).max(1);

    match predictor {
        2 => {
            if bits != 8 {
                return Err(DecodeError::new(format!(
                    "TIFF predictor with {bits} bits per component is not supported"
                )));
            }
            let mut out = data.to_vec();
            for row in out.chunks_mut(row_len) {
                for i in bpp..row.len() {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            Ok(out)
        }
        10..=15 => {
            let mut out = Vec::with_capacity(data.len());
            let mut previous = vec![0u8; row_len];

            for chunk in data.chunks(row_len + 1) {
                let (&tag, encoded) = chunk
                    .split_first()
                    .ok_or_else(|| DecodeError::new("empty predictor row"))?;
                let mut row = encoded.to_vec();
                row.resize(row_len, 0);

                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let up = previous[i];
                    let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
                    row[i] = match tag {
                        0 => row[i],
                        1 => row[i].wrapping_add(left),
                        2 => row[i].wrapping_add(up),
                        3 => row[i].wrapping_add(((u16::from(left) + u16::from(up)) / 2) as u8),
                        4 => row[i].wrapping_add(paeth(left, up, up_left)),
                        other => {
                            return Err(DecodeError::new(format!(
                                "invalid PNG filter type {other}"
                            )));
                        }
                    };
                }

                out.extend_from_slice(&row);
                previous = row;
            }
            Ok(out)
        }
        other => Err(DecodeError::new(format!("unsupported predictor {other}"))),
    }
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let p = i16::from(left) + i16::from(up) - i16::from(up_left);
    let pa = (p - i16::from(left)).abs();
    let pb = (p - i16::from(up)).abs();
    let pc = (p - i16::from(up_left)).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}

fn color_model(doc: &Document, color_space: &Object) -> DecodeResult<ColorModel> {
    let color_space =
        resolve(doc, color_space).ok_or_else(|| DecodeError::new("dangling ColorSpace"))?;

    match color_space {
        Object::Name(name) => device_model(name),
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|family| resolve(doc, family))
                .and_then(|family| family.as_name().ok())
                .ok_or_else(|| DecodeError::new("malformed ColorSpace array"))?;

            match family {
                b"ICCBased" => {
                    let profile = items
                        .get(1)
                        .and_then(|profile| resolve(doc, profile))
                        .and_then(|profile| profile.as_stream().ok())
                        .ok_or_else(|| DecodeError::new("ICCBased without profile stream"))?;
                    match profile.dict.get(b"N").and_then(Object::as_i64) {
                        Ok(1) => Ok(ColorModel::Gray),
                        Ok(3) => Ok(ColorModel::Rgb),
                        Ok(4) => Ok(ColorModel::Cmyk),
                        _ => Err(DecodeError::new("ICCBased profile with unsupported /N")),
                    }
                }
                b"Indexed" | b"I" => indexed_model(doc, items),
                b"CalGray" => Ok(ColorModel::Gray),
                b"CalRGB" => Ok(ColorModel::Rgb),
                _ => device_model(family),
            }
        }
        _ => Err(DecodeError::new("malformed ColorSpace entry")),
    }
}

fn device_model(name: &[u8]) -> DecodeResult<ColorModel> {
    match name {
        b"DeviceGray" | b"G" => Ok(ColorModel::Gray),
        b"DeviceRGB" | b"RGB" => Ok(ColorModel::Rgb),
        b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
        other => Err(DecodeError::new(format!(
            "unsupported colour space /{}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn indexed_model(doc: &Document, items: &[Object]) -> DecodeResult<ColorModel> {
    let [_, base, hival, lookup] = items else {
        return Err(DecodeError::new("Indexed colour space needs four entries"));
    };

    let base = color_model(doc, base)?;
    if matches!(base, ColorModel::Indexed { .. }) {
        return Err(DecodeError::new("nested Indexed colour space"));
    }

    let hival = resolve(doc, hival)
        .and_then(|hival| hival.as_i64().ok())
        .and_then(|hival| usize::try_from(hival).ok())
        .ok_or_else(|| DecodeError::new("invalid Indexed hival"))?;

    let lookup = match resolve(doc, lookup) {
        Some(Object::String(bytes, _)) => bytes.clone(),
        Some(Object::Stream(stream)) => stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
        _ => return Err(DecodeError::new("invalid Indexed lookup table")),
    };

    Ok(ColorModel::Indexed {
        base: Box::new(base),
        hival,
        lookup,
    })
}

/// Per-component flags for `/Decode` pairs that swap their range (e.g. `[1 0]`).
///
/// An absent or malformed array inverts nothing.
fn decode_inversions(dict: &Dictionary, components: usize) -> Vec<bool> {
    let Ok(Object::Array(range)) = dict.get(b"Decode") else {
        return vec![false; components];
    };
    let value = |object: Option<&Object>| match object {
        Some(Object::Integer(v)) => *v as f32,
        Some(Object::Real(v)) => *v,
        _ => 0.0,
    };
    (0..components)
        .map(|c| value(range.get(2 * c)) > value(range.get(2 * c + 1)))
        .collect()
}

/// Read packed samples at `bits` per component, widened to 8 bits.
fn unpack_row(row: &[u8], count: usize, bits: usize, scale: bool) -> Vec<u8> {
    match bits {
        8 => row[..count].to_vec(),
        16 => row.chunks_exact(2).take(count).map(|pair| pair[0]).collect(),
        _ => {
            let max = (1u16 << bits) - 1;
            (0..count)
                .map(|i| {
                    let bit = i * bits;
                    let shift = 8 - bits - (bit % 8);
                    let value = u16::from(row[bit / 8] >> shift) & max;
                    if scale {
                        (value * 255 / max) as u8
                    } else {
                        value as u8
                    }
                })
                .collect()
        }
    }
}

fn samples_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    bits: usize,
    model: &ColorModel,
    invert: &[bool],
) -> DecodeResult<DynamicImage> {
    let (w, h) = (width as usize, height as usize);
    let components = model.components();
    let overflow = || DecodeError::new("image dimensions overflow");

    let row_samples = w.checked_mul(components).ok_or_else(overflow)?;
    let row_len = row_samples
        .checked_mul(bits)
        .ok_or_else(overflow)?
        .div_ceil(8);
    let needed = row_len.checked_mul(h).ok_or_else(overflow)?;
    let sample_count = row_samples.checked_mul(h).ok_or_else(overflow)?;

    if row_len == 0 {
        return Err(DecodeError::new(format!("empty {width}x{height} image")));
    }
    // Checked before any buffer sized from the dictionary is allocated.
    if data.len() < needed {
        return Err(DecodeError::new(format!(
            "payload has {} bytes, {width}x{height} image needs {needed}",
            data.len()
        )));
    }

    let indexed = matches!(model, ColorModel::Indexed { .. });
    let mut samples = Vec::with_capacity(sample_count);
    for row in data.chunks_exact(row_len).take(h) {
        samples.extend(unpack_row(row, row_samples, bits, !indexed));
    }
    if !indexed && invert.iter().any(|&flag| flag) {
        for (index, sample) in samples.iter_mut().enumerate() {
            if invert[index % components] {
                *sample = 255 - *sample;
            }
        }
    }

    let (pixels, model) = match model {
        ColorModel::Indexed {
            base,
            hival,
            lookup,
        } => (expand_indexed(&samples, base, *hival, lookup), base.as_ref()),
        other => (samples, other),
    };

    let image = match model {
        ColorModel::Gray => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        ColorModel::Rgb => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        ColorModel::Cmyk => {
            RgbImage::from_raw(width, height, cmyk_to_rgb(&pixels)).map(DynamicImage::ImageRgb8)
        }
        ColorModel::Indexed { .. } => None,
    };

    image.ok_or_else(|| DecodeError::new("sample buffer does not match image dimensions"))
}

fn expand_indexed(indices: &[u8], base: &ColorModel, hival: usize, lookup: &[u8]) -> Vec<u8> {
    let n = base.components();
    let mut out = Vec::with_capacity(indices.len() * n);
    for &index in indices {
        let start = usize::from(index).min(hival) * n;
        match lookup.get(start..start + n) {
            Some(entry) => out.extend_from_slice(entry),
            None => out.extend(std::iter::repeat_n(0, n)),
        }
    }
    out
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    cmyk.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}
