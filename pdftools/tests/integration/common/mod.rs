//! Shared fixtures for the integration tests.
//!
//! Every fixture is generated at runtime into a temporary directory, so the
//! tests do not depend on checked-in binary files.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fresh scratch directory.
pub fn scratch() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Assemble a document from page dictionaries (without `Parent`).
pub fn finish_document(mut doc: Document, pages: Vec<Dictionary>) -> Document {
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = pages
        .into_iter()
        .map(|mut page| {
            page.set("Parent", pages_id);
            doc.add_object(page).into()
        })
        .collect();
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }.into(),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Save `doc` as `dir/name`.
pub fn save(dir: &TempDir, name: &str, mut doc: Document) -> PathBuf {
    let path = dir.path().join(name);
    doc.save(&path).expect("Failed to save fixture");
    path
}

/// A PDF whose pages each carry one marker comment in their content stream.
pub fn pdf_with_markers(dir: &TempDir, name: &str, markers: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages = markers
        .iter()
        .map(|marker| {
            let content = format!("% {marker}\n0 0 m 10 10 l S\n").into_bytes();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
            }
        })
        .collect();
    save(dir, name, finish_document(doc, pages))
}

/// Marker comments of the pages of `path`, in page order.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load output");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("page content");
            let text = String::from_utf8_lossy(&content);
            text.lines()
                .find_map(|line| line.strip_prefix("% "))
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .collect()
}

/// A gradient so JPEG has something to work with.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Add a Flate-compressed RGB image XObject.
pub fn add_rgb_image(doc: &mut Document, width: u32, height: u32) -> ObjectId {
    let pixels = gradient(width, height).into_raw();
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&pixels),
    ))
}

/// Page dictionary drawing the XObjects `images` (name, id).
pub fn image_page(images: &[(&str, ObjectId)]) -> Dictionary {
    let mut xobjects = Dictionary::new();
    for &(name, id) in images {
        xobjects.set(name, id);
    }
    dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => dictionary! { "XObject" => xobjects },
    }
}

/// A one-page PDF holding one `width` x `height` RGB image.
pub fn pdf_with_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let image = add_rgb_image(&mut doc, width, height);
    let pages = vec![image_page(&[("Im0", image)])];
    save(dir, name, finish_document(doc, pages))
}

/// A two-page PDF where both pages draw the same image object.
pub fn pdf_with_shared_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let image = add_rgb_image(&mut doc, width, height);
    let pages = vec![image_page(&[("Im0", image)]), image_page(&[("Im0", image)])];
    save(dir, name, finish_document(doc, pages))
}

/// A PDF with no images at all.
pub fn pdf_without_images(dir: &TempDir, name: &str) -> PathBuf {
    pdf_with_markers(dir, name, &["only"])
}

/// Width and height of every image XObject in `path`, in object order.
pub fn image_dimensions(path: &Path) -> Vec<(i64, i64)> {
    let doc = Document::load(path).expect("Failed to load output");
    let mut dims: Vec<(ObjectId, i64, i64)> = doc
        .objects
        .iter()
        .filter_map(|(&id, object)| {
            let stream = object.as_stream().ok()?;
            let dict = &stream.dict;
            if dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Image" {
                return None;
            }
            if dict.has(b"ImageMask") {
                return None;
            }
            Some((
                id,
                dict.get(b"Width").and_then(Object::as_i64).ok()?,
                dict.get(b"Height").and_then(Object::as_i64).ok()?,
            ))
        })
        .collect();
    dims.sort_by_key(|&(id, _, _)| id);
    dims.into_iter().map(|(_, w, h)| (w, h)).collect()
}

/// Filter names of every image XObject in `path`.
pub fn image_filters(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load output");
    doc.objects
        .values()
        .filter_map(|object| {
            let stream = object.as_stream().ok()?;
            if stream.dict.get(b"Subtype").and_then(Object::as_name).ok()? != b"Image" {
                return None;
            }
            let filter = stream.dict.get(b"Filter").and_then(Object::as_name).ok()?;
            Some(String::from_utf8_lossy(filter).into_owned())
        })
        .collect()
}

/// MediaBox width and height of every page of `path`.
pub fn page_sizes(path: &Path) -> Vec<(f32, f32)> {
    let doc = Document::load(path).expect("Failed to load output");
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_dictionary(page_id).expect("page dictionary");
            let media_box = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("MediaBox");
            let value = |i: usize| match &media_box[i] {
                Object::Integer(v) => *v as f32,
                Object::Real(v) => *v,
                other => panic!("unexpected MediaBox entry {other:?}"),
            };
            (value(2) - value(0), value(3) - value(1))
        })
        .collect()
}

/// Write an RGB PNG of the given size.
pub fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(&path, ImageFormat::Png)
        .expect("Failed to write PNG");
    path
}

/// Write a semi-transparent RGBA PNG of the given size.
pub fn write_rgba_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 90, 180, 100])))
        .save_with_format(&path, ImageFormat::Png)
        .expect("Failed to write PNG");
    path
}

/// Write an RGB JPEG of the given size.
pub fn write_jpeg(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(&path, ImageFormat::Jpeg)
        .expect("Failed to write JPEG");
    path
}

/// Write an image in `format` of the given size.
pub fn write_image(dir: &TempDir, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(&path, format)
        .expect("Failed to write image");
    path
}

/// Names of the files in `dir`.
pub fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("read_dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
