//! Integration tests for image-to-PDF conversion.

use image::ImageFormat;
use pdftools::{ErrorKind, ImageToPdfConverter, PdfToolsError, convert_images_to_pdf};
use rstest::rstest;

use crate::common::{
    dir_entries, image_dimensions, image_filters, page_sizes, scratch, write_image, write_jpeg,
    write_png, write_rgba_png,
};

#[test]
fn test_convert_pages_match_image_sizes() {
    let dir = scratch();
    let images = [
        write_png(&dir, "a.png", 100, 200),
        write_png(&dir, "b.png", 300, 300),
        write_png(&dir, "c.png", 50, 50),
    ];
    let output = dir.path().join("album.pdf");

    convert_images_to_pdf(&images, &output).unwrap();

    assert_eq!(
        page_sizes(&output),
        vec![(100.0, 200.0), (300.0, 300.0), (50.0, 50.0)]
    );
}

#[test]
fn test_convert_follows_list_order() {
    let dir = scratch();
    let tall = write_png(&dir, "tall.png", 10, 40);
    let wide = write_png(&dir, "wide.png", 40, 10);
    let output = dir.path().join("album.pdf");

    convert_images_to_pdf(&[&wide, &tall], &output).unwrap();

    assert_eq!(page_sizes(&output), vec![(40.0, 10.0), (10.0, 40.0)]);
}

#[rstest]
#[case(ImageFormat::Png, "img.png")]
#[case(ImageFormat::Jpeg, "img.jpg")]
#[case(ImageFormat::Bmp, "img.bmp")]
#[case(ImageFormat::Gif, "img.gif")]
fn test_convert_accepts_format(#[case] format: ImageFormat, #[case] name: &str) {
    let dir = scratch();
    let image = write_image(&dir, name, 24, 12, format);
    let output = dir.path().join("out.pdf");

    convert_images_to_pdf(&[image], &output).unwrap();

    assert_eq!(page_sizes(&output), vec![(24.0, 12.0)]);
}

#[test]
fn test_convert_jpeg_is_embedded_without_reencoding() {
    let dir = scratch();
    let jpeg = write_jpeg(&dir, "photo.jpg", 64, 48);
    let original = std::fs::read(&jpeg).unwrap();
    let output = dir.path().join("out.pdf");

    convert_images_to_pdf(&[&jpeg], &output).unwrap();

    assert_eq!(image_filters(&output), vec!["DCTDecode"]);
    let doc = lopdf::Document::load(&output).unwrap();
    let embedded = doc
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .find(|stream| stream.dict.get(b"Filter").and_then(|f| f.as_name()).ok() == Some(b"DCTDecode".as_slice()))
        .unwrap();
    assert_eq!(embedded.content, original);
}

#[test]
fn test_convert_alpha_png_adds_soft_mask() {
    let dir = scratch();
    let png = write_rgba_png(&dir, "logo.png", 20, 10);
    let output = dir.path().join("out.pdf");

    convert_images_to_pdf(&[png], &output).unwrap();

    // The image and its soft mask.
    assert_eq!(image_dimensions(&output), vec![(20, 10), (20, 10)]);
    let doc = lopdf::Document::load(&output).unwrap();
    let has_smask = doc
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .any(|stream| stream.dict.has(b"SMask"));
    assert!(has_smask);
}

#[test]
fn test_convert_empty_list_is_validation_error() {
    let dir = scratch();
    let output = dir.path().join("out.pdf");

    let err = convert_images_to_pdf::<&str, _>(&[], &output).unwrap_err();

    assert!(matches!(err, PdfToolsError::NoImagesToConvert));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!output.exists());
}

#[test]
fn test_convert_corrupt_image_writes_nothing() {
    let dir = scratch();
    let good = write_png(&dir, "good.png", 10, 10);
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
    let output = dir.path().join("out.pdf");

    let err = ImageToPdfConverter::new()
        .convert(&[&good, &bad], output.as_path())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(dir_entries(&dir), vec!["bad.png", "good.png"]);
}

#[test]
fn test_convert_unsupported_format() {
    let dir = scratch();
    let text = dir.path().join("readme.txt");
    std::fs::write(&text, "plain text").unwrap();

    let err = convert_images_to_pdf(&[&text], dir.path().join("out.pdf")).unwrap_err();
    assert!(matches!(err, PdfToolsError::UnsupportedImageFormat { .. }));
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_convert_unreadable_image_is_io_error() {
    let dir = scratch();
    let missing = dir.path().join("missing.png");

    let err = convert_images_to_pdf(&[&missing], dir.path().join("out.pdf")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_convert_summary() {
    let dir = scratch();
    let images = [write_png(&dir, "a.png", 5, 5), write_png(&dir, "b.png", 6, 6)];
    let output = dir.path().join("out.pdf");

    let summary = ImageToPdfConverter::new()
        .convert(&images, output.as_path())
        .unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.output_size, std::fs::metadata(&output).unwrap().len());
}
