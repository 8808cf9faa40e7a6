//! Integration tests for image recompression.

use lopdf::{Document, Stream, dictionary};
use pdftools::compress::ImageRecompressor;
use pdftools::config::CompressionConfig;
use pdftools::{CancelFlag, ErrorKind, PdfToolsError, compress_document};
use rstest::rstest;

use crate::common::{
    dir_entries, finish_document, image_dimensions, image_filters, image_page, page_markers,
    pdf_with_image, pdf_with_markers, pdf_with_shared_image, pdf_without_images, save, scratch,
};

#[test]
fn test_compress_halves_image_dimensions() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "photo.pdf", 1000, 1000);
    let output = dir.path().join("small.pdf");

    compress_document(&source, &output).unwrap();

    assert_eq!(image_dimensions(&output), vec![(500, 500)]);
    assert_eq!(image_filters(&output), vec!["DCTDecode"]);
}

#[test]
fn test_compress_report_matches_files() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "photo.pdf", 400, 300);
    let output = dir.path().join("small.pdf");

    let report = compress_document(&source, &output).unwrap();

    assert_eq!(report.original_size, std::fs::metadata(&source).unwrap().len());
    assert_eq!(report.compressed_size, std::fs::metadata(&output).unwrap().len());
}

#[test]
fn test_compress_without_images_still_reports_sizes() {
    let dir = scratch();
    let source = pdf_without_images(&dir, "text.pdf");
    let output = dir.path().join("out.pdf");

    let report = compress_document(&source, &output).unwrap();

    assert_eq!(report.original_size, std::fs::metadata(&source).unwrap().len());
    assert_eq!(report.compressed_size, std::fs::metadata(&output).unwrap().len());
    assert_eq!(page_markers(&output), vec!["only"]);
}

#[test]
fn test_compress_twice_halves_again() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "photo.pdf", 800, 600);
    let once = dir.path().join("once.pdf");
    let twice = dir.path().join("twice.pdf");

    compress_document(&source, &once).unwrap();
    compress_document(&once, &twice).unwrap();

    assert_eq!(image_dimensions(&once), vec![(400, 300)]);
    assert_eq!(image_dimensions(&twice), vec![(200, 150)]);
}

#[test]
fn test_shared_image_processed_once_per_page() {
    let dir = scratch();
    let source = pdf_with_shared_image(&dir, "shared.pdf", 400, 400);
    let output = dir.path().join("out.pdf");

    compress_document(&source, &output).unwrap();

    // Two pages reference one object, so it is halved twice.
    assert_eq!(image_dimensions(&output), vec![(100, 100)]);
}

#[test]
fn test_compress_odd_dimensions_floor() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "odd.pdf", 101, 33);
    let output = dir.path().join("out.pdf");

    compress_document(&source, &output).unwrap();

    assert_eq!(image_dimensions(&output), vec![(50, 16)]);
}

#[rstest]
#[case(0.25, (250, 100))]
#[case(1.0, (1000, 400))]
fn test_compress_custom_scale(#[case] scale: f64, #[case] expected: (i64, i64)) {
    let dir = scratch();
    let source = pdf_with_image(&dir, "wide.pdf", 1000, 400);
    let output = dir.path().join("out.pdf");

    let config = CompressionConfig {
        scale,
        quality: 80,
        ..Default::default()
    };
    ImageRecompressor::with_config(config)
        .compress(&source, &output)
        .unwrap();

    assert_eq!(image_dimensions(&output), vec![expected]);
}

#[test]
fn test_compress_one_pixel_image_is_decode_error() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "tiny.pdf", 1, 1);
    let output = dir.path().join("out.pdf");

    let err = compress_document(&source, &output).unwrap_err();

    assert!(matches!(err, PdfToolsError::InvalidDimensions { .. }));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!output.exists());
}

#[test]
fn test_compress_unsupported_filter_aborts() {
    let dir = scratch();
    let mut doc = Document::with_version("1.5");
    let image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 16,
            "Height" => 16,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 1,
            "Filter" => "JBIG2Decode",
        },
        vec![0; 32],
    ));
    let source = save(
        &dir,
        "fax.pdf",
        finish_document(doc, vec![image_page(&[("Im0", image)])]),
    );
    let output = dir.path().join("out.pdf");

    let err = compress_document(&source, &output).unwrap_err();

    assert!(matches!(err, PdfToolsError::ImageDecode { .. }));
    assert!(err.to_string().contains("on page 1"));
    assert!(!output.exists());
}

#[test]
fn test_compress_overflowing_dimensions_is_decode_error() {
    let dir = scratch();
    let mut doc = Document::with_version("1.5");
    let image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 4_294_967_295_i64,
            "Height" => 4_294_967_295_i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 16,
        },
        vec![0; 64],
    ));
    let source = save(
        &dir,
        "huge.pdf",
        finish_document(doc, vec![image_page(&[("Im0", image)])]),
    );
    let output = dir.path().join("out.pdf");

    let err = compress_document(&source, &output).unwrap_err();

    assert!(matches!(err, PdfToolsError::ImageDecode { .. }));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!output.exists());
}

#[test]
fn test_compress_missing_source_is_io_error() {
    let dir = scratch();
    let err = compress_document(dir.path().join("missing.pdf"), dir.path().join("out.pdf"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_compress_non_pdf_is_format_error() {
    let dir = scratch();
    let source = dir.path().join("fake.pdf");
    std::fs::write(&source, "%PDF-but-not-really").unwrap();

    let err = compress_document(&source, dir.path().join("out.pdf")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_compress_cancelled_writes_nothing() {
    let dir = scratch();
    let source = pdf_with_image(&dir, "photo.pdf", 64, 64);
    let output = dir.path().join("out.pdf");

    let flag = CancelFlag::new();
    flag.cancel();
    let mut sink = flag.clone();

    let err = ImageRecompressor::new()
        .compress_with_progress(&source, &output, &mut sink)
        .unwrap_err();

    assert!(matches!(err, PdfToolsError::Cancelled));
    assert_eq!(dir_entries(&dir), vec!["photo.pdf"]);
}

#[test]
fn test_compress_keeps_text_pages() {
    let dir = scratch();
    let source = pdf_with_markers(&dir, "text.pdf", &["T1", "T2"]);
    let output = dir.path().join("out.pdf");

    compress_document(&source, &output).unwrap();

    assert_eq!(page_markers(&output), vec!["T1", "T2"]);
}
