//! Integration tests for merging.

use lopdf::{Document, Object, dictionary};
use pdftools::{DocumentMerger, ErrorKind, MergeOptions, PdfToolsError, merge_documents};
use std::ops::ControlFlow;

use crate::common::{
    add_rgb_image, dir_entries, finish_document, image_page, page_markers, pdf_with_markers,
    save, scratch,
};

#[test]
fn test_merge_preserves_list_and_page_order() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1", "A2"]);
    let b = pdf_with_markers(&dir, "b.pdf", &["B1", "B2", "B3"]);
    let output = dir.path().join("merged.pdf");

    merge_documents(&[&a, &b], &output).unwrap();

    assert_eq!(page_markers(&output), vec!["A1", "A2", "B1", "B2", "B3"]);
}

#[test]
fn test_merge_reversed_list() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1", "A2"]);
    let b = pdf_with_markers(&dir, "b.pdf", &["B1"]);
    let output = dir.path().join("merged.pdf");

    merge_documents(&[&b, &a], &output).unwrap();

    assert_eq!(page_markers(&output), vec!["B1", "A1", "A2"]);
}

#[test]
fn test_merge_same_file_twice() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1"]);
    let output = dir.path().join("merged.pdf");

    merge_documents(&[&a, &a], &output).unwrap();

    assert_eq!(page_markers(&output), vec!["A1", "A1"]);
}

#[test]
fn test_merge_single_path_writes_nothing() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1"]);
    let output = dir.path().join("merged.pdf");

    let err = merge_documents(&[&a], &output).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!output.exists());
}

#[test]
fn test_merge_empty_list_is_validation_error() {
    let dir = scratch();
    let output = dir.path().join("merged.pdf");

    let err = merge_documents::<&str, _>(&[], &output).unwrap_err();
    assert!(matches!(err, PdfToolsError::NotEnoughDocuments { actual: 0, .. }));
}

#[test]
fn test_merge_unreadable_path_writes_nothing() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1"]);
    let missing = dir.path().join("does-not-exist.pdf");
    let output = dir.path().join("merged.pdf");

    let err = merge_documents(&[&a, &missing], &output).unwrap_err();

    assert!(matches!(err, PdfToolsError::FileNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!output.exists());
}

#[test]
fn test_merge_non_pdf_is_format_error() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1"]);
    let text = dir.path().join("notes.pdf");
    std::fs::write(&text, "just some text").unwrap();
    let output = dir.path().join("merged.pdf");

    let err = merge_documents(&[&a, &text], &output).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(!output.exists());
    assert_eq!(dir_entries(&dir), vec!["a.pdf", "notes.pdf"]);
}

#[test]
fn test_merge_keeps_inherited_resources() {
    let dir = scratch();

    // Resources and MediaBox live on the page tree node, not the page.
    let mut doc = Document::with_version("1.5");
    let image = add_rgb_image(&mut doc, 8, 8);
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id });
    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => image } },
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let inherited = save(&dir, "inherited.pdf", doc);

    let plain = pdf_with_markers(&dir, "plain.pdf", &["P1"]);
    let output = dir.path().join("merged.pdf");

    merge_documents(&[&inherited, &plain], &output).unwrap();

    let merged = Document::load(&output).unwrap();
    let first_page = *merged.get_pages().get(&1).unwrap();
    let page = merged.get_dictionary(first_page).unwrap();
    let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
    assert_eq!(media_box[3].as_i64().unwrap(), 400);

    let resources = match page.get(b"Resources").unwrap() {
        Object::Reference(id) => merged.get_dictionary(*id).unwrap(),
        Object::Dictionary(dict) => dict,
        other => panic!("unexpected Resources {other:?}"),
    };
    let xobjects = resources.get(b"XObject").and_then(Object::as_dict).unwrap();
    assert!(xobjects.has(b"Im0"));
}

#[test]
fn test_merge_shares_nothing_between_sources() {
    let dir = scratch();
    let mut doc = Document::with_version("1.5");
    let image = add_rgb_image(&mut doc, 4, 4);
    let with_image = save(
        &dir,
        "image.pdf",
        finish_document(doc, vec![image_page(&[("Im0", image)])]),
    );
    let output = dir.path().join("merged.pdf");

    let summary = DocumentMerger::new()
        .merge(&[&with_image, &with_image], output.as_path())
        .unwrap();
    assert_eq!(summary.total_pages, 2);

    // Each copy brings its own image object.
    assert_eq!(crate::common::image_dimensions(&output), vec![(4, 4), (4, 4)]);
}

#[test]
fn test_merge_bookmarks_one_per_source() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "first.pdf", &["A1", "A2"]);
    let b = pdf_with_markers(&dir, "second.pdf", &["B1"]);
    let output = dir.path().join("merged.pdf");

    let summary = DocumentMerger::with_options(MergeOptions { bookmarks: true })
        .merge(&[&a, &b], output.as_path())
        .unwrap();
    assert_eq!(summary.bookmarks_added, 2);

    let merged = Document::load(&output).unwrap();
    let pages = merged.get_pages();
    let outline_id = merged
        .catalog()
        .unwrap()
        .get(b"Outlines")
        .and_then(Object::as_reference)
        .unwrap();
    let outline = merged.get_dictionary(outline_id).unwrap();
    let last_id = outline.get(b"Last").and_then(Object::as_reference).unwrap();
    let last = merged.get_dictionary(last_id).unwrap();
    let dest = last.get(b"Dest").and_then(Object::as_array).unwrap();

    // "second.pdf" starts at page 3.
    assert_eq!(dest[0].as_reference().unwrap(), pages[&3]);
}

#[test]
fn test_merge_cancelled_writes_nothing() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A1"]);
    let b = pdf_with_markers(&dir, "b.pdf", &["B1"]);
    let output = dir.path().join("merged.pdf");

    struct CancelSecond(usize);
    impl pdftools::ProgressSink for CancelSecond {
        fn report(&mut self, _event: &pdftools::Progress<'_>) -> ControlFlow<()> {
            self.0 += 1;
            if self.0 >= 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    let err = DocumentMerger::new()
        .merge_with_progress(&[&a, &b], output.as_path(), &mut CancelSecond(0))
        .unwrap_err();
    assert!(matches!(err, PdfToolsError::Cancelled));
    assert!(!output.exists());
}
