//! Integration tests for the ordered file list feeding the operations.

use pdftools::{OrderedFileList, PdfToolsError, merge_documents};
use std::path::PathBuf;

use crate::common::{page_markers, pdf_with_markers, scratch};

#[test]
fn test_list_drives_merge_order() {
    let dir = scratch();
    let a = pdf_with_markers(&dir, "a.pdf", &["A"]);
    let b = pdf_with_markers(&dir, "b.pdf", &["B"]);
    let c = pdf_with_markers(&dir, "c.pdf", &["C"]);
    let output = dir.path().join("merged.pdf");

    let mut list = OrderedFileList::new();
    list.add([&a, &b, &c, &a]);
    list.remove(&[1]).unwrap();
    list.reorder([&c, &a]).unwrap();

    merge_documents(list.snapshot(), &output).unwrap();

    assert_eq!(page_markers(&output), vec!["C", "A"]);
}

#[test]
fn test_failed_edits_leave_list_intact() {
    let mut list: OrderedFileList = ["x.pdf", "y.pdf", "z.pdf"].into_iter().collect();
    let before: Vec<PathBuf> = list.snapshot().to_vec();

    assert!(matches!(
        list.remove(&[0, 7]),
        Err(PdfToolsError::IndexOutOfRange { index: 7, len: 3 })
    ));
    assert!(matches!(
        list.reorder(["z.pdf", "y.pdf"]),
        Err(PdfToolsError::InvalidOrder { .. })
    ));
    assert!(matches!(
        list.reorder(["z.pdf", "y.pdf", "x.pdf", "w.pdf"]),
        Err(PdfToolsError::InvalidOrder { .. })
    ));

    assert_eq!(list.snapshot(), before.as_slice());
}

#[test]
fn test_adding_same_path_twice_keeps_single_entry() {
    let mut list = OrderedFileList::new();
    list.add(["/scans/one.pdf"]);
    list.add(["/scans/two.pdf", "/scans/one.pdf"]);

    assert_eq!(list.len(), 2);
    assert_eq!(list.snapshot()[0], PathBuf::from("/scans/one.pdf"));
}
