//! Bookmark (outline) management for merged documents.
//!
//! Adds one top-level outline entry per source document, titled with the
//! source file name and pointing at the first page that source contributed.

use crate::error::{PdfToolsError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::path::Path;

/// Manager for PDF bookmarks (outlines).
#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarkManager;

impl BookmarkManager {
    /// Create a new bookmark manager.
    pub fn new() -> Self {
        Self
    }

    /// Add one bookmark per source.
    ///
    /// `sources` pairs each source path with the id of its first page in
    /// `doc`. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no catalog.
    pub fn add_source_bookmarks(
        &self,
        doc: &mut Document,
        sources: &[(&Path, ObjectId)],
    ) -> Result<usize> {
        if sources.is_empty() {
            return Ok(0);
        }

        let items: Vec<(String, ObjectId)> = sources
            .iter()
            .map(|(path, page_id)| (bookmark_title(path), *page_id))
            .collect();

        self.create_outline_structure(doc, &items)?;
        Ok(items.len())
    }

    /// Create the PDF outline structure.
    fn create_outline_structure(
        &self,
        doc: &mut Document,
        items: &[(String, ObjectId)],
    ) -> Result<()> {
        let outline_id = doc.new_object_id();

        let item_ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();

        for (i, ((title, page_id), &item_id)) in items.iter().zip(&item_ids).enumerate() {
            // [page /XYZ null null null]
            let dest = vec![
                Object::Reference(*page_id),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ];

            let mut item_dict = Dictionary::new();
            item_dict.set(
                "Title",
                Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
            );
            item_dict.set("Parent", Object::Reference(outline_id));
            item_dict.set("Dest", Object::Array(dest));
            if i > 0 {
                item_dict.set("Prev", Object::Reference(item_ids[i - 1]));
            }
            if let Some(&next) = item_ids.get(i + 1) {
                item_dict.set("Next", Object::Reference(next));
            }

            doc.objects.insert(item_id, Object::Dictionary(item_dict));
        }

        let mut outline_dict = Dictionary::new();
        outline_dict.set("Type", Object::Name(b"Outlines".to_vec()));
        outline_dict.set("Count", Object::Integer(item_ids.len() as i64));
        if let (Some(&first), Some(&last)) = (item_ids.first(), item_ids.last()) {
            outline_dict.set("First", Object::Reference(first));
            outline_dict.set("Last", Object::Reference(last));
        }
        doc.objects
            .insert(outline_id, Object::Dictionary(outline_dict));

        let catalog = doc.catalog_mut().map_err(|e| {
            PdfToolsError::corrupted_pdf("merged document".into(), format!("no catalog: {e}"))
        })?;
        catalog.set("Outlines", Object::Reference(outline_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

        Ok(())
    }

    /// Check if a document has bookmarks.
    pub fn has_bookmarks(&self, doc: &Document) -> bool {
        doc.catalog()
            .map(|catalog| catalog.has(b"Outlines"))
            .unwrap_or(false)
    }
}

fn bookmark_title(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}
