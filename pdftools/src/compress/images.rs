//! Enumeration of embedded image occurrences.
//!
//! Images are found per page through the page's (possibly inherited)
//! `/Resources /XObject` dictionary, in the order the dictionary lists them.
//! Form XObjects are searched recursively. An image is reported once per page
//! it appears on, however many times that page references it.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// One page-level occurrence of an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOccurrence {
    /// 1-based page number.
    pub page: u32,
    /// Object id of the image stream.
    pub object_id: ObjectId,
}

/// All image occurrences in page order.
pub fn collect_occurrences(doc: &Document) -> Vec<ImageOccurrence> {
    let mut occurrences = Vec::new();

    for (page, page_id) in doc.get_pages() {
        let Some(resources) = page_resources(doc, page_id) else {
            continue;
        };

        let mut seen_images = HashSet::new();
        let mut seen_forms = HashSet::new();
        let mut images = Vec::new();
        visit_resources(doc, resources, &mut seen_images, &mut seen_forms, &mut images);

        tracing::debug!(page, images = images.len(), "enumerated page images");
        occurrences.extend(
            images
                .into_iter()
                .map(|object_id| ImageOccurrence { page, object_id }),
        );
    }

    occurrences
}

/// Resources of a page, walking up the page tree when the page has none.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut visited = HashSet::new();
    let mut node_id = page_id;

    loop {
        if !visited.insert(node_id) {
            return None;
        }
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(resources) = node.get(b"Resources") {
            return as_dictionary(doc, resources);
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
}

fn visit_resources(
    doc: &Document,
    resources: &Dictionary,
    seen_images: &mut HashSet<ObjectId>,
    seen_forms: &mut HashSet<ObjectId>,
    images: &mut Vec<ObjectId>,
) {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|xobjects| as_dictionary(doc, xobjects))
    else {
        return;
    };

    for (_name, value) in xobjects.iter() {
        // Image XObjects are always indirect streams.
        let Ok(id) = value.as_reference() else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                if seen_images.insert(id) {
                    images.push(id);
                }
            }
            Ok(b"Form") => {
                if !seen_forms.insert(id) {
                    continue;
                }
                if let Some(form_resources) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|resources| as_dictionary(doc, resources))
                {
                    visit_resources(doc, form_resources, seen_images, seen_forms, images);
                }
            }
            _ => {}
        }
    }
}

/// Resolve `object` to a dictionary, following one level of reference.
pub(crate) fn as_dictionary<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Follow `object` if it is a reference.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}
