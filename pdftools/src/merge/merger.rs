//! Core PDF merging implementation.
//!
//! Sources are opened in list order, renumbered into one shared id space and
//! their pages re-parented under a fresh page tree. Content streams and
//! resources are carried over as they are.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::MergeOptions;
use crate::error::{PdfToolsError, Result};
use crate::io::{PdfReader, PdfWriter, WriteOptions};
use crate::merge::bookmarks::BookmarkManager;
use crate::progress::{Progress, ProgressSink, Silent, checkpoint};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Summary of a finished merge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Number of source documents merged.
    pub files_merged: usize,

    /// Total number of pages in the output.
    pub total_pages: usize,

    /// Total size of the inputs in bytes.
    pub input_size: u64,

    /// Size of the written output in bytes.
    pub output_size: u64,

    /// Number of bookmarks added.
    pub bookmarks_added: usize,

    /// PDF version of the output.
    pub version: String,

    /// Wall-clock time for the whole merge.
    #[serde(skip)]
    pub merge_time: Duration,
}

/// PDF merger that concatenates documents in list order.
#[derive(Debug, Clone)]
pub struct DocumentMerger {
    reader: PdfReader,
    writer: PdfWriter,
    options: MergeOptions,
    bookmark_manager: BookmarkManager,
}

impl DocumentMerger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self::with_options(MergeOptions::default())
    }

    /// Create a merger with custom options.
    pub fn with_options(options: MergeOptions) -> Self {
        Self {
            reader: PdfReader::new(),
            writer: PdfWriter::with_options(WriteOptions {
                compress: false,
                ..Default::default()
            }),
            options,
            bookmark_manager: BookmarkManager::new(),
        }
    }

    /// Merge `paths`, in order, into `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - fewer than two paths are given (validation)
    /// - a source cannot be read (I/O)
    /// - a source is not a usable PDF (format)
    /// - the destination cannot be written (I/O)
    ///
    /// Nothing is written to `destination` on error.
    pub fn merge<P: AsRef<Path>>(&self, paths: &[P], destination: &Path) -> Result<MergeSummary> {
        self.merge_with_progress(paths, destination, &mut Silent)
    }

    /// Like [`merge`](Self::merge), reporting one event per loaded source.
    pub fn merge_with_progress<P: AsRef<Path>>(
        &self,
        paths: &[P],
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<MergeSummary> {
        let merge_start = Instant::now();

        if paths.len() < 2 {
            return Err(PdfToolsError::NotEnoughDocuments {
                required: 2,
                actual: paths.len(),
            });
        }

        let mut merged = self.assemble(paths, progress)?;
        let stats = self
            .writer
            .save_with_stats(&mut merged.document, destination)?;

        let summary = MergeSummary {
            files_merged: paths.len(),
            total_pages: merged.total_pages,
            input_size: merged.input_size,
            output_size: stats.file_size,
            bookmarks_added: merged.bookmarks_added,
            version: merged.document.version.clone(),
            merge_time: merge_start.elapsed(),
        };

        tracing::info!(
            files = summary.files_merged,
            pages = summary.total_pages,
            output = %destination.display(),
            "merged documents"
        );

        Ok(summary)
    }

    /// Build the merged document in memory.
    fn assemble<P: AsRef<Path>>(
        &self,
        paths: &[P],
        progress: &mut dyn ProgressSink,
    ) -> Result<Assembled> {
        let mut document = Document::with_version("1.4");
        let pages_id = document.new_object_id();
        let mut max_id = document.max_id;

        let mut version = parse_version(&document.version);
        let mut page_ids: Vec<ObjectId> = Vec::new();
        let mut first_pages: Vec<(PathBuf, ObjectId)> = Vec::with_capacity(paths.len());
        let mut input_size = 0;

        for (index, path) in paths.iter().enumerate() {
            let loaded = self.reader.load(path.as_ref())?;
            checkpoint(
                progress,
                Progress::DocumentLoaded {
                    index,
                    total: paths.len(),
                    path: &loaded.path,
                    pages: loaded.page_count,
                },
            )?;

            input_size += loaded.file_size;
            version = version.max(parse_version(&loaded.document.version));

            let mut doc = loaded.document;

            // Renumber objects to avoid ID conflicts
            doc.renumber_objects_with(max_id + 1);
            max_id = doc.max_id;

            let doc_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
            for &page_id in &doc_pages {
                materialize_inherited(&mut doc, page_id, &loaded.path)?;
            }

            if let Some(&first) = doc_pages.first() {
                first_pages.push((loaded.path, first));
            }
            page_ids.extend(doc_pages);

            document.objects.extend(doc.objects);
        }

        document.max_id = max_id;
        document.version = format!("{}.{}", version.0, version.1);

        for &page_id in &page_ids {
            if let Ok(Object::Dictionary(page)) = document.get_object_mut(page_id) {
                page.set("Parent", Object::Reference(pages_id));
            }
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        };
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer = Dictionary::new();
        document.trailer.set("Root", catalog_id);

        let bookmarks_added = if self.options.bookmarks {
            let sources: Vec<(&Path, ObjectId)> = first_pages
                .iter()
                .map(|(path, id)| (path.as_path(), *id))
                .collect();
            self.bookmark_manager
                .add_source_bookmarks(&mut document, &sources)?
        } else {
            0
        };

        Ok(Assembled {
            document,
            total_pages: page_ids.len(),
            input_size,
            bookmarks_added,
        })
    }
}

impl Default for DocumentMerger {
    fn default() -> Self {
        Self::new()
    }
}

struct Assembled {
    document: Document,
    total_pages: usize,
    input_size: u64,
    bookmarks_added: usize,
}

/// Copy inherited page attributes onto the page itself.
fn materialize_inherited(doc: &mut Document, page_id: ObjectId, path: &Path) -> Result<()> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfToolsError::corrupted_pdf(path.to_path_buf(), e.to_string()))?;

    let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut seen = HashSet::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    while let Some(node_id) = parent {
        if missing.is_empty() || !seen.insert(node_id) {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfToolsError::corrupted_pdf(path.to_path_buf(), e.to_string()))?;
    for (key, value) in inherited {
        page.set(key, value);
    }

    Ok(())
}

/// Parse a "major.minor" header version; unparsable parts count as 1.0.
fn parse_version(version: &str) -> (u32, u32) {
    let mut parts = version.trim().splitn(2, '.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}
