//! PDF reading and loading operations.
//!
//! Documents are read fully into memory before parsing, so no file handle
//! outlives [`PdfReader::load`]. The returned [`LoadedPdf`] owns its
//! document; dropping it releases everything.
//!
//! # Examples
//!
//! ```no_run
//! use pdftools::io::PdfReader;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = PdfReader::new().load(Path::new("a.pdf"))?;
//! println!("{} pages, {} bytes", loaded.page_count, loaded.file_size);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{PdfToolsError, Result};

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to load the document.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

/// PDF reader with configurable loading behavior.
#[derive(Debug, Clone)]
pub struct PdfReader {
    /// Whether to reject documents without pages.
    verify: bool,
}

impl PdfReader {
    /// Create a new PDF reader with default settings.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Create a reader that accepts documents without pages.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Load a single PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read (I/O)
    /// - File is not a valid PDF (format)
    /// - PDF is encrypted (format)
    /// - PDF has no pages while verification is on (format)
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let path_buf = path.to_path_buf();
        let start = Instant::now();

        let bytes = std::fs::read(path)
            .map_err(|e| PdfToolsError::from_read_error(path_buf.clone(), e))?;
        let file_size = bytes.len() as u64;

        let document = Document::load_mem(&bytes).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                PdfToolsError::EncryptedPdf {
                    path: path_buf.clone(),
                }
            } else {
                PdfToolsError::failed_to_load_pdf(path_buf.clone(), err_msg)
            }
        })?;

        if document.is_encrypted() {
            return Err(PdfToolsError::EncryptedPdf { path: path_buf });
        }

        let page_count = document.get_pages().len();
        if self.verify && page_count == 0 {
            return Err(PdfToolsError::corrupted_pdf(path_buf, "PDF has no pages"));
        }

        let load_time = start.elapsed();
        tracing::debug!(
            path = %path_buf.display(),
            pages = page_count,
            bytes = file_size,
            ?load_time,
            "loaded PDF"
        );

        Ok(LoadedPdf {
            document,
            path: path_buf,
            page_count,
            load_time,
            file_size,
        })
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}
