//! PDF writing and saving operations.
//!
//! Every operation writes its output exactly once, at the end. With atomic
//! writes enabled (the default) the document is serialized into a temporary
//! file in the destination directory and renamed over the destination, so a
//! failure never leaves a partial file behind.
//!
//! # Examples
//!
//! ```no_run
//! use pdftools::io::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # fn example(mut doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let stats = PdfWriter::new().save_with_stats(&mut doc, Path::new("output.pdf"))?;
//! println!("wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::{Builder, NamedTempFile};

use crate::error::{PdfToolsError, Result};

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Deflate streams that carry no filter yet.
    pub compress: bool,

    /// Drop objects unreachable from the trailer.
    pub prune: bool,

    /// Renumber objects densely from 1.
    pub renumber: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            prune: true,
            renumber: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Number of objects dropped as unreachable.
    pub pruned_objects: usize,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// The options this writer applies.
    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Save a PDF document to a file.
    ///
    /// # Errors
    ///
    /// Returns [`PdfToolsError::FailedToWrite`] if the destination directory
    /// does not exist, is not writable, or the write itself fails.
    pub fn save(&self, doc: &mut Document, path: &Path) -> Result<()> {
        self.save_with_stats(doc, path).map(|_| ())
    }

    /// Save a PDF and return statistics about the operation.
    ///
    /// The document is optimized in place according to the options before
    /// serialization.
    pub fn save_with_stats(&self, doc: &mut Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();
        let options = &self.options;

        let pruned_objects = if options.prune {
            doc.prune_objects().len()
        } else {
            0
        };
        if options.renumber {
            doc.renumber_objects();
        }
        if options.compress {
            doc.compress();
        }

        if options.atomic {
            self.write_atomic(doc, path)?;
        } else {
            let file = std::fs::File::create(path).map_err(|e| write_error(path, e))?;
            self.write_to(doc, file, path)?;
        }

        let file_size = std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| write_error(path, e))?;
        let write_time = start.elapsed();

        tracing::debug!(
            path = %path.display(),
            bytes = file_size,
            pruned_objects,
            ?write_time,
            "wrote PDF"
        );

        Ok(WriteStatistics {
            write_time,
            file_size,
            output_path: path.to_path_buf(),
            pruned_objects,
        })
    }

    fn write_atomic(&self, doc: &mut Document, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = temp_file_in(parent).map_err(|e| write_error(path, e))?;
        self.write_to(doc, temp.as_file_mut(), path)?;

        // Dropping the temp file on an error path removes it.
        temp.persist(path).map_err(|e| write_error(path, e.error))?;
        Ok(())
    }

    fn write_to(&self, doc: &mut Document, file: impl Write, path: &Path) -> Result<()> {
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, file);
        doc.save_to(&mut writer)
            .map_err(|e| write_error(path, std::io::Error::other(e)))?;
        writer.flush().map_err(|e| write_error(path, e))
    }
}

/// Temporary file that ends up with the mode `File::create` would give it.
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".pdftools");

    // The kernel applies the umask to the requested mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    builder.tempfile_in(dir)
}

fn write_error(path: &Path, source: std::io::Error) -> PdfToolsError {
    PdfToolsError::FailedToWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
