//! PDF merging operations.
//!
//! This module concatenates documents with:
//! - Order preservation (list order, then page order within each source)
//! - Quality preservation (streams are never re-encoded)
//! - Optional per-source bookmarks
//!
//! # Examples
//!
//! ```no_run
//! use pdftools::merge::DocumentMerger;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = DocumentMerger::new().merge(&["a.pdf", "b.pdf"], Path::new("merged.pdf"))?;
//! println!("Merged {} pages", summary.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod bookmarks;
pub mod merger;

pub use bookmarks::BookmarkManager;
pub use merger::{DocumentMerger, MergeSummary};

use crate::error::Result;
use std::path::Path;

/// Merge `paths`, in order, into a new PDF at `destination`.
///
/// Convenience function using the default [`DocumentMerger`].
///
/// # Errors
///
/// Fails with a validation error for fewer than two paths, an I/O error for
/// unreadable sources or an unwritable destination, and a format error for
/// sources that are not usable PDFs. Nothing is written on error.
pub fn merge_documents<P, Q>(paths: &[P], destination: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    DocumentMerger::new()
        .merge(paths, destination.as_ref())
        .map(|_| ())
}
