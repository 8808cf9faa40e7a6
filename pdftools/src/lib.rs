//! pdftools - Merge PDFs, shrink their embedded images, and build PDFs from
//! images.
//!
//! This library provides three document operations and the list type that
//! feeds them:
//!
//! - [`merge`]: concatenate two or more PDFs, in order, without re-encoding
//! - [`compress`]: downsample and re-encode embedded raster images as JPEG
//! - [`convert`]: one page per image, each page sized to its image
//! - [`list`]: a user-ordered, duplicate-free file list
//!
//! Every operation is synchronous, reads its inputs fully before touching the
//! destination, and writes the destination exactly once. On error nothing is
//! written.
//!
//! # Examples
//!
//! ## Basic Merge
//!
//! ```no_run
//! use pdftools::list::OrderedFileList;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut files = OrderedFileList::new();
//! files.add(["a.pdf", "b.pdf", "c.pdf"]);
//! files.reorder(["c.pdf", "a.pdf", "b.pdf"])?;
//!
//! pdftools::merge_documents(files.snapshot(), "merged.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Compression With Custom Settings
//!
//! ```no_run
//! use pdftools::compress::ImageRecompressor;
//! use pdftools::config::CompressionConfig;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompressionConfig {
//!     scale: 0.25,
//!     quality: 70,
//!     ..Default::default()
//! };
//! let report = ImageRecompressor::with_config(config)
//!     .compress(Path::new("scan.pdf"), Path::new("scan-small.pdf"))?;
//! println!("{} -> {} bytes", report.original_size, report.compressed_size);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compress;
pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod list;
pub mod merge;
pub mod progress;

// Re-export commonly used types
pub use compress::{CompressionReport, ImageRecompressor, compress_document};
pub use config::{CompressionConfig, MergeOptions, ResampleFilter};
pub use convert::{ConversionSummary, ImageToPdfConverter, convert_images_to_pdf};
pub use error::{ErrorKind, ImageLocation, PdfToolsError, Result};
pub use list::OrderedFileList;
pub use merge::{DocumentMerger, MergeSummary, merge_documents};
pub use progress::{CancelFlag, Progress, ProgressSink, Silent};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
