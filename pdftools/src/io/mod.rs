//! I/O operations for pdftools.
//!
//! This module handles all file I/O:
//! - Loading PDF documents from disk with I/O and format errors kept apart
//! - Writing finished documents in a single atomic step
//!
//! # Examples
//!
//! ```no_run
//! use pdftools::io::{PdfReader, PdfWriter};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut loaded = PdfReader::new().load(Path::new("input.pdf"))?;
//! PdfWriter::new().save(&mut loaded.document, Path::new("output.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics, format_file_size};
