//! Error types for pdftools.
//!
//! Every operation in this crate returns [`Result`], and every failure is one
//! [`PdfToolsError`] variant. Variants are grouped into the broad categories of
//! [`ErrorKind`] so callers can decide presentation without matching on every
//! variant.
//!
//! # Error Categories
//!
//! - **Validation**: the input list or configuration is unusable
//! - **I/O**: a source cannot be read or the destination cannot be written
//! - **Format**: a file is not a PDF the engine can process
//! - **Decode**: an image payload cannot be decoded, resized or re-encoded

use lopdf::ObjectId;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for pdftools operations.
pub type Result<T> = std::result::Result<T, PdfToolsError>;

/// Broad category of a [`PdfToolsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Insufficient or invalid input list or configuration.
    Validation,
    /// A path could not be read or the destination could not be written.
    Io,
    /// Malformed or unsupported PDF structure.
    Format,
    /// Corrupt or unsupported image payload.
    Decode,
    /// The caller asked the operation to stop.
    Cancelled,
}

/// Where an image that failed to process lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    /// An image XObject inside a PDF, seen while visiting `page` (1-based).
    Object {
        /// Page on which the occurrence was visited.
        page: u32,
        /// Object id of the image stream.
        id: ObjectId,
    },
    /// A standalone image file.
    File(PathBuf),
}

impl fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object { page, id } => write!(f, "image {} {} R on page {page}", id.0, id.1),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Main error type for pdftools operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfToolsError {
    /// Fewer documents than an operation needs.
    #[error("At least {required} PDF files are required to merge, got {actual}")]
    NotEnoughDocuments {
        /// Minimum number of documents.
        required: usize,
        /// Number of documents supplied.
        actual: usize,
    },

    /// No images were supplied for conversion.
    #[error("No images specified for conversion")]
    NoImagesToConvert,

    /// A candidate ordering is not a permutation of the current list.
    #[error("Invalid ordering: {reason}")]
    InvalidOrder {
        /// What is wrong with the ordering.
        reason: String,
    },

    /// A selected index does not exist in the list.
    #[error("Index {index} is out of range for a list of {len} entries")]
    IndexOutOfRange {
        /// Offending index (0-based).
        index: usize,
        /// Length of the list at call time.
        len: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what is wrong.
        message: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Input file exists but could not be read.
    #[error("Cannot read file: {}\n  Reason: {source}", path.display())]
    FailedToRead {
        /// Path to the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Output could not be created, written or moved into place.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file could not be parsed as a PDF.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// PDF file is encrypted and cannot be processed.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// The PDF parsed but its structure is unusable.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", path.display())]
    CorruptedPdf {
        /// Path to the PDF.
        path: PathBuf,
        /// Details about the problem.
        details: String,
    },

    /// Image payload could not be decoded.
    #[error("Failed to decode {location}: {reason}")]
    ImageDecode {
        /// Which image failed.
        location: ImageLocation,
        /// Decoder message.
        reason: String,
    },

    /// Image could not be re-encoded.
    #[error("Failed to encode {location}: {reason}")]
    ImageEncode {
        /// Which image failed.
        location: ImageLocation,
        /// Encoder message.
        reason: String,
    },

    /// Image dimensions are invalid (zero, or collapse below one pixel).
    #[error("Invalid dimensions {width}x{height} for {location}")]
    InvalidDimensions {
        /// Which image failed.
        location: ImageLocation,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// Image file is in a format the converter does not accept.
    #[error("Unsupported image format for {}: {format}", path.display())]
    UnsupportedImageFormat {
        /// Path to the image file.
        path: PathBuf,
        /// Detected format, or "unknown".
        format: String,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl PdfToolsError {
    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an InvalidOrder error.
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            reason: reason.into(),
        }
    }

    /// Create an ImageDecode error.
    pub fn image_decode(location: ImageLocation, reason: impl fmt::Display) -> Self {
        Self::ImageDecode {
            location,
            reason: reason.to_string(),
        }
    }

    /// Create an ImageEncode error.
    pub fn image_encode(location: ImageLocation, reason: impl fmt::Display) -> Self {
        Self::ImageEncode {
            location,
            reason: reason.to_string(),
        }
    }

    /// Classify an I/O failure on an input path.
    pub fn from_read_error(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FailedToRead { path, source }
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEnoughDocuments { .. }
            | Self::NoImagesToConvert
            | Self::InvalidOrder { .. }
            | Self::IndexOutOfRange { .. }
            | Self::InvalidConfig { .. } => ErrorKind::Validation,
            Self::FileNotFound { .. } | Self::FailedToRead { .. } | Self::FailedToWrite { .. } => {
                ErrorKind::Io
            }
            Self::FailedToLoadPdf { .. } | Self::EncryptedPdf { .. } | Self::CorruptedPdf { .. } => {
                ErrorKind::Format
            }
            Self::ImageDecode { .. }
            | Self::ImageEncode { .. }
            | Self::InvalidDimensions { .. }
            | Self::UnsupportedImageFormat { .. } => ErrorKind::Decode,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FailedToWrite { .. } => 5,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            _ => match self.kind() {
                ErrorKind::Validation => 1,
                ErrorKind::Io => 2,
                ErrorKind::Format => 3,
                ErrorKind::Decode => 6,
                ErrorKind::Cancelled => 130,
            },
        }
    }
}
