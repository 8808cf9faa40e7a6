//! Image recompression.
//!
//! [`ImageRecompressor`] shrinks a PDF by downsampling every embedded raster
//! image and re-encoding it as baseline JPEG. Pages are visited in order and
//! each page's images are processed where they are referenced, so an image
//! shared by several pages is processed once per page it appears on. Image
//! payloads are replaced in place: object ids and every reference to them
//! stay the same.
//!
//! # Examples
//!
//! ```no_run
//! use pdftools::compress::ImageRecompressor;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let report = ImageRecompressor::new().compress(Path::new("in.pdf"), Path::new("out.pdf"))?;
//! println!("saved {} bytes ({:.1}%)", report.saved(), report.reduction_percent());
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod encode;
pub mod images;

pub use images::{ImageOccurrence, collect_occurrences};

use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::CompressionConfig;
use crate::error::{ImageLocation, PdfToolsError, Result};
use crate::io::{PdfReader, PdfWriter, WriteOptions};
use crate::progress::{Progress, ProgressSink, Silent, checkpoint};

/// Outcome of one recompression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    /// Size of the source file in bytes.
    pub original_size: u64,
    /// Size of the written file in bytes.
    pub compressed_size: u64,
}

impl CompressionReport {
    /// Bytes saved; negative when the output grew.
    pub fn saved(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }

    /// Whether the output is smaller than the source.
    pub fn is_reduced(&self) -> bool {
        self.compressed_size < self.original_size
    }

    /// Saved bytes as a percentage of the source size.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        self.saved() as f64 * 100.0 / self.original_size as f64
    }
}

/// Downsamples and re-encodes the images of a PDF.
#[derive(Debug, Clone, Default)]
pub struct ImageRecompressor {
    config: CompressionConfig,
    reader: PdfReader,
}

impl ImageRecompressor {
    /// Create a recompressor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recompressor with a custom configuration.
    ///
    /// The configuration is validated when [`compress`](Self::compress) runs.
    pub fn with_config(config: CompressionConfig) -> Self {
        Self {
            config,
            reader: PdfReader::new(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Recompress the images of `source` and write the result to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configuration is invalid (validation)
    /// - `source` cannot be read (I/O) or is not a usable PDF (format)
    /// - an image cannot be decoded, resized or re-encoded (decode)
    /// - `destination` cannot be written (I/O)
    ///
    /// Nothing is written to `destination` on error.
    pub fn compress(&self, source: &Path, destination: &Path) -> Result<CompressionReport> {
        self.compress_with_progress(source, destination, &mut Silent)
    }

    /// Like [`compress`](Self::compress), reporting each image occurrence.
    pub fn compress_with_progress(
        &self,
        source: &Path,
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<CompressionReport> {
        self.config.validate()?;

        let loaded = self.reader.load(source)?;
        let original_size = loaded.file_size;
        let mut doc = loaded.document;

        let occurrences = collect_occurrences(&doc);
        tracing::debug!(
            source = %source.display(),
            occurrences = occurrences.len(),
            "recompressing images"
        );

        let mut processed = 0usize;
        for occurrence in &occurrences {
            checkpoint(
                progress,
                Progress::ImageOccurrence {
                    page: occurrence.page,
                    object_id: occurrence.object_id,
                },
            )?;

            if let Some((from, to)) = self.recompress_image(&mut doc, *occurrence)? {
                processed += 1;
                checkpoint(
                    progress,
                    Progress::ImageProcessed {
                        page: occurrence.page,
                        object_id: occurrence.object_id,
                        from,
                        to,
                    },
                )?;
            }
        }

        let writer = PdfWriter::with_options(WriteOptions {
            compress: self.config.deflate,
            prune: self.config.garbage_collect,
            renumber: self.config.garbage_collect,
            ..Default::default()
        });
        let stats = writer.save_with_stats(&mut doc, destination)?;

        let report = CompressionReport {
            original_size,
            compressed_size: stats.file_size,
        };

        if report.is_reduced() {
            tracing::info!(
                images = processed,
                original = report.original_size,
                compressed = report.compressed_size,
                "compressed document"
            );
        } else {
            tracing::warn!(
                images = processed,
                original = report.original_size,
                compressed = report.compressed_size,
                "recompression did not reduce file size"
            );
        }

        Ok(report)
    }

    /// Recompress one occurrence. Returns the old and new dimensions, or
    /// `None` for stencil masks, which are left alone.
    fn recompress_image(
        &self,
        doc: &mut Document,
        occurrence: ImageOccurrence,
    ) -> Result<Option<((u32, u32), (u32, u32))>> {
        let location = ImageLocation::Object {
            page: occurrence.page,
            id: occurrence.object_id,
        };

        let stream = doc
            .get_object(occurrence.object_id)
            .and_then(Object::as_stream)
            .map_err(|e| PdfToolsError::image_decode(location.clone(), e))?;

        if decode::is_stencil_mask(&stream.dict) {
            tracing::debug!(%location, "skipping stencil mask");
            return Ok(None);
        }

        match decode::declared_dimensions(&stream.dict) {
            Some((width, height)) if width == 0 || height == 0 => {
                return Err(PdfToolsError::InvalidDimensions {
                    location,
                    width,
                    height,
                });
            }
            _ => {}
        }

        let image = decode::decode_image(doc, stream)
            .map_err(|e| PdfToolsError::image_decode(location.clone(), e))?;

        let from = (image.width(), image.height());
        let to = self.config.scaled_dimensions(from.0, from.1);
        if to.0 == 0 || to.1 == 0 {
            return Err(PdfToolsError::InvalidDimensions {
                location,
                width: to.0,
                height: to.1,
            });
        }

        let resized = image.resize_exact(to.0, to.1, self.config.filter.filter_type());
        let jpeg = encode::encode_jpeg(&resized, self.config.quality)
            .map_err(|e| PdfToolsError::image_encode(location.clone(), e))?;

        let stream = doc
            .get_object_mut(occurrence.object_id)
            .and_then(Object::as_stream_mut)
            .map_err(|e| PdfToolsError::image_decode(location.clone(), e))?;
        encode::replace_payload(stream, jpeg);

        tracing::debug!(%location, ?from, ?to, "recompressed image");
        Ok(Some((from, to)))
    }
}

/// Recompress the images of `source` into `destination` with the default
/// configuration (half size, JPEG quality 50).
///
/// # Errors
///
/// See [`ImageRecompressor::compress`].
pub fn compress_document<P, Q>(source: P, destination: Q) -> Result<CompressionReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    ImageRecompressor::new().compress(source.as_ref(), destination.as_ref())
}
