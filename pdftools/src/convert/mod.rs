//! Image-to-PDF conversion.
//!
//! [`ImageToPdfConverter`] builds a document with one page per image, in list
//! order. Each page's media box is exactly the image's pixel size, one point
//! per pixel, and the image is drawn to fill it.

pub mod embed;

pub use embed::{EmbeddedImage, embed_image_file};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use serde::Serialize;
use std::path::Path;

use crate::error::{ImageLocation, PdfToolsError, Result};
use crate::io::{PdfWriter, WriteOptions};
use crate::progress::{Progress, ProgressSink, Silent, checkpoint};

/// Resource name of the image on every generated page.
const IMAGE_NAME: &str = "Im0";

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    /// Number of pages written, one per image.
    pub pages: usize,
    /// Size of the written output in bytes.
    pub output_size: u64,
}

/// Builds PDFs from image files.
#[derive(Debug, Clone)]
pub struct ImageToPdfConverter {
    writer: PdfWriter,
}

impl ImageToPdfConverter {
    /// Create a converter with default settings.
    pub fn new() -> Self {
        Self {
            writer: PdfWriter::with_options(WriteOptions::default()),
        }
    }

    /// Convert `paths`, in order, into a PDF at `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `paths` is empty (validation)
    /// - an image cannot be read (I/O)
    /// - an image is corrupt or not PNG, JPEG, BMP or GIF (decode)
    /// - `destination` cannot be written (I/O)
    ///
    /// Nothing is written to `destination` on error.
    pub fn convert<P: AsRef<Path>>(
        &self,
        paths: &[P],
        destination: &Path,
    ) -> Result<ConversionSummary> {
        self.convert_with_progress(paths, destination, &mut Silent)
    }

    /// Like [`convert`](Self::convert), reporting one event per placed image.
    pub fn convert_with_progress<P: AsRef<Path>>(
        &self,
        paths: &[P],
        destination: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<ConversionSummary> {
        if paths.is_empty() {
            return Err(PdfToolsError::NoImagesToConvert);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let embedded = embed_image_file(path)?;
            let (width, height) = (embedded.width, embedded.height);

            let page_id = add_image_page(&mut doc, pages_id, embedded, path)?;
            kids.push(page_id.into());

            checkpoint(
                progress,
                Progress::ImagePlaced {
                    index,
                    total: paths.len(),
                    path,
                    width,
                    height,
                },
            )?;
            tracing::debug!(path = %path.display(), width, height, "placed image");
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let stats = self.writer.save_with_stats(&mut doc, destination)?;
        tracing::info!(
            pages = page_count,
            output = %destination.display(),
            "converted images"
        );

        Ok(ConversionSummary {
            pages: page_count,
            output_size: stats.file_size,
        })
    }
}

impl Default for ImageToPdfConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Add the image and a page showing it full-size; returns the page id.
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    embedded: EmbeddedImage,
    path: &Path,
) -> Result<ObjectId> {
    let EmbeddedImage {
        width,
        height,
        mut image,
        soft_mask,
    } = embedded;

    if let Some(mask) = soft_mask {
        let mask_id = doc.add_object(mask);
        image.dict.set("SMask", Object::Reference(mask_id));
    }
    let image_id = doc.add_object(image);

    let (w, h) = (i64::from(width), i64::from(height));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content = content
        .encode()
        .map_err(|e| PdfToolsError::image_encode(ImageLocation::File(path.to_path_buf()), e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
    }))
}

/// Convert `paths`, in order, into a new PDF at `destination`, one page per
/// image.
///
/// # Errors
///
/// See [`ImageToPdfConverter::convert`].
pub fn convert_images_to_pdf<P, Q>(paths: &[P], destination: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    ImageToPdfConverter::new()
        .convert(paths, destination.as_ref())
        .map(|_| ())
}
