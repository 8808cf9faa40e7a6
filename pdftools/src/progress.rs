//! Progress reporting and cancellation.
//!
//! Long-running operations call a [`ProgressSink`] at their natural
//! checkpoints: once per source document, once per image occurrence and once
//! per converted image. Returning [`ControlFlow::Break`] from
//! [`ProgressSink::report`] stops the operation with
//! [`PdfToolsError::Cancelled`](crate::PdfToolsError::Cancelled) before
//! anything is written.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lopdf::ObjectId;

use crate::error::{PdfToolsError, Result};

/// A checkpoint reached by an operation.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// A source PDF was opened (merge).
    DocumentLoaded {
        /// 0-based position in the input list.
        index: usize,
        /// Number of inputs.
        total: usize,
        /// Source path.
        path: &'a Path,
        /// Pages in the source.
        pages: usize,
    },
    /// An image occurrence is about to be recompressed.
    ImageOccurrence {
        /// 1-based page number.
        page: u32,
        /// Image stream object id.
        object_id: ObjectId,
    },
    /// An image occurrence was recompressed.
    ImageProcessed {
        /// 1-based page number.
        page: u32,
        /// Image stream object id.
        object_id: ObjectId,
        /// Dimensions before.
        from: (u32, u32),
        /// Dimensions after.
        to: (u32, u32),
    },
    /// An image file became a page (convert).
    ImagePlaced {
        /// 0-based position in the input list.
        index: usize,
        /// Number of inputs.
        total: usize,
        /// Image path.
        path: &'a Path,
        /// Page width in points.
        width: u32,
        /// Page height in points.
        height: u32,
    },
}

/// Receiver for [`Progress`] events.
pub trait ProgressSink {
    /// Handle one event. Return `ControlFlow::Break(())` to cancel.
    fn report(&mut self, event: &Progress<'_>) -> ControlFlow<()>;
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressSink for Silent {
    fn report(&mut self, _event: &Progress<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Sink that cancels once a shared flag is raised.
///
/// The flag is usually set from a signal handler on another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag.
    pub fn from_shared(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Shared handle to the underlying flag.
    pub fn shared(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl ProgressSink for CancelFlag {
    fn report(&mut self, _event: &Progress<'_>) -> ControlFlow<()> {
        if self.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, event: &Progress<'_>) -> ControlFlow<()> {
        (**self).report(event)
    }
}

/// Deliver `event` and turn a cancellation into an error.
pub(crate) fn checkpoint(sink: &mut dyn ProgressSink, event: Progress<'_>) -> Result<()> {
    match sink.report(&event) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => {
            tracing::debug!(?event, "cancelled at checkpoint");
            Err(PdfToolsError::Cancelled)
        }
    }
}
