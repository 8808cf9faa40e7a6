//! Configuration for the document operations.
//!
//! Holds the tunables of the image recompressor and the merger. Every
//! structure has defaults matching the stock behaviour, and `validate()`
//! rejects values the engine cannot work with before any file is opened.

use image::imageops::FilterType;
use std::str::FromStr;

use crate::error::{PdfToolsError, Result};

/// Default linear scale applied to embedded images.
pub const DEFAULT_SCALE: f64 = 0.5;

/// Default JPEG quality for re-encoded images.
pub const DEFAULT_QUALITY: u8 = 50;

/// Resampling filter used when shrinking images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    /// Nearest neighbour. Fastest, blocky.
    Nearest,
    /// Linear (triangle) filter.
    Triangle,
    /// Cubic (Catmull-Rom) filter.
    CatmullRom,
    /// Gaussian filter.
    Gaussian,
    /// Lanczos with window 3. Highest quality.
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    /// Filter type understood by the `image` crate.
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    /// Name accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Triangle => "triangle",
            Self::CatmullRom => "catmull-rom",
            Self::Gaussian => "gaussian",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = PdfToolsError;

    /// Parse a filter name: "nearest", "triangle", "catmull-rom", "gaussian"
    /// or "lanczos3" ("lanczos" is accepted as well). Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "linear" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos" | "lanczos3" => Ok(Self::Lanczos3),
            _ => Err(PdfToolsError::invalid_config(format!(
                "Invalid resample filter: {s}. Must be one of: nearest, triangle, catmull-rom, gaussian, lanczos3"
            ))),
        }
    }
}

/// Settings for [`ImageRecompressor`](crate::compress::ImageRecompressor).
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    /// Linear scale applied to both image dimensions, in (0, 1].
    pub scale: f64,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Resampling filter.
    pub filter: ResampleFilter,
    /// Drop unreachable objects and renumber before saving.
    pub garbage_collect: bool,
    /// Deflate-compress streams that carry no filter yet.
    pub deflate: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            quality: DEFAULT_QUALITY,
            filter: ResampleFilter::default(),
            garbage_collect: true,
            deflate: true,
        }
    }
}

impl CompressionConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `scale` is not a finite number in (0, 1]
    /// - `quality` is outside 1-100
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 1.0 {
            return Err(PdfToolsError::invalid_config(format!(
                "Scale must be greater than 0 and at most 1, got {}",
                self.scale
            )));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(PdfToolsError::invalid_config(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        Ok(())
    }

    /// Target dimensions for an image of `width` x `height` pixels.
    ///
    /// Each side is floored, so the default scale of 0.5 is exact integer
    /// halving. The result may contain zeros; callers reject those.
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |side: u32| (f64::from(side) * self.scale).floor() as u32;
        (scale(width), scale(height))
    }
}

/// Settings for [`DocumentMerger`](crate::merge::DocumentMerger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    /// Add one outline entry per source document.
    pub bookmarks: bool,
}
