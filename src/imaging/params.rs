//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`cache`](crate::cache) (which decides which
//! thumbnails to create and where) and the [`backend`](super::backend) (which
//! does the pixel work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing cache logic.

use super::orientation::OrientationPolicy;
use image::ImageFormat;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a thumbnail: orient, fit within a box, encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Where the encoded thumbnail is written. Its name carries no format
    /// information; `format` decides the encoder.
    pub output: PathBuf,
    pub format: ImageFormat,
    /// Bounding box. The result fits inside it with the source aspect ratio.
    pub max_width: u32,
    pub max_height: u32,
    pub quality: Quality,
    pub orientation: OrientationPolicy,
}
