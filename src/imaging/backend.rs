//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the one seam between the thumbnail cache and
//! pixel work. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the recording
//! [`MockBackend`](tests::MockBackend) so cache behaviour can be checked
//! without decoding anything.

use super::params::ThumbnailParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an encoded thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared by rayon workers during warm-up.
pub trait ImageBackend: Sync {
    /// Decode `params.source`, correct its orientation, fit it inside the
    /// bounding box and write the encoded result to `params.output`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError>;
}
