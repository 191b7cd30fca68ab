//! Image processing for thumbnails, pure Rust with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **EXIF orientation** | custom parser (JPEG APP1 + TIFF IFD0, tag `0x0112`) |
//! | **Rotate / mirror** | `DynamicImage::rotate90`/`rotate180`/`rotate270`, `fliph`/`flipv` |
//! | **Resize** | `resize_exact` with `Lanczos3`, dimensions from [`fit_within`] |
//! | **Encode** | JPEG at the configured quality; PNG/GIF/TIFF/WebP via their encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a thumbnail operation
//! - **Orientation**: The EXIF orientation table and how it is applied
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub(crate) mod exif;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_within, thumbnail_box};
pub use orientation::{Orientation, OrientationPolicy};
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::{RustBackend, output_format};
