//! Pure Rust thumbnail backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader`, format sniffed from content |
//! | Orientation | custom [`exif`](super::exif) reader + [`Orientation::apply`] |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, box from [`fit_within`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → other | `DynamicImage::write_to` (PNG, GIF, TIFF, lossless WebP) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_within;
use super::exif;
use super::orientation::Orientation;
use super::params::{Quality, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::BufWriter;
use std::path::Path;

/// Extensions thumbnails can be written as, and the encoder each one uses.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// The encoder for a thumbnail artifact, chosen from its extension.
///
/// Artifacts mirror the photo's own path, so a `.png` photo gets a PNG
/// thumbnail. `None` if no encoder is compiled in for the extension.
pub fn output_format(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    OUTPUT_FORMATS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-step mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` as `format` into `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let mut writer = BufWriter::new(file);

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.value() as u8);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
        }
        other => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut writer, other)
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("{:?} encode failed: {}", other, e))
            }),
    }
}

impl ImageBackend for RustBackend {
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;

        let img = match exif::read_orientation(&params.source).and_then(Orientation::from_exif) {
            Some(orientation) => orientation.apply(img, params.orientation),
            None => img,
        };

        let (width, height) = fit_within(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        let img = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };

        save_image(&img, &params.output, params.format, params.quality)?;
        Ok(Dimensions { width, height })
    }
}
