//! EXIF orientation table and its application.
//!
//! Cameras record how the sensor was held in the EXIF `Orientation` tag
//! (values 1–8). Each value maps to a rotation and, for four of them, a
//! mirror:
//!
//! | Value | Mirror | Angle | Meaning |
//! |---|---|---|---|
//! | 1 | — | 0 | normal |
//! | 2 | horizontal | 0 | mirrored horizontally |
//! | 3 | — | 180 | rotated 180 |
//! | 4 | vertical | 0 | mirrored vertically |
//! | 5 | horizontal | 90 | mirrored horizontally, then rotated 90 CCW |
//! | 6 | — | −90 | rotated 90 CW |
//! | 7 | horizontal | −90 | mirrored horizontally, then rotated 90 CW |
//! | 8 | — | 90 | rotated 90 CCW |
//!
//! Angles are counter-clockwise degrees. Rotations by ±90 swap the canvas
//! dimensions; nothing is cropped.
//!
//! ## Policies
//!
//! Thumbnails have always been corrected for rotation only, which leaves
//! values 2, 4, 5 and 7 mirrored. [`OrientationPolicy::RotateOnly`] keeps
//! that behaviour and is the default, so existing caches stay consistent.
//! [`OrientationPolicy::Full`] applies the mirror first, then the rotation.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// How much of the orientation tag is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationPolicy {
    #[default]
    RotateOnly,
    Full,
}

/// One row of the orientation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    pub mirror_horizontal: bool,
    pub mirror_vertical: bool,
    /// Counter-clockwise rotation in degrees: 0, 90, 180 or -90.
    pub angle: i16,
}

const fn row(mirror_horizontal: bool, mirror_vertical: bool, angle: i16) -> Orientation {
    Orientation {
        mirror_horizontal,
        mirror_vertical,
        angle,
    }
}

/// Indexed by EXIF value - 1.
const ORIENTATIONS: [Orientation; 8] = [
    row(false, false, 0),
    row(true, false, 0),
    row(false, false, 180),
    row(false, true, 0),
    row(true, false, 90),
    row(false, false, -90),
    row(true, false, -90),
    row(false, false, 90),
];

impl Orientation {
    /// Look up an EXIF orientation value. Values outside 1–8 are unknown.
    pub fn from_exif(value: u16) -> Option<Self> {
        let index = usize::from(value).checked_sub(1)?;
        ORIENTATIONS.get(index).copied()
    }

    pub fn is_mirrored(self) -> bool {
        self.mirror_horizontal || self.mirror_vertical
    }

    /// Correct `img` according to this orientation and `policy`.
    pub fn apply(self, img: DynamicImage, policy: OrientationPolicy) -> DynamicImage {
        let img = match policy {
            OrientationPolicy::RotateOnly => img,
            OrientationPolicy::Full => {
                let img = if self.mirror_horizontal { img.fliph() } else { img };
                if self.mirror_vertical { img.flipv() } else { img }
            }
        };

        match self.angle {
            90 => img.rotate270(),
            -90 => img.rotate90(),
            180 => img.rotate180(),
            _ => img,
        }
    }
}
