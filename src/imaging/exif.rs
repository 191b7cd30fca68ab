//! Minimal EXIF reader: just the orientation tag.
//!
//! Extracts IFD0 tag `0x0112` (Orientation) from:
//! - JPEG: the APP1 segment starting with `Exif\0\0`, which wraps a TIFF block.
//! - TIFF: the file itself.
//!
//! The container is detected from the leading bytes, not the extension.
//! Anything unexpected (truncated data, wrong types, out-of-range values)
//! reads as "no orientation": a photo with broken EXIF still gets a
//! thumbnail, just without correction.

use std::path::Path;

const ORIENTATION_TAG: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Read the EXIF orientation value (1–8) of an image file, if it has one.
pub fn read_orientation(path: &Path) -> Option<u16> {
    let bytes = std::fs::read(path).ok()?;
    orientation_from_bytes(&bytes)
}

pub(crate) fn orientation_from_bytes(data: &[u8]) -> Option<u16> {
    let value = if data.starts_with(&[0xFF, 0xD8]) {
        orientation_from_tiff(find_jpeg_app1_exif(data)?)
    } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        orientation_from_tiff(data)
    } else {
        None
    }?;
    (1..=8).contains(&value).then_some(value)
}

// ---------------------------------------------------------------------------
// JPEG: locate the EXIF TIFF block inside APP1
// ---------------------------------------------------------------------------

/// Find the TIFF bytes inside a JPEG's `Exif` APP1 segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2; // past SOI
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];

        // Fill bytes before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS (0xDA) means image data starts, EOI (0xD9) means the end
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        // Markers without length field
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());

        if marker == 0xE1 {
            let segment = &data[seg_start..seg_end];
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return Some(tiff);
            }
        }

        pos += 2 + seg_len;
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF: walk IFD0 for the orientation tag
// ---------------------------------------------------------------------------

fn orientation_from_tiff(data: &[u8]) -> Option<u16> {
    if data.len() < 8 {
        return None;
    }

    // Determine byte order
    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes = [*data.get(offset)?, *data.get(offset + 1)?];
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };

    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    // Verify TIFF magic (42)
    if read_u16(2)? != 42 {
        return None;
    }

    let ifd_offset = read_u32(4)? as usize;
    let entry_count = read_u16(ifd_offset)? as usize;
    let entries_start = ifd_offset + 2;

    for i in 0..entry_count {
        let entry_offset = entries_start + i * 12;
        let tag = read_u16(entry_offset)?;
        if tag != ORIENTATION_TAG {
            continue;
        }
        let typ = read_u16(entry_offset + 2)?;
        let count = read_u32(entry_offset + 4)?;
        if typ != TYPE_SHORT || count == 0 {
            return None;
        }
        // A single SHORT is stored inline, left-justified in the value field.
        return read_u16(entry_offset + 8);
    }

    None
}
