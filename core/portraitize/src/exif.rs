//! EXIF-aware image decoding.
//!
//! Cameras record physical orientation in the EXIF `Orientation` tag rather
//! than rotating pixels. Decoding here applies that correction up front so
//! detection always sees upright faces. Missing or invalid metadata is never
//! fatal; the image just decodes as stored.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, RgbaImage};
use log::debug;

use crate::error::PortraitError;

/// Read the EXIF orientation tag from raw image bytes.
///
/// Returns `None` when the input carries no parsable EXIF block or no
/// orientation tag — the caller should leave the image as stored.
pub fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let data = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Apply an EXIF orientation value (1..=8) to an image. Unknown values
/// return the image unchanged.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Decode an encoded image buffer, correcting EXIF orientation when present.
pub fn decode_with_exif(bytes: &[u8]) -> Result<RgbaImage, PortraitError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| PortraitError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PortraitError::ZeroDimensions);
    }

    match read_orientation(bytes) {
        Some(orientation) if orientation > 1 => {
            debug!("applying EXIF orientation {orientation}");
            Ok(apply_orientation(image, orientation).into_rgba8())
        }
        Some(_) => Ok(image.into_rgba8()),
        None => {
            debug!("no EXIF orientation data; decoding as stored");
            Ok(image.into_rgba8())
        }
    }
}

/// Decode the image at `path`, correcting EXIF orientation when present.
pub fn decode_file_with_exif(path: impl AsRef<Path>) -> Result<RgbaImage, PortraitError> {
    let bytes = std::fs::read(path)?;
    decode_with_exif(&bytes)
}

/// Decode the image at `path` as stored, ignoring EXIF metadata.
pub fn decode_file(path: impl AsRef<Path>) -> Result<RgbaImage, PortraitError> {
    let image = image::open(path).map_err(|e| PortraitError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PortraitError::ZeroDimensions);
    }
    Ok(image.into_rgba8())
}
