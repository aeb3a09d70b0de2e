//! Geometric and tonal normalization: eye leveling and tone adjustment.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::detect::Face;

/// Rotate the image so the line through the pupils is parallel with the top
/// edge.
///
/// The canvas expands to the rotated bounding box and newly exposed margins
/// are fully transparent, which is what the adaptive crop later probes for.
/// The result is meaningless if the face's pupils were not both detected;
/// callers must check [`Face::pupils_located`] first.
pub fn rotate_to_level(image: &RgbaImage, face: &Face) -> RgbaImage {
    rotate_transparent(image, level_angle(face))
}

/// Counter-clockwise correction angle in radians that levels the eye line.
pub(crate) fn level_angle(face: &Face) -> f32 {
    let d_row = -((face.left_eye.row - face.right_eye.row) as f32);
    let d_col = -((face.left_eye.col - face.right_eye.col) as f32);
    d_row.atan2(d_col)
}

/// Rotate counter-clockwise by `angle` radians about the image center onto
/// an expanded, transparent canvas.
///
/// The source is centered on a diagonal-sized square (large enough to hold
/// it at any rotation), rotated there, and the result cut back down to the
/// rotated bounding box.
fn rotate_transparent(image: &RgbaImage, angle: f32) -> RgbaImage {
    let (width, height) = (image.width() as f32, image.height() as f32);
    let (sin, cos) = (angle.sin().abs(), angle.cos().abs());
    let out_width = (width * cos + height * sin).round() as u32;
    let out_height = (width * sin + height * cos).round() as u32;

    let diagonal = (width * width + height * height).sqrt().ceil() as u32;
    let transparent = Rgba([0u8, 0, 0, 0]);
    let mut canvas = RgbaImage::from_pixel(diagonal, diagonal, transparent);
    image::imageops::overlay(
        &mut canvas,
        image,
        ((diagonal - image.width()) / 2) as i64,
        ((diagonal - image.height()) / 2) as i64,
    );

    // rotate_about_center treats positive angles as clockwise.
    let rotated = rotate_about_center(&canvas, -angle, Interpolation::Bilinear, transparent);
    image::imageops::crop_imm(
        &rotated,
        (diagonal - out_width) / 2,
        (diagonal - out_height) / 2,
        out_width,
        out_height,
    )
    .to_image()
}

/// Apply brightness, contrast, and gamma adjustments, in that order, to the
/// color channels. Alpha is untouched.
///
/// `brightness` and `contrast` are percentages in -100..=100; `gamma` of 1.0
/// leaves the tone curve unchanged. Brightness 0, contrast 0, gamma 1.0 is
/// the identity transform.
pub fn tone_map(image: &RgbaImage, brightness: f64, contrast: f64, gamma: f64) -> RgbaImage {
    let lut = tone_lut(brightness, contrast, gamma);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([lut[r as usize], lut[g as usize], lut[b as usize], a]);
    }
    out
}

/// The three adjustments composed into a single channel lookup table.
/// Each stage is itself a byte-to-byte map, so composing them is exact.
fn tone_lut(brightness: f64, contrast: f64, gamma: f64) -> [u8; 256] {
    let shift = 255.0 * brightness / 100.0;
    let slope = (1.0 + contrast / 100.0).max(0.0);
    let exponent = 1.0 / gamma.max(1e-4);

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let mut v = (i as f64 + shift).clamp(0.0, 255.0);
        v = ((v - 127.5) * slope + 127.5).clamp(0.0, 255.0);
        v = 255.0 * (v / 255.0).powf(exponent);
        *entry = v.clamp(0.0, 255.0).round() as u8;
    }
    lut
}
