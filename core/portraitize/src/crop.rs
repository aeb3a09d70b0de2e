//! Adaptive portrait crop.
//!
//! Leveling a tilted photo exposes transparent margins at the canvas edges.
//! The crop keeps a fixed aspect ratio, centers on the eye line, and bisects
//! the width range to find the widest rectangle whose corners all land on
//! opaque pixels.

use image::RgbaImage;

use crate::detect::Face;

/// Downward shift of the crop center, as a fraction of the maximum candidate
/// crop height. Balances chin and forehead framing.
const CENTER_DROP: f64 = 0.1;

/// Crop the image to the widest aspect-locked rectangle around the face that
/// avoids transparent corners.
///
/// The crop center is the eye midpoint, shifted down by 10% of the maximum
/// candidate height. Widths are searched in
/// `[face.scale, face.scale * max_width_ratio]`; height is always
/// `width / aspect_ratio`. The result is the widest all-corners-opaque
/// rectangle reachable by bisection — corner sampling can miss a transparent
/// notch elsewhere on the boundary, which is accepted.
pub fn adaptive_crop(
    image: &RgbaImage,
    face: &Face,
    aspect_ratio: f64,
    max_width_ratio: f64,
) -> RgbaImage {
    let aspect = 1.0 / aspect_ratio;
    let min_width = face.detection.scale;
    let max_width = (min_width as f64 * max_width_ratio) as i32;
    let max_height = (max_width as f64 * aspect) as i32;

    let col = (face.left_eye.col + face.right_eye.col) / 2;
    let row = (face.left_eye.row + face.right_eye.row) / 2 + (max_height as f64 * CENTER_DROP) as i32;

    let width = widest_opaque_width(image, col, row, min_width, max_width, aspect);
    let height = (width as f64 * aspect) as i32;
    crop_centered(image, col, row, width, height)
}

/// Bisect `[min_width, max_width]` for the widest width whose aspect-locked
/// rectangle centered at (`col`, `row`) has four opaque corners.
///
/// `min_width` is assumed good and is returned when the bracket collapses
/// onto it.
pub(crate) fn widest_opaque_width(
    image: &RgbaImage,
    col: i32,
    row: i32,
    mut min_width: i32,
    mut max_width: i32,
    aspect: f64,
) -> i32 {
    let height_for = |width: i32| (width as f64 * aspect) as i32;

    if corners_opaque(image, col, row, max_width, height_for(max_width)) {
        return max_width;
    }
    loop {
        let width = (max_width + min_width) / 2;
        if width == min_width {
            return width;
        }
        if corners_opaque(image, col, row, width, height_for(width)) {
            min_width = width;
        } else {
            max_width = width;
        }
    }
}

/// Whether all four corners of the rectangle centered at (`col`, `row`) are
/// opaque. Corners outside the image count as transparent.
pub(crate) fn corners_opaque(image: &RgbaImage, col: i32, row: i32, width: i32, height: i32) -> bool {
    let (half_w, half_h) = (width / 2, height / 2);
    [
        (col - half_w, row - half_h),
        (col + half_w, row - half_h),
        (col - half_w, row + half_h),
        (col + half_w, row + half_h),
    ]
    .into_iter()
    .all(|(c, r)| pixel_opaque(image, c, r))
}

fn pixel_opaque(image: &RgbaImage, col: i32, row: i32) -> bool {
    if col < 0 || row < 0 || col >= image.width() as i32 || row >= image.height() as i32 {
        return false;
    }
    image.get_pixel(col as u32, row as u32).0[3] != 0
}

/// Cut the rectangle centered at (`col`, `row`), clamped to the image.
fn crop_centered(image: &RgbaImage, col: i32, row: i32, width: i32, height: i32) -> RgbaImage {
    let x = (col - width / 2).max(0) as u32;
    let y = (row - height / 2).max(0) as u32;
    image::imageops::crop_imm(image, x, y, width.max(0) as u32, height.max(0) as u32).to_image()
}
