//! Shared fixtures: a synthetic "face" is a white canvas with two dark pupil
//! discs, and the test classifier reports one candidate centered on them.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{GrayImage, Rgba, RgbaImage};
use portraitize::classifier::{
    Detection, FaceClassifier, PupilLocation, PupilLocator, PupilSeed, ScanWindow,
};

/// Face scale reported by the test classifier. The pupil seeds derived from
/// it land next to blobs painted `EYE_SEPARATION` apart.
pub const FACE_SCALE: i32 = 160;

/// Pupil blob spacing matching the locator's seed offsets for `FACE_SCALE`.
pub const EYE_SEPARATION: i32 = 60;

/// Pupil blob radius, sized to the locator's probe disc.
pub const BLOB_RADIUS: i32 = 8;

/// Reports one face candidate centered on the image's dark pixels, or
/// nothing for an image without any. Robust to rotation, which is what the
/// pipeline's second detection pass needs.
pub struct DarkCentroidClassifier;

impl FaceClassifier for DarkCentroidClassifier {
    fn detect_faces(&self, image: &GrayImage, _scan: &ScanWindow) -> Vec<Detection> {
        let mut count = 0u64;
        let mut row_sum = 0u64;
        let mut col_sum = 0u64;
        for (x, y, pixel) in image.enumerate_pixels() {
            // Transparent margins read as zero in the gray view; the blobs
            // are painted at 10, so exact zeros are not pupil pixels.
            if pixel.0[0] > 0 && pixel.0[0] < 128 {
                count += 1;
                row_sum += y as u64;
                col_sum += x as u64;
            }
        }
        if count == 0 {
            return Vec::new();
        }
        vec![Detection {
            row: (row_sum / count) as i32,
            col: (col_sum / count) as i32,
            scale: FACE_SCALE,
            score: 4.0,
        }]
    }
}

/// A pupil capability that never finds anything.
pub struct BlindPupilLocator;

impl PupilLocator for BlindPupilLocator {
    fn locate_pupil(&self, _image: &GrayImage, _seed: &PupilSeed) -> PupilLocation {
        PupilLocation::undetected()
    }
}

/// White canvas with two dark pupil discs at (row, col) positions.
pub fn face_image(width: u32, height: u32, left: (i32, i32), right: (i32, i32)) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    for (row, col) in [left, right] {
        paint_blob(&mut image, row, col, BLOB_RADIUS);
    }
    image
}

fn paint_blob(image: &mut RgbaImage, row: i32, col: i32, radius: i32) {
    for r in (row - radius)..=(row + radius) {
        for c in (col - radius)..=(col + radius) {
            let (dr, dc) = (r - row, c - col);
            if dr * dr + dc * dc <= radius * radius
                && r >= 0
                && c >= 0
                && (r as u32) < image.height()
                && (c as u32) < image.width()
            {
                image.put_pixel(c as u32, r as u32, Rgba([10, 10, 10, 255]));
            }
        }
    }
}

/// Centroids of dark pixels on the left and right halves of an image, as
/// (row, col) pairs — recovers the pupil positions from a converted
/// portrait.
pub fn dark_centroids(image: &RgbaImage) -> ((f64, f64), (f64, f64)) {
    let mid = image.width() / 2;
    let mut halves = [(0u64, 0u64, 0u64); 2];
    for (x, y, pixel) in image.enumerate_pixels() {
        // Fully opaque darks only: resampling fringes at the content edge
        // are semi-transparent and must not count as pupil pixels.
        if pixel.0[0] < 128 && pixel.0[3] == 255 {
            let half = &mut halves[usize::from(x >= mid)];
            half.0 += 1;
            half.1 += y as u64;
            half.2 += x as u64;
        }
    }
    let centroid = |(count, rows, cols): (u64, u64, u64)| {
        assert!(count > 0, "no dark pixels in half");
        (rows as f64 / count as f64, cols as f64 / count as f64)
    };
    (centroid(halves[0]), centroid(halves[1]))
}

/// Eye-line tilt in degrees recovered from a converted portrait.
pub fn recovered_tilt_degrees(image: &RgbaImage) -> f64 {
    let ((left_row, left_col), (right_row, right_col)) = dark_centroids(image);
    (right_row - left_row).atan2(right_col - left_col).to_degrees()
}

/// Fresh per-test scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portraitize_{tag}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write an image as PNG under `dir`, creating the directory if needed.
pub fn write_png(image: &RgbaImage, dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}
