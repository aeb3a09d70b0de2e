//! Built-in pupil refinement.
//!
//! Pupils are the darkest compact structure in the eye region, so refinement
//! searches the seed neighborhood for the darkest small disc. A bounded
//! random-restart sweep keeps the search out of local minima such as
//! eyebrow shadows.

use image::GrayImage;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::classifier::{PupilLocation, PupilLocator, PupilSeed};

/// Probe disc radius as a fraction of the seed scale.
const DISC_RADIUS_FACTOR: f32 = 0.12;

/// Restart jitter envelope around the seed, as a fraction of the seed scale.
const JITTER_FACTOR: f32 = 0.25;

/// Centroid polish iteration cap and convergence distance.
const POLISH_STEPS: u32 = 5;
const POLISH_EPSILON: f32 = 0.5;

/// Pupil refinement by darkest-disc search.
///
/// Evaluates the seed position plus `perturbs` jittered restarts, scoring
/// each candidate by the mean intensity of a small disc around it; the
/// darkest disc wins and is polished onto its darkness-weighted centroid,
/// iterated until the centroid stops moving. The jitter sequence is derived
/// from the seed position, so a given seed always refines to the same
/// location.
#[derive(Debug, Default)]
pub struct IntensityPupilLocator;

impl IntensityPupilLocator {
    /// Create the locator.
    pub fn new() -> Self {
        Self
    }
}

impl PupilLocator for IntensityPupilLocator {
    fn locate_pupil(&self, image: &GrayImage, seed: &PupilSeed) -> PupilLocation {
        let (width, height) = (image.width() as f32, image.height() as f32);
        if seed.row < 0.0 || seed.col < 0.0 || seed.row >= height || seed.col >= width {
            return PupilLocation::undetected();
        }

        let radius = (seed.scale * DISC_RADIUS_FACTOR).max(2.0);
        let jitter = seed.scale * JITTER_FACTOR;

        let mut best = match mean_intensity(image, seed.row, seed.col, radius) {
            Some(score) => (seed.row, seed.col, score),
            None => return PupilLocation::undetected(),
        };

        let mut rng = SmallRng::seed_from_u64(restart_key(seed));
        for _ in 0..seed.perturbs {
            let row = seed.row + rng.gen_range(-jitter..=jitter);
            let col = seed.col + rng.gen_range(-jitter..=jitter);
            if let Some(score) = mean_intensity(image, row, col, radius) {
                if score < best.2 {
                    best = (row, col, score);
                }
            }
        }

        let (mut row, mut col) = (best.0, best.1);
        for _ in 0..POLISH_STEPS {
            let (next_row, next_col) = darkness_centroid(image, row, col, radius);
            let moved = (next_row - row).hypot(next_col - col);
            (row, col) = (next_row, next_col);
            if moved < POLISH_EPSILON {
                break;
            }
        }

        PupilLocation {
            row: row.round() as i32,
            col: col.round() as i32,
            scale: radius * 2.0,
        }
    }
}

/// Seed-derived key for the restart sequence.
fn restart_key(seed: &PupilSeed) -> u64 {
    ((seed.row.to_bits() as u64) << 32) ^ (seed.col.to_bits() as u64) ^ (seed.perturbs as u64)
}

/// Mean intensity of the disc around (`row`, `col`), or `None` when the disc
/// lies entirely outside the image.
fn mean_intensity(image: &GrayImage, row: f32, col: f32, radius: f32) -> Option<f64> {
    let mut sum = 0u64;
    let mut count = 0u64;
    for_each_disc_pixel(image, row, col, radius, |value| {
        sum += value as u64;
        count += 1;
    });
    if count == 0 {
        return None;
    }
    Some(sum as f64 / count as f64)
}

/// Darkness-weighted centroid of the disc around (`row`, `col`). Falls back
/// to the disc center when the disc is uniformly bright.
fn darkness_centroid(image: &GrayImage, row: f32, col: f32, radius: f32) -> (f32, f32) {
    let mut weight_sum = 0.0f64;
    let mut row_sum = 0.0f64;
    let mut col_sum = 0.0f64;

    let r0 = (row - radius).floor() as i64;
    let r1 = (row + radius).ceil() as i64;
    let c0 = (col - radius).floor() as i64;
    let c1 = (col + radius).ceil() as i64;
    for r in r0..=r1 {
        for c in c0..=c1 {
            if r < 0 || c < 0 || r >= image.height() as i64 || c >= image.width() as i64 {
                continue;
            }
            let dr = r as f32 - row;
            let dc = c as f32 - col;
            if dr * dr + dc * dc > radius * radius {
                continue;
            }
            let weight = 255.0 - image.get_pixel(c as u32, r as u32).0[0] as f64;
            weight_sum += weight;
            row_sum += weight * r as f64;
            col_sum += weight * c as f64;
        }
    }

    if weight_sum <= 0.0 {
        return (row, col);
    }
    ((row_sum / weight_sum) as f32, (col_sum / weight_sum) as f32)
}

fn for_each_disc_pixel(
    image: &GrayImage,
    row: f32,
    col: f32,
    radius: f32,
    mut visit: impl FnMut(u8),
) {
    let r0 = (row - radius).floor() as i64;
    let r1 = (row + radius).ceil() as i64;
    let c0 = (col - radius).floor() as i64;
    let c1 = (col + radius).ceil() as i64;
    for r in r0..=r1 {
        for c in c0..=c1 {
            if r < 0 || c < 0 || r >= image.height() as i64 || c >= image.width() as i64 {
                continue;
            }
            let dr = r as f32 - row;
            let dc = c as f32 - col;
            if dr * dr + dc * dc > radius * radius {
                continue;
            }
            visit(image.get_pixel(c as u32, r as u32).0[0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    fn paint_blob(image: &mut GrayImage, row: i32, col: i32, radius: i32) {
        for r in (row - radius)..=(row + radius) {
            for c in (col - radius)..=(col + radius) {
                let dr = r - row;
                let dc = c - col;
                if dr * dr + dc * dc <= radius * radius
                    && r >= 0
                    && c >= 0
                    && (r as u32) < image.height()
                    && (c as u32) < image.width()
                {
                    image.put_pixel(c as u32, r as u32, Luma([0]));
                }
            }
        }
    }

    fn seed(row: f32, col: f32) -> PupilSeed {
        PupilSeed {
            row,
            col,
            scale: 40.0,
            perturbs: 50,
        }
    }

    #[test]
    fn finds_blob_under_the_seed() {
        let mut image = white_image(200, 200);
        paint_blob(&mut image, 60, 80, 6);

        let found = IntensityPupilLocator::new().locate_pupil(&image, &seed(60.0, 80.0));
        assert!(found.located());
        assert!((found.row - 60).abs() <= 1, "row {}", found.row);
        assert!((found.col - 80).abs() <= 1, "col {}", found.col);
    }

    #[test]
    fn restarts_reach_an_offset_blob() {
        let mut image = white_image(200, 200);
        paint_blob(&mut image, 60, 80, 6);

        // Seed a few pixels off; the jitter envelope covers the blob.
        let found = IntensityPupilLocator::new().locate_pupil(&image, &seed(55.0, 75.0));
        assert!(found.located());
        assert!((found.row - 60).abs() <= 4, "row {}", found.row);
        assert!((found.col - 80).abs() <= 4, "col {}", found.col);
    }

    #[test]
    fn refinement_is_deterministic() {
        let mut image = white_image(200, 200);
        paint_blob(&mut image, 60, 80, 6);

        let locator = IntensityPupilLocator::new();
        let first = locator.locate_pupil(&image, &seed(55.0, 75.0));
        let second = locator.locate_pupil(&image, &seed(55.0, 75.0));
        assert_eq!(first, second);
    }

    #[test]
    fn featureless_region_stays_at_the_seed() {
        let image = white_image(200, 200);
        let found = IntensityPupilLocator::new().locate_pupil(&image, &seed(100.0, 100.0));
        assert!(found.located());
        assert!((found.row - 100).abs() <= 1);
        assert!((found.col - 100).abs() <= 1);
    }

    #[test]
    fn seed_outside_the_image_fails() {
        let image = white_image(100, 100);
        let found = IntensityPupilLocator::new().locate_pupil(&image, &seed(150.0, 50.0));
        assert!(!found.located());
        assert_eq!(found, PupilLocation::undetected());
    }
}
