use std::io::Cursor;
use std::path::Path;

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::classifier::{Detection, FaceClassifier, ScanWindow};
use crate::error::PortraitError;

/// The engine's detection template size; sizes and steps below it are
/// meaningless to the cascade.
const TEMPLATE_SIZE: u32 = 20;

/// Score threshold below which candidate windows are discarded.
const SCORE_THRESH: f64 = 2.0;

/// Face classifier backed by the `rustface` crate (SeetaFace engine).
///
/// The parsed model is loaded once and shared read-only for the process
/// lifetime; each detection pass constructs its own detector from it, so one
/// classifier value serves any number of concurrent jobs.
pub struct SeetaFaceClassifier {
    model: rustface::Model,
}

impl SeetaFaceClassifier {
    /// Parse a SeetaFace frontal-face model from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, PortraitError> {
        let model = rustface::read_model(Cursor::new(data))
            .map_err(|e| PortraitError::Model(e.to_string()))?;
        Ok(Self { model })
    }

    /// Load a SeetaFace frontal-face model from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PortraitError> {
        let data = std::fs::read(&path).map_err(|e| {
            PortraitError::Model(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(&data)
    }

    fn scan_upright(&self, image: &GrayImage, scan: &ScanWindow) -> Vec<Detection> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(scan.min_size.max(TEMPLATE_SIZE));
        detector.set_max_face_size(scan.max_size.max(TEMPLATE_SIZE));
        detector.set_score_thresh(SCORE_THRESH);
        detector.set_pyramid_scale_factor(pyramid_factor(scan.scale_factor));
        let step = window_step(scan.shift_factor);
        detector.set_slide_window_step(step, step);

        let data = rustface::ImageData::new(image.as_raw(), image.width(), image.height());
        detector
            .detect(&data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Detection {
                    row: bbox.y() + bbox.height() as i32 / 2,
                    col: bbox.x() + bbox.width() as i32 / 2,
                    scale: bbox.width().max(bbox.height()) as i32,
                    score: face.score(),
                }
            })
            .collect()
    }
}

impl FaceClassifier for SeetaFaceClassifier {
    fn detect_faces(&self, image: &GrayImage, scan: &ScanWindow) -> Vec<Detection> {
        if scan.angle == 0.0 {
            return self.scan_upright(image, scan);
        }

        // The cascade only knows upright faces. For a rotated scan, stand
        // the image up, detect there, and map the centers back.
        let radians = scan.angle.to_radians();
        let upright = rotate_about_center(image, radians, Interpolation::Bilinear, Luma([0u8]));
        self.scan_upright(&upright, scan)
            .into_iter()
            .map(|detection| {
                map_center_back(detection, -radians, image.width(), image.height())
            })
            .collect()
    }
}

/// The engine steps its window in absolute pixels; resolve the fractional
/// shift against the template size.
fn window_step(shift_factor: f32) -> u32 {
    ((shift_factor * TEMPLATE_SIZE as f32).round() as u32).max(1)
}

/// The engine downscales an image pyramid, while the scan parameters grow
/// the window; the pyramid factor is the inverse growth, clamped to the
/// engine's accepted range.
fn pyramid_factor(scale_factor: f32) -> f32 {
    (1.0 / scale_factor.max(1.01)).clamp(0.1, 0.98)
}

/// Rotate a detection center by `radians` (clockwise-positive, the same
/// convention as the resampling) about the image center.
fn map_center_back(detection: Detection, radians: f32, width: u32, height: u32) -> Detection {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (dx, dy) = (detection.col as f32 - cx, detection.row as f32 - cy);
    let (sin, cos) = radians.sin_cos();
    Detection {
        col: (cx + dx * cos - dy * sin).round() as i32,
        row: (cy + dx * sin + dy * cos).round() as i32,
        ..detection
    }
}
