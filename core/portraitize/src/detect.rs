use image::RgbaImage;
use log::debug;

use crate::classifier::{
    Detection, FaceClassifier, PupilLocation, PupilLocator, PupilSeed, ScanWindow,
};
use crate::error::PortraitError;

/// Pupil search offset above the face center row, as a fraction of face scale.
const PUPIL_ROW_OFFSET: f32 = 0.085;

/// Pupil search offset to either side of the face center column, as a
/// fraction of face scale.
const PUPIL_COL_OFFSET: f32 = 0.185;

/// Pupil search region size as a fraction of face scale.
const PUPIL_SCALE: f32 = 0.4;

/// Perturbed restarts spent on each pupil refinement.
const PUPIL_PERTURBS: u32 = 50;

/// A tuning profile for one face detection pass.
///
/// Sizes are fractions of the image's largest dimension; `shift_factor` and
/// `scale_factor` control how densely the detection window sweeps the image.
/// `iou_threshold` is the intersection-over-union above which two candidates
/// are merged as duplicates; a non-positive value disables merging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Smallest face size searched for, as a fraction of the largest
    /// image dimension.
    pub min_size_factor: f64,
    /// Largest face size searched for, as a fraction of the largest
    /// image dimension.
    pub max_size_factor: f64,
    /// Detection window shift per step, as a fraction of the window size.
    pub shift_factor: f64,
    /// Detection window growth factor between scales.
    pub scale_factor: f64,
    /// Duplicate-merge threshold; `<= 0` keeps all candidates.
    pub iou_threshold: f64,
}

/// The fast profile: a narrower size range and coarse stepping. Tried first.
pub const FAST_DETECT_PARAMS: DetectParams = DetectParams {
    min_size_factor: 0.2,
    max_size_factor: 0.8,
    shift_factor: 0.15,
    scale_factor: 1.15,
    iou_threshold: 0.15,
};

/// The slow profile: a wider size range, fine stepping, and no duplicate
/// merging. The fallback when the fast profile finds nothing.
pub const SLOW_DETECT_PARAMS: DetectParams = DetectParams {
    min_size_factor: 0.1,
    max_size_factor: 0.9,
    shift_factor: 0.05,
    scale_factor: 1.03,
    iou_threshold: 0.0,
};

impl DetectParams {
    /// Resolve the size factors against a concrete image.
    fn scan_window(&self, width: u32, height: u32, angle: f32) -> ScanWindow {
        let max_dim = width.max(height) as f64;
        ScanWindow {
            min_size: (self.min_size_factor * max_dim) as u32,
            max_size: (self.max_size_factor * max_dim) as u32,
            shift_factor: self.shift_factor as f32,
            scale_factor: self.scale_factor as f32,
            angle,
        }
    }
}

/// A detected face: the chosen candidate region plus both refined pupils.
///
/// A `Face` is only valid for the pixel orientation it was computed against;
/// rotating the image invalidates it and requires re-detection.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// The winning face candidate.
    pub detection: Detection,
    /// Refined left pupil (the subject's left, lower image column).
    pub left_eye: PupilLocation,
    /// Refined right pupil.
    pub right_eye: PupilLocation,
}

impl Face {
    /// Whether both pupils were refined to usable positions. Rotation and
    /// cropping require this.
    pub fn pupils_located(&self) -> bool {
        self.left_eye.located() && self.right_eye.located()
    }
}

/// Drives the cascade classifier through an ordered fallback of detection
/// profiles and locates pupils relative to the winning candidate.
pub struct FaceLocator {
    classifier: Box<dyn FaceClassifier>,
    pupils: Box<dyn PupilLocator>,
    profiles: Vec<DetectParams>,
}

impl FaceLocator {
    /// Create a locator with the default fast-then-slow profile chain.
    pub fn new(classifier: Box<dyn FaceClassifier>, pupils: Box<dyn PupilLocator>) -> Self {
        Self {
            classifier,
            pupils,
            profiles: vec![FAST_DETECT_PARAMS, SLOW_DETECT_PARAMS],
        }
    }

    /// Replace the profile chain. Profiles are tried in order until one
    /// yields a non-empty result.
    pub fn with_profiles(mut self, profiles: Vec<DetectParams>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Detect a single face and its pupils.
    ///
    /// The image is converted to grayscale once and scanned with each
    /// profile in turn. Returns [`PortraitError::FaceUndetected`] when every
    /// profile comes up empty. A face whose pupils could not be refined is
    /// still returned; check [`Face::pupils_located`].
    pub fn detect_face(&self, image: &RgbaImage, angle: f32) -> Result<Face, PortraitError> {
        let gray = image::imageops::grayscale(image);

        for params in &self.profiles {
            let scan = params.scan_window(image.width(), image.height(), angle);
            let candidates = self.classifier.detect_faces(&gray, &scan);
            let candidates = merge_detections(candidates, params.iou_threshold);
            if candidates.is_empty() {
                debug!(
                    "no faces for profile min_size_factor={} max_size_factor={}",
                    params.min_size_factor, params.max_size_factor
                );
                continue;
            }

            let best = choose_best_face(&candidates);
            let (left_eye, right_eye) = self.locate_pupils(&gray, &best);
            return Ok(Face {
                detection: best,
                left_eye,
                right_eye,
            });
        }

        Err(PortraitError::FaceUndetected)
    }

    /// Refine both pupils, searching independently around offsets from the
    /// face center.
    fn locate_pupils(&self, gray: &image::GrayImage, face: &Detection) -> (PupilLocation, PupilLocation) {
        let scale = face.scale as f32;
        let row = face.row as f32 - PUPIL_ROW_OFFSET * scale;

        let left = PupilSeed {
            row,
            col: face.col as f32 - PUPIL_COL_OFFSET * scale,
            scale: scale * PUPIL_SCALE,
            perturbs: PUPIL_PERTURBS,
        };
        let right = PupilSeed {
            col: face.col as f32 + PUPIL_COL_OFFSET * scale,
            ..left
        };

        (
            self.pupils.locate_pupil(gray, &left),
            self.pupils.locate_pupil(gray, &right),
        )
    }
}

/// Pick the candidate with the highest quality score.
///
/// Ties resolve to the first-seen candidate, so equal-scored detections
/// produce a stable winner across runs with the same classifier output.
pub fn choose_best_face(candidates: &[Detection]) -> Detection {
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.score > best.score {
            best = *candidate;
        }
    }
    best
}

/// Merge duplicate candidates whose regions overlap by more than
/// `iou_threshold`.
///
/// Merged candidates average their centers and scales and sum their scores,
/// so a region corroborated by several windows outranks a single hit. A
/// non-positive threshold returns the input unchanged.
pub fn merge_detections(candidates: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    if iou_threshold <= 0.0 || candidates.len() < 2 {
        return candidates;
    }

    let mut clusters: Vec<Vec<Detection>> = Vec::new();
    for candidate in candidates {
        match clusters
            .iter_mut()
            .find(|cluster| iou(&cluster[0], &candidate) > iou_threshold)
        {
            Some(cluster) => cluster.push(candidate),
            None => clusters.push(vec![candidate]),
        }
    }

    clusters
        .into_iter()
        .map(|cluster| {
            let n = cluster.len() as f64;
            Detection {
                row: (cluster.iter().map(|d| d.row as f64).sum::<f64>() / n) as i32,
                col: (cluster.iter().map(|d| d.col as f64).sum::<f64>() / n) as i32,
                scale: (cluster.iter().map(|d| d.scale as f64).sum::<f64>() / n) as i32,
                score: cluster.iter().map(|d| d.score).sum(),
            }
        })
        .collect()
}

/// Intersection-over-union of two square candidate regions.
fn iou(a: &Detection, b: &Detection) -> f64 {
    let half = |d: &Detection| d.scale as f64 / 2.0;
    let overlap_x = (a.col as f64 + half(a)).min(b.col as f64 + half(b))
        - (a.col as f64 - half(a)).max(b.col as f64 - half(b));
    let overlap_y = (a.row as f64 + half(a)).min(b.row as f64 + half(b))
        - (a.row as f64 - half(a)).max(b.row as f64 - half(b));
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return 0.0;
    }

    let intersection = overlap_x * overlap_y;
    let union = (a.scale as f64).powi(2) + (b.scale as f64).powi(2) - intersection;
    intersection / union
}
