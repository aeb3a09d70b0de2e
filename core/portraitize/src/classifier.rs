//! Cascade classifier boundary: data types and traits for the face and pupil
//! capabilities.
//!
//! The classifiers themselves are opaque to this crate. Implement
//! [`FaceClassifier`] and [`PupilLocator`] to plug in any detection engine;
//! the built-in backends are [`crate::SeetaFaceClassifier`] (behind the
//! `rustface` feature) and [`crate::IntensityPupilLocator`].

use image::GrayImage;

/// One face candidate: a square region described by its center and side
/// length, with the classifier's confidence attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Center row of the candidate region (pixels).
    pub row: i32,
    /// Center column of the candidate region (pixels).
    pub col: i32,
    /// Side length of the candidate region (pixels).
    pub scale: i32,
    /// Classifier-assigned quality score; higher is better. The scale of
    /// the score is backend-defined, only its ordering matters here.
    pub score: f64,
}

/// A refined pupil position for one eye.
///
/// Non-positive coordinates signal that refinement failed; use
/// [`PupilLocation::located`] rather than inspecting fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilLocation {
    /// Pupil center row (pixels).
    pub row: i32,
    /// Pupil center column (pixels).
    pub col: i32,
    /// Approximate pupil region size (pixels).
    pub scale: f32,
}

impl PupilLocation {
    /// The failure value: coordinates that [`located`](Self::located)
    /// reports as undetected.
    pub fn undetected() -> Self {
        Self {
            row: -1,
            col: -1,
            scale: 0.0,
        }
    }

    /// Whether refinement produced a usable position.
    pub fn located(&self) -> bool {
        self.row > 0 && self.col > 0
    }
}

/// Search parameters resolved against a concrete image: the pixel form of a
/// [`crate::DetectParams`] profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWindow {
    /// Smallest region side length to search for (pixels).
    pub min_size: u32,
    /// Largest region side length to search for (pixels).
    pub max_size: u32,
    /// Detection window shift per step, as a fraction of the window size.
    pub shift_factor: f32,
    /// Window growth factor between scales (> 1).
    pub scale_factor: f32,
    /// In-plane rotation of the faces to search for, in degrees.
    pub angle: f32,
}

/// An approximate pupil position handed to the refinement capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilSeed {
    /// Approximate pupil row (pixels).
    pub row: f32,
    /// Approximate pupil column (pixels).
    pub col: f32,
    /// Side length of the search region (pixels).
    pub scale: f32,
    /// Number of perturbed restarts the refinement may spend escaping
    /// local minima.
    pub perturbs: u32,
}

/// A face detection capability.
///
/// Given grayscale pixels and search parameters, returns candidate face
/// regions with quality scores. Duplicate candidates may be returned;
/// deduplication is the caller's concern.
pub trait FaceClassifier: Send + Sync {
    /// Detect face candidates in a grayscale image.
    fn detect_faces(&self, image: &GrayImage, scan: &ScanWindow) -> Vec<Detection>;
}

/// A pupil refinement capability.
///
/// Given an approximate position, returns a refined pupil location, or the
/// [`PupilLocation::undetected`] value when the seed cannot be refined.
pub trait PupilLocator: Send + Sync {
    /// Refine one pupil seed.
    fn locate_pupil(&self, image: &GrayImage, seed: &PupilSeed) -> PupilLocation;
}
