//! Face portrait conversion: detect a single face, rotate the photo so the
//! eyes are level, crop to a fixed aspect ratio centered on the face, and
//! tone-adjust the result.
//!
//! # Example
//!
//! ```no_run
//! use portraitize::{PortraitConfig, PortraitConverter};
//!
//! let converter = PortraitConverter::from_model_file("model/seeta_fd_frontal_v1.0.bin").unwrap();
//! converter
//!     .portrait_file("team/alice.jpg", "portraits/alice.jpg", &PortraitConfig::default())
//!     .unwrap();
//! ```
#![warn(missing_docs)]

pub mod classifier;
#[cfg(feature = "batch")]
mod convert;
mod crop;
mod detect;
mod error;
pub mod exif;
mod pupil;
#[cfg(feature = "rustface")]
mod rustface_backend;
mod transform;

use std::io::Cursor;
use std::path::Path;

use image::RgbaImage;

#[cfg(feature = "batch")]
pub use convert::{BatchConverter, BatchSummary};
pub use crop::adaptive_crop;
pub use detect::{
    DetectParams, Face, FaceLocator, FAST_DETECT_PARAMS, SLOW_DETECT_PARAMS,
};
pub use error::PortraitError;
pub use pupil::IntensityPupilLocator;
#[cfg(feature = "rustface")]
pub use rustface_backend::SeetaFaceClassifier;
pub use transform::{rotate_to_level, tone_map};

use classifier::{FaceClassifier, PupilLocator};

/// Output policy for converted portraits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortraitConfig {
    /// Width / height ratio of the result.
    pub aspect_ratio: f64,
    /// Maximum result width as a multiple of the detected face width.
    pub max_width_ratio: f64,
    /// Brightness adjustment percentage (-100 to 100).
    pub brightness: f64,
    /// Contrast adjustment percentage (-100 to 100).
    pub contrast: f64,
    /// Gamma adjustment; 1.0 leaves the tone curve unchanged.
    pub gamma: f64,
}

impl Default for PortraitConfig {
    /// Portrait-format defaults: 3:4 aspect, a crop up to 1.5 face widths,
    /// a light contrast and gamma lift.
    fn default() -> Self {
        Self {
            aspect_ratio: 3.0 / 4.0,
            max_width_ratio: 1.5,
            brightness: 0.0,
            contrast: 5.0,
            gamma: 1.4,
        }
    }
}

impl PortraitConfig {
    fn validate(&self) -> Result<(), PortraitError> {
        if self.aspect_ratio <= 0.0 {
            return Err(PortraitError::InvalidAspectRatio(self.aspect_ratio));
        }
        if self.max_width_ratio < 1.0 {
            return Err(PortraitError::InvalidMaxWidthRatio(self.max_width_ratio));
        }
        if self.gamma <= 0.0 {
            return Err(PortraitError::InvalidGamma(self.gamma));
        }
        Ok(())
    }
}

/// Converts photographs into normalized portraits.
///
/// The pipeline is a fixed forward sequence: detect the face, rotate the
/// image to level the eyes, detect again on the rotated pixels (rotation
/// invalidates the first face), crop adaptively, and tone-map. One converter
/// is safe to share across threads; the classifier state behind it is
/// read-only.
pub struct PortraitConverter {
    locator: FaceLocator,
}

impl PortraitConverter {
    /// Build a converter from classifier capabilities.
    pub fn new(classifier: Box<dyn FaceClassifier>, pupils: Box<dyn PupilLocator>) -> Self {
        Self {
            locator: FaceLocator::new(classifier, pupils),
        }
    }

    /// Build a converter with a custom face locator.
    pub fn with_locator(locator: FaceLocator) -> Self {
        Self { locator }
    }

    /// Build a converter from SeetaFace model bytes and the built-in pupil
    /// locator. Fails fast on an unparsable model.
    #[cfg(feature = "rustface")]
    pub fn from_model_bytes(model: &[u8]) -> Result<Self, PortraitError> {
        Ok(Self::new(
            Box::new(SeetaFaceClassifier::from_bytes(model)?),
            Box::new(IntensityPupilLocator::new()),
        ))
    }

    /// Build a converter from a SeetaFace model file and the built-in pupil
    /// locator. Fails fast on a missing or unparsable model.
    #[cfg(feature = "rustface")]
    pub fn from_model_file(path: impl AsRef<Path>) -> Result<Self, PortraitError> {
        Ok(Self::new(
            Box::new(SeetaFaceClassifier::from_file(path)?),
            Box::new(IntensityPupilLocator::new()),
        ))
    }

    /// Convert a decoded image into a portrait.
    ///
    /// Fails with [`PortraitError::FaceUndetected`] /
    /// [`PortraitError::RotatedFaceUndetected`] when either detection pass
    /// finds no face, and with [`PortraitError::PupilsUndetected`] when a
    /// face is found but its eyes cannot be refined — leveling needs both
    /// pupils. There is no automatic retry; rerunning with different
    /// parameters is the caller's call.
    pub fn portrait(
        &self,
        image: &RgbaImage,
        config: &PortraitConfig,
    ) -> Result<RgbaImage, PortraitError> {
        config.validate()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PortraitError::ZeroDimensions);
        }

        let face = self.locator.detect_face(image, 0.0)?;
        if !face.pupils_located() {
            return Err(PortraitError::PupilsUndetected);
        }

        let rotated = rotate_to_level(image, &face);

        // The first face's coordinates died with the rotation.
        let face = self.locator.detect_face(&rotated, 0.0).map_err(|e| match e {
            PortraitError::FaceUndetected => PortraitError::RotatedFaceUndetected,
            other => other,
        })?;
        if !face.pupils_located() {
            return Err(PortraitError::PupilsUndetected);
        }

        let cropped = adaptive_crop(&rotated, &face, config.aspect_ratio, config.max_width_ratio);
        Ok(tone_map(
            &cropped,
            config.brightness,
            config.contrast,
            config.gamma,
        ))
    }

    /// Convert an encoded image buffer into a PNG-encoded portrait.
    ///
    /// Decodes with EXIF orientation correction, runs the pipeline, and
    /// encodes the result as PNG. This is the embedded variant's entry
    /// point.
    pub fn portrait_png(
        &self,
        input: &[u8],
        config: &PortraitConfig,
    ) -> Result<Vec<u8>, PortraitError> {
        let image = exif::decode_with_exif(input)?;
        let portrait = self.portrait(&image, config)?;

        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(portrait)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| PortraitError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Convert the image at `inpath` and write the portrait to `outpath`,
    /// with EXIF orientation correction. The output format follows the
    /// output extension.
    pub fn portrait_file(
        &self,
        inpath: impl AsRef<Path>,
        outpath: impl AsRef<Path>,
        config: &PortraitConfig,
    ) -> Result<(), PortraitError> {
        let image = exif::decode_file_with_exif(inpath)?;
        let portrait = self.portrait(&image, config)?;
        save_portrait(&portrait, outpath.as_ref())
    }
}

/// Write a portrait in the format implied by the output extension. Formats
/// without an alpha channel get the pixels with alpha dropped.
pub(crate) fn save_portrait(image: &RgbaImage, path: &Path) -> Result<(), PortraitError> {
    let extension = path
        .extension()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let result = if extension == "jpg" || extension == "jpeg" {
        image::DynamicImage::ImageRgba8(image.clone()).to_rgb8().save(path)
    } else {
        image.save(path)
    };
    result.map_err(|e| PortraitError::Encode(e.to_string()))
}
