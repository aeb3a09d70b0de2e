use thiserror::Error;

/// Error type returned by portraitize operations.
#[derive(Debug, Error)]
pub enum PortraitError {
    /// No face candidate survived any detection profile.
    #[error("face undetected")]
    FaceUndetected,

    /// The second detection pass, on the leveled image, found no face.
    #[error("rotated face undetected")]
    RotatedFaceUndetected,

    /// A face was found but at least one pupil could not be refined, so the
    /// eye line cannot be leveled.
    #[error("pupils undetected")]
    PupilsUndetected,

    /// The input could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The result could not be encoded or written.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The cascade model could not be loaded or parsed.
    #[error("failed to load cascade model: {0}")]
    Model(String),

    /// The decoded image has a zero width or height.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// The configured aspect ratio is not positive.
    #[error("aspect ratio must be > 0, got {0}")]
    InvalidAspectRatio(f64),

    /// The configured width ratio would shrink the crop below the face width.
    #[error("max width ratio must be >= 1, got {0}")]
    InvalidMaxWidthRatio(f64),

    /// The configured gamma is not positive.
    #[error("gamma must be > 0, got {0}")]
    InvalidGamma(f64),

    /// Filesystem error outside of image encoding, e.g. creating the output
    /// directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The batch worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}
