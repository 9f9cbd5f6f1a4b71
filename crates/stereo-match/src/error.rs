use stereo_image::ImageError;

/// An error type for the stereo matching module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StereoError {
    /// Error raised by an underlying image operation.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error when the search window is too small.
    #[error("Invalid window size ({0}, {1}), both dimensions must be larger than 2")]
    InvalidWindowSize(usize, usize),

    /// Error when no termination criteria is set.
    #[error("At least one of the termination criteria (max count, epsilon) must be set")]
    MissingTermCriteria,

    /// Error when the initial estimates do not match the number of points.
    #[error("Expected {0} initial points, got {1}")]
    InitialPointsMismatch(usize, usize),

    /// Error when the disparity search range is inverted.
    #[error("Invalid disparity range [{0}, {1}]")]
    InvalidDisparityRange(i32, i32),

    /// Error when the two pyramids of a pair have different shapes.
    #[error("Pyramid levels mismatch: {0} vs {1}")]
    PyramidMismatch(usize, usize),

    /// Error when a point lies outside of the image.
    #[error("Point ({0}, {1}) is outside of the image")]
    PointOutOfBounds(f32, f32),

    /// Error reported by a dense stereo solver.
    #[error("Dense stereo solver failed: {0}")]
    SolverError(String),
}
