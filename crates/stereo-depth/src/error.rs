use stereo_image::ImageError;
use stereo_match::StereoError;

/// An error type for the depth module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DepthError {
    /// Error raised by an underlying image operation.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error raised by the stereo matching.
    #[error(transparent)]
    StereoError(#[from] StereoError),

    /// Error when the camera intrinsics matrix is not valid.
    #[error("Invalid camera intrinsics matrix: {0}")]
    InvalidIntrinsics(String),

    /// Error when the image size is not a multiple of the decimation.
    #[error("Decimation {0} does not evenly divide the image size ({1}, {2})")]
    InvalidDecimation(usize, usize, usize),

    /// Error when the focal length or the baseline is not positive.
    #[error("Focal length and baseline must be positive, got fx={0} baseline={1}")]
    InvalidStereoGeometry(f32, f32),
}
