use stereo_image::{ops::cast_and_scale, Image, ImageError, ImageSize};

use crate::StereoError;

/// A disparity image produced by a dense stereo solver.
///
/// A zero disparity means that the pixel has no measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum DisparityMap {
    /// Disparity in pixels.
    Float(Image<f32, 1>),
    /// Fixed point disparity with 4 fractional bits, i.e. in 1/16 pixels.
    Fixed(Image<i16, 1>),
}

impl DisparityMap {
    /// The size of the disparity image.
    pub fn size(&self) -> ImageSize {
        match self {
            DisparityMap::Float(d) => d.size(),
            DisparityMap::Fixed(d) => d.size(),
        }
    }

    /// The disparity of a pixel, in pixels.
    pub fn get(&self, x: usize, y: usize) -> Result<f32, ImageError> {
        match self {
            DisparityMap::Float(d) => d.get_pixel(x, y, 0).copied(),
            DisparityMap::Fixed(d) => d.get_pixel(x, y, 0).map(|v| *v as f32 / 16.0),
        }
    }

    /// Convert the disparity to pixels.
    pub fn to_float(&self) -> Result<Image<f32, 1>, ImageError> {
        match self {
            DisparityMap::Float(d) => Ok(d.clone()),
            DisparityMap::Fixed(d) => {
                let mut dst = Image::<f32, 1>::from_size_val(d.size(), 0.0)?;
                cast_and_scale(d, &mut dst, 1.0 / 16.0)?;
                Ok(dst)
            }
        }
    }
}

/// A solver computing a disparity for every pixel of a rectified pair.
pub trait DenseStereoSolver {
    /// Compute the disparity of the left image against the right image.
    ///
    /// Both images are non empty and share the same size.
    fn compute(&self, left: &Image<u8, 1>, right: &Image<u8, 1>) -> Result<DisparityMap, StereoError>;
}

/// Compute a dense disparity image from a rectified stereo pair.
///
/// # Arguments
///
/// * `left` - The left gray image.
/// * `right` - The right gray image, with the same size as `left`.
/// * `solver` - The dense stereo solver.
///
/// # Returns
///
/// The disparity image, with the size of the input images.
pub fn disparity_from_stereo_images<S: DenseStereoSolver + ?Sized>(
    left: &Image<u8, 1>,
    right: &Image<u8, 1>,
    solver: &S,
) -> Result<DisparityMap, StereoError> {
    if left.is_empty() || right.is_empty() {
        return Err(ImageError::EmptyImage.into());
    }

    if left.size() != right.size() {
        return Err(ImageError::InvalidImageSize(
            left.width(),
            left.height(),
            right.width(),
            right.height(),
        )
        .into());
    }

    let disparity = solver.compute(left, right)?;

    let size = disparity.size();
    if size != left.size() {
        return Err(ImageError::InvalidImageSize(
            left.width(),
            left.height(),
            size.width,
            size.height,
        )
        .into());
    }

    Ok(disparity)
}
