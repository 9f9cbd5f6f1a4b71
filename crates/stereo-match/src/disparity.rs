use stereo_image::{Image, ImageSize};

use crate::{Correspondence, StereoError};

/// Pixel of the image where the left point of a correspondence lands.
///
/// The point is rounded to the closest pixel.
pub fn correspondence_pixel(c: &Correspondence, size: ImageSize) -> Result<(usize, usize), StereoError> {
    let u = (c.left[0] + 0.5) as i64;
    let v = (c.left[1] + 0.5) as i64;

    if c.left[0] + 0.5 < 0.0
        || c.left[1] + 0.5 < 0.0
        || u >= size.width as i64
        || v >= size.height as i64
    {
        return Err(StereoError::PointOutOfBounds(c.left[0], c.left[1]));
    }

    Ok((u as usize, v as usize))
}

/// Build a sparse disparity image from stereo correspondences.
///
/// The disparity `left.x - right.x` of every valid correspondence is written at
/// the pixel of its left point. All other pixels are zero.
///
/// # Arguments
///
/// * `size` - The size of the disparity image.
/// * `correspondences` - The stereo correspondences.
///
/// # Errors
///
/// Returns [`StereoError::PointOutOfBounds`] if a valid correspondence lies
/// outside of the image.
pub fn disparity_from_stereo_correspondences(
    size: ImageSize,
    correspondences: &[Correspondence],
) -> Result<Image<f32, 1>, StereoError> {
    let mut disparity = Image::<f32, 1>::from_size_val(size, 0.0)?;

    for c in correspondences.iter().filter(|c| c.valid) {
        let (u, v) = correspondence_pixel(c, size)?;
        disparity.set_pixel(u, v, 0, c.disparity())?;
    }

    Ok(disparity)
}
