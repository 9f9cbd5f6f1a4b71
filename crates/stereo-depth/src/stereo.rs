use stereo_image::{Image, ImageError, ImageSize};
use stereo_match::disparity::correspondence_pixel;
use stereo_match::optical_flow::{calc_optical_flow_pyr_lk_stereo, LkStereoParams};
use stereo_match::Correspondence;

use crate::DepthError;

fn check_geometry(fx: f32, baseline: f32) -> Result<(), DepthError> {
    if fx > 0.0 && baseline > 0.0 {
        Ok(())
    } else {
        Err(DepthError::InvalidStereoGeometry(fx, baseline))
    }
}

/// Build a sparse depth image in meters from stereo correspondences.
///
/// Every valid correspondence with a positive disparity writes
/// `baseline * fx / disparity` at the pixel of its left point. All other
/// pixels are zero.
///
/// # Arguments
///
/// * `size` - The size of the left image.
/// * `correspondences` - The stereo correspondences.
/// * `fx` - The horizontal focal length in pixels.
/// * `baseline` - The distance between the two cameras in meters.
pub fn depth_from_stereo_correspondences(
    size: ImageSize,
    correspondences: &[Correspondence],
    fx: f32,
    baseline: f32,
) -> Result<Image<f32, 1>, DepthError> {
    if size.area() == 0 {
        return Err(ImageError::EmptyImage.into());
    }
    check_geometry(fx, baseline)?;

    let mut depth = Image::<f32, 1>::from_size_val(size, 0.0)?;

    for c in correspondences.iter().filter(|c| c.valid) {
        let disparity = c.disparity();
        if disparity > 0.0 {
            let (u, v) = correspondence_pixel(c, size)?;
            depth.set_pixel(u, v, 0, baseline * fx / disparity)?;
        }
    }

    Ok(depth)
}

/// Compute a sparse depth image in meters from a rectified stereo pair.
///
/// The points are tracked from the left to the right image with the
/// horizontally constrained pyramidal Lucas-Kanade tracker, reporting the
/// minimum eigenvalue as error, and converted with
/// [`depth_from_stereo_correspondences`].
///
/// # Arguments
///
/// * `left` - The left gray image.
/// * `right` - The right gray image, same size as `left`.
/// * `points` - The (x, y) points of the left image.
/// * `fx` - The horizontal focal length in pixels.
/// * `baseline` - The distance between the two cameras in meters.
/// * `params` - The tracker parameters.
pub fn depth_from_stereo_images(
    left: &Image<u8, 1>,
    right: &Image<u8, 1>,
    points: &[[f32; 2]],
    fx: f32,
    baseline: f32,
    params: &LkStereoParams,
) -> Result<Image<f32, 1>, DepthError> {
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

    check_geometry(fx, baseline)?;

    let mut params = params.clone();
    params.flags.get_min_eigenvals = true;

    let correspondences = calc_optical_flow_pyr_lk_stereo(left, right, points, None, &params)?;

    log::debug!(
        "{} of {} points tracked in the right image",
        correspondences.iter().filter(|c| c.valid).count(),
        correspondences.len()
    );

    depth_from_stereo_correspondences(left.size(), &correspondences, fx, baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stereo_match::StereoError;

    #[test]
    fn test_depth_from_stereo_correspondences() -> Result<(), DepthError> {
        let size = ImageSize {
            width: 6,
            height: 4,
        };
        let correspondences = [
            Correspondence {
                left: [3.0, 1.0],
                right: [1.0, 1.0],
                valid: true,
                error: Some(0.1),
            },
            Correspondence {
                left: [4.0, 2.0],
                right: [5.0, 2.0],
                valid: true,
                error: None,
            },
            Correspondence::invalid([2.0, 3.0]),
        ];

        let depth = depth_from_stereo_correspondences(size, &correspondences, 400.0, 0.05)?;

        assert_relative_eq!(*depth.get_pixel(3, 1, 0)?, 10.0);
        // negative disparity
        assert_eq!(*depth.get_pixel(4, 2, 0)?, 0.0);
        assert_eq!(depth.as_slice().iter().filter(|&&d| d != 0.0).count(), 1);

        Ok(())
    }

    #[test]
    fn test_depth_from_stereo_correspondences_out_of_bounds() {
        let size = ImageSize {
            width: 6,
            height: 4,
        };
        let outside = [Correspondence {
            left: [7.0, 1.0],
            right: [5.0, 1.0],
            valid: true,
            error: None,
        }];

        assert_eq!(
            depth_from_stereo_correspondences(size, &outside, 400.0, 0.05),
            Err(DepthError::StereoError(StereoError::PointOutOfBounds(7.0, 1.0)))
        );
    }

    #[test]
    fn test_invalid_geometry() -> Result<(), DepthError> {
        let image = Image::<u8, 1>::from_size_val([16, 16].into(), 0)?;
        let params = LkStereoParams::default();

        assert_eq!(
            depth_from_stereo_images(&image, &image, &[], 0.0, 0.1, &params),
            Err(DepthError::InvalidStereoGeometry(0.0, 0.1))
        );
        assert_eq!(
            depth_from_stereo_correspondences(image.size(), &[], 500.0, -0.1),
            Err(DepthError::InvalidStereoGeometry(500.0, -0.1))
        );

        let small = Image::<u8, 1>::from_size_val([8, 16].into(), 0)?;
        assert!(depth_from_stereo_images(&image, &small, &[], 500.0, 0.1, &params).is_err());

        Ok(())
    }

    #[test]
    fn test_flat_images_have_no_depth() -> Result<(), DepthError> {
        let image = Image::<u8, 1>::from_size_val([32, 32].into(), 90)?;
        let params = LkStereoParams::default().with_win_size([9, 9].into());

        let depth = depth_from_stereo_images(&image, &image, &[[16.0, 16.0]], 500.0, 0.1, &params)?;

        assert!(depth.as_slice().iter().all(|&d| d == 0.0));

        Ok(())
    }
}
