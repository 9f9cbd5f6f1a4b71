use stereo_image::{Image, ImageError};

use crate::camera::{CameraIntrinsic, RigidTransform};
use crate::DepthError;

/// Register a depth image into the frame of another camera.
///
/// Every non-zero depth pixel is back-projected with `depth_k`, moved with
/// `transform` and projected with `color_k` to the closest pixel of `dst`.
/// When several points land on the same pixel the nearest one is kept.
///
/// # Arguments
///
/// * `depth` - The depth image in millimeters.
/// * `depth_k` - The intrinsics of the depth camera.
/// * `color_k` - The intrinsics of the target camera.
/// * `transform` - The transform from the depth frame to the target frame.
/// * `dst` - The registered depth in millimeters. Its size defines the target image.
///
/// # Returns
///
/// The number of points dropped because their depth in the target frame does
/// not fit in 16-bit millimeters.
///
/// # Example
///
/// ```
/// use stereo_depth::camera::{CameraIntrinsic, RigidTransform};
/// use stereo_depth::registration::register_depth;
/// use stereo_image::Image;
///
/// let k = CameraIntrinsic::new(100.0, 100.0, 2.0, 2.0);
/// let depth = Image::<u16, 1>::from_size_val([5, 5].into(), 1000).unwrap();
/// let mut registered = Image::<u16, 1>::from_size_val([5, 5].into(), 0).unwrap();
///
/// register_depth(&depth, &k, &k, &RigidTransform::identity(), &mut registered).unwrap();
///
/// assert_eq!(registered, depth);
/// ```
pub fn register_depth(
    depth: &Image<u16, 1>,
    depth_k: &CameraIntrinsic,
    color_k: &CameraIntrinsic,
    transform: &RigidTransform,
    dst: &mut Image<u16, 1>,
) -> Result<usize, DepthError> {
    if depth.is_empty() || dst.is_empty() {
        return Err(ImageError::EmptyImage.into());
    }

    dst.fill(0);

    let (dst_cols, dst_rows) = (dst.cols() as i64, dst.rows() as i64);
    let src_cols = depth.cols();
    let mut overflow = 0;

    // collisions are resolved against the values already written
    let dst_data = dst.as_slice_mut();
    for (idx, &mm) in depth.as_slice().iter().enumerate() {
        if mm == 0 {
            continue;
        }

        let (x, y) = (idx % src_cols, idx / src_cols);
        let p = depth_k.unproject(x as f32, y as f32, mm as f32 * 0.001);
        let p = transform.transform_point(p);

        let Some([u, v]) = color_k.project(p) else {
            continue;
        };

        let (u, v) = (u.round() as i64, v.round() as i64);
        if u < 0 || u >= dst_cols || v < 0 || v >= dst_rows {
            continue;
        }

        let z_mm = p.z * 1000.0;
        if z_mm > u16::MAX as f32 {
            overflow += 1;
            continue;
        }

        // under a millimeter reads as no depth
        let z_mm = z_mm as u16;
        if z_mm == 0 {
            continue;
        }

        let out = &mut dst_data[(v * dst_cols + u) as usize];
        if *out == 0 || z_mm < *out {
            *out = z_mm;
        }
    }

    if overflow > 0 {
        log::warn!(
            "{overflow} registered points ignored because they are over the maximum depth allowed ({} mm)",
            u16::MAX
        );
    }

    Ok(overflow)
}
