use stereo_image::{Image, ImageDtype};

/// Kernel for bilinear interpolation
///
/// Coordinates outside of the image replicate the border pixels.
///
/// # Arguments
///
/// * `image` - The input image container. Must not be empty.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel value.
pub fn bilinear_interpolation<T: ImageDtype>(image: &Image<T, 1>, u: f32, v: f32) -> f32 {
    let (rows, cols) = (image.rows() as isize, image.cols() as isize);

    let fu = u.floor();
    let fv = v.floor();

    let frac_u = u - fu;
    let frac_v = v - fv;

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu0 = (fu as isize).clamp(0, cols - 1) as usize;
    let iv0 = (fv as isize).clamp(0, rows - 1) as usize;
    let iu1 = (fu as isize + 1).clamp(0, cols - 1) as usize;
    let iv1 = (fv as isize + 1).clamp(0, rows - 1) as usize;

    let data = image.as_slice();
    let cols = cols as usize;

    let p00: f32 = data[iv0 * cols + iu0].into();
    let p01: f32 = data[iv0 * cols + iu1].into();
    let p10: f32 = data[iv1 * cols + iu0].into();
    let p11: f32 = data[iv1 * cols + iu1].into();

    p00 * w00 + p01 * w01 + p10 * w10 + p11 * w11
}
