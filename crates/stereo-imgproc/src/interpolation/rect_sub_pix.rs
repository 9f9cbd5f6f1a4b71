use super::bilinear_interpolation;
use stereo_image::{Image, ImageDtype, ImageError};

/// Extract a window centered on a sub-pixel location.
///
/// The size of the window is given by the size of `dst`. Every sample is
/// bilinearly interpolated; samples falling outside of `src` replicate its
/// border.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `center` - The (x, y) center of the window in `src` coordinates.
/// * `dst` - The destination window.
///
/// # Example
///
/// ```
/// use stereo_image::{Image, ImageSize};
/// use stereo_imgproc::interpolation::get_rect_sub_pix;
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 3, height: 1 }, vec![0, 10, 20]).unwrap();
/// let mut window = Image::<f32, 1>::from_size_val(ImageSize { width: 1, height: 1 }, 0.0).unwrap();
///
/// get_rect_sub_pix(&image, [1.5, 0.0], &mut window).unwrap();
/// assert_eq!(window.as_slice(), &[15.0]);
/// ```
pub fn get_rect_sub_pix<T: ImageDtype>(
    src: &Image<T, 1>,
    center: [f32; 2],
    dst: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let cols = dst.cols();
    let x0 = center[0] - (cols as f32 - 1.0) * 0.5;
    let y0 = center[1] - (dst.rows() as f32 - 1.0) * 0.5;

    dst.as_slice_mut()
        .chunks_exact_mut(cols)
        .enumerate()
        .for_each(|(i, row)| {
            row.iter_mut().enumerate().for_each(|(j, val)| {
                *val = bilinear_interpolation(src, x0 + j as f32, y0 + i as f32);
            });
        });

    Ok(())
}
