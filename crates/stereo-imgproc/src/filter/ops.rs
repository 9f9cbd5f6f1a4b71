use rayon::prelude::*;

use stereo_image::{Image, ImageError};

use super::{reflect_101, scharr_kernel_1d};

/// Compute the horizontal and vertical Scharr derivatives of a gray image.
///
/// The derivatives are stored interleaved in a two channel image where the
/// first channel is the derivative along x and the second along y. Borders are
/// handled by mirroring the image without repeating the border pixel.
///
/// # Arguments
///
/// * `src` - The input gray image.
/// * `dst` - The output derivatives image with the same size as `src`.
///
/// # Example
///
/// ```
/// use stereo_image::{Image, ImageSize};
/// use stereo_imgproc::filter::scharr_derivatives;
///
/// let size = ImageSize { width: 3, height: 3 };
/// let image = Image::<u8, 1>::new(size, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]).unwrap();
/// let mut derivs = Image::<i16, 2>::from_size_val(size, 0).unwrap();
///
/// scharr_derivatives(&image, &mut derivs).unwrap();
///
/// // center pixel: 16 * (2 - 0) along x, nothing along y
/// assert_eq!(derivs.get_pixel(1, 1, 0).unwrap(), &32);
/// assert_eq!(derivs.get_pixel(1, 1, 1).unwrap(), &0);
/// ```
pub fn scharr_derivatives(src: &Image<u8, 1>, dst: &mut Image<i16, 2>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    if src.is_empty() {
        return Ok(());
    }

    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    let (deriv, smooth) = scharr_kernel_1d();

    dst.as_slice_mut()
        .par_chunks_exact_mut(2 * cols)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let ys = [
                reflect_101(y as isize - 1, rows),
                y,
                reflect_101(y as isize + 1, rows),
            ];

            dst_row
                .chunks_exact_mut(2)
                .enumerate()
                .for_each(|(x, dst_pixel)| {
                    let xs = [
                        reflect_101(x as isize - 1, cols),
                        x,
                        reflect_101(x as isize + 1, cols),
                    ];

                    let mut dx = 0i32;
                    let mut dy = 0i32;
                    for (i, &yy) in ys.iter().enumerate() {
                        for (j, &xx) in xs.iter().enumerate() {
                            let val = data[yy * cols + xx] as i32;
                            dx += deriv[j] * smooth[i] * val;
                            dy += smooth[j] * deriv[i] * val;
                        }
                    }

                    dst_pixel[0] = dx as i16;
                    dst_pixel[1] = dy as i16;
                });
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stereo_image::ImageSize;

    #[test]
    fn test_scharr_constant_image() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let image = Image::<u8, 1>::from_size_val(size, 77)?;
        let mut derivs = Image::<i16, 2>::from_size_val(size, 1)?;

        scharr_derivatives(&image, &mut derivs)?;
        assert!(derivs.as_slice().iter().all(|&v| v == 0));

        Ok(())
    }

    #[test]
    fn test_scharr_vertical_ramp() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 4,
        };
        #[rustfmt::skip]
        let image = Image::<u8, 1>::new(size, vec![
            0, 0, 0,
            10, 10, 10,
            20, 20, 20,
            30, 30, 30,
        ])?;
        let mut derivs = Image::<i16, 2>::from_size_val(size, 0)?;

        scharr_derivatives(&image, &mut derivs)?;

        // interior rows see a full ramp
        assert_eq!(derivs.get_pixel(1, 1, 0)?, &0);
        assert_eq!(derivs.get_pixel(1, 1, 1)?, &(16 * 20));
        // the border row mirrors its neighbour so the derivative vanishes
        assert_eq!(derivs.get_pixel(1, 0, 1)?, &0);
        assert_eq!(derivs.get_pixel(2, 3, 1)?, &0);

        Ok(())
    }

    #[test]
    fn test_scharr_size_mismatch() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let mut derivs = Image::<i16, 2>::from_size_val([2, 3].into(), 0)?;

        assert_eq!(
            scharr_derivatives(&image, &mut derivs),
            Err(ImageError::InvalidImageSize(3, 3, 2, 3))
        );

        Ok(())
    }
}
