use stereo_image::{Image, ImageError};

/// Crop an image to a specified region.
///
/// The size of the region is given by the size of `dst`.
///
/// # Arguments
///
/// * `src` - The source image to crop.
/// * `dst` - The destination image to store the cropped image.
/// * `x` - The x-coordinate of the top-left corner of the region to crop.
/// * `y` - The y-coordinate of the top-left corner of the region to crop.
///
/// # Errors
///
/// Returns an error if the region does not fit inside `src`.
///
/// # Examples
///
/// ```rust
/// use stereo_image::{Image, ImageSize};
/// use stereo_imgproc::crop::crop_image;
///
/// let image = Image::<_, 1>::new(ImageSize { width: 4, height: 4 }, vec![
///     0u8, 1, 2, 3,
///     4u8, 5, 6, 7,
///     8u8, 9, 10, 11,
///     12u8, 13, 14, 15
/// ]).unwrap();
///
/// let mut cropped = Image::<_, 1>::from_size_val(ImageSize { width: 2, height: 2 }, 0u8).unwrap();
///
/// crop_image(&image, &mut cropped, 1, 1).unwrap();
///
/// assert_eq!(cropped.as_slice(), &[5u8, 6, 9, 10]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy,
{
    let dst_cols = dst.cols();

    if x + dst_cols > src.cols() || y + dst.rows() > src.rows() {
        return Err(ImageError::PixelIndexOutOfBounds(
            x + dst_cols,
            y + dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }

    // windows are small, a serial copy of rows is enough
    let src_cols = src.cols();
    let src_data = src.as_slice();
    dst.as_slice_mut()
        .chunks_exact_mut(dst_cols * C)
        .enumerate()
        .for_each(|(i, dst_row)| {
            let offset = ((y + i) * src_cols + x) * C;
            dst_row.copy_from_slice(&src_data[offset..offset + dst_cols * C]);
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use stereo_image::{Image, ImageError, ImageSize};

    #[test]
    fn test_crop() -> Result<(), ImageError> {
        let image_size = ImageSize {
            width: 2,
            height: 3,
        };

        #[rustfmt::skip]
        let image = Image::<_, 2>::new(
            image_size,
            vec![
                0i16, 1, 2, 3,
                4i16, 5, 6, 7,
                8i16, 9, 10, 11,
            ],
        )?;

        let mut cropped = Image::<_, 2>::from_size_val(
            ImageSize {
                width: 1,
                height: 2,
            },
            0i16,
        )?;

        super::crop_image(&image, &mut cropped, 1, 1)?;

        assert_eq!(cropped.as_slice(), &[6i16, 7, 10, 11]);

        Ok(())
    }

    #[test]
    fn test_crop_out_of_bounds() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([4, 4].into(), 0)?;
        let mut cropped = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;

        assert!(super::crop_image(&image, &mut cropped, 2, 0).is_err());
        assert!(super::crop_image(&image, &mut cropped, 1, 1).is_ok());

        Ok(())
    }
}
