use rayon::prelude::*;

use stereo_image::Image;

/// Apply a function to each pixel in the image in parallel with a value.
///
/// The rows of the image are distributed across the rayon thread pool.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    if src.is_empty() {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * src.cols())
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * src.cols()))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel in parallel and count how many calls
/// returned `true`.
///
/// Used by conversions that need to report how many pixels could not be
/// represented in the destination encoding.
pub fn par_iter_rows_val_count<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) -> bool + Send + Sync,
) -> usize
where
    T1: Send + Sync,
    T2: Send + Sync,
{
    if src.is_empty() {
        return 0;
    }

    src.as_slice()
        .par_chunks_exact(C1 * src.cols())
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * src.cols()))
        .map(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .map(|(src_pixel, dst_pixel)| f(src_pixel, dst_pixel))
                .filter(|&overflow| overflow)
                .count()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stereo_image::ImageError;

    #[test]
    fn test_par_iter_rows_val() -> Result<(), ImageError> {
        let src = Image::<u16, 1>::new([3, 2].into(), vec![0, 1000, 2000, 3000, 4000, 5000])?;
        let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;

        par_iter_rows_val(&src, &mut dst, |&s, d| *d = s as f32 / 1000.0);
        assert_eq!(dst.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        Ok(())
    }

    #[test]
    fn test_par_iter_rows_val_count() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new([4, 1].into(), vec![1.0, 70.0, 2.0, 100.0])?;
        let mut dst = Image::<u16, 1>::from_size_val(src.size(), 0)?;

        let overflow = par_iter_rows_val_count(&src, &mut dst, |&s, d| {
            let mm = s * 1000.0;
            if mm > u16::MAX as f32 {
                *d = 0;
                true
            } else {
                *d = mm as u16;
                false
            }
        });

        assert_eq!(overflow, 2);
        assert_eq!(dst.as_slice(), &[1000, 0, 2000, 0]);

        Ok(())
    }
}
