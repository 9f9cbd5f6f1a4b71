use rayon::prelude::*;

use crate::filter::{pyramid_gaussian_kernel_1d, reflect_101, scharr_derivatives};
use stereo_image::{Image, ImageDtype, ImageError, ImageSize};

/// Compute the size of the next (coarser) pyramid level.
pub fn pyrdown_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: size.width.div_ceil(2),
        height: size.height.div_ceil(2),
    }
}

/// Blur an image and then downsample it.
///
/// The image is smoothed with the 5x5 gaussian kernel and every second pixel
/// is kept. Borders are mirrored without repeating the border pixel.
///
/// # Arguments
///
/// * `src` - The source image to be downsampled.
/// * `dst` - The destination image of size `((w + 1) / 2, (h + 1) / 2)`.
///
/// # Returns
///
/// * `Result<(), ImageError>` - Ok if successful, Err otherwise.
///
/// # Example
///
/// ```
/// use stereo_image::{Image, ImageSize};
/// use stereo_imgproc::pyramid::pyrdown;
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 5, height: 3 }, 9).unwrap();
/// let mut downsampled = Image::<u8, 1>::from_size_val(ImageSize { width: 3, height: 2 }, 0).unwrap();
///
/// pyrdown(&image, &mut downsampled).unwrap();
/// assert!(downsampled.as_slice().iter().all(|&v| v == 9));
/// ```
pub fn pyrdown<T: ImageDtype>(src: &Image<T, 1>, dst: &mut Image<T, 1>) -> Result<(), ImageError> {
    let expected = pyrdown_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            expected.width,
            expected.height,
            dst.width(),
            dst.height(),
        ));
    }

    if src.is_empty() {
        return Ok(());
    }

    let kernel = pyramid_gaussian_kernel_1d();
    let (src_rows, src_cols) = (src.rows(), src.cols());
    let dst_cols = dst.cols();
    let src_data = src.as_slice();

    // horizontal pass, only on the even columns that survive the decimation
    let mut tmp = vec![0.0f32; src_rows * dst_cols];
    tmp.par_chunks_exact_mut(dst_cols)
        .zip(src_data.par_chunks_exact(src_cols))
        .for_each(|(tmp_row, src_row)| {
            tmp_row.iter_mut().enumerate().for_each(|(x, val)| {
                *val = kernel.iter().enumerate().fold(0.0, |acc, (k, &w)| {
                    let xx = reflect_101(2 * x as isize + k as isize - 2, src_cols);
                    let v: f32 = src_row[xx].into();
                    acc + w * v
                });
            });
        });

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let ys = [0, 1, 2, 3, 4].map(|k| reflect_101(2 * y as isize + k - 2, src_rows));
            dst_row.iter_mut().enumerate().for_each(|(x, val)| {
                let acc = ys
                    .iter()
                    .zip(kernel.iter())
                    .fold(0.0, |acc, (&yy, &w)| acc + w * tmp[yy * dst_cols + x]);
                *val = T::from_f32(acc);
            });
        });

    Ok(())
}

/// A gaussian image pyramid used for coarse to fine searches.
///
/// Level 0 is the original image and every following level halves the
/// resolution of the previous one.
#[derive(Clone, Debug)]
pub struct ImagePyramid<T> {
    levels: Vec<Image<T, 1>>,
}

impl<T: ImageDtype> ImagePyramid<T> {
    /// Build a pyramid with at most `max_level + 1` levels.
    ///
    /// Levels are added until `max_level` is reached or until the next level
    /// would not be larger than `win_size` in both dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::EmptyImage`] if the source image is empty.
    pub fn build(src: &Image<T, 1>, win_size: ImageSize, max_level: usize) -> Result<Self, ImageError> {
        if src.is_empty() {
            return Err(ImageError::EmptyImage);
        }

        let mut levels = vec![src.clone()];
        for _ in 0..max_level {
            let Some(prev) = levels.last() else {
                break;
            };
            let size = pyrdown_size(prev.size());
            if size.width <= win_size.width || size.height <= win_size.height {
                break;
            }
            let mut next = Image::from_size_val(size, T::default())?;
            pyrdown(prev, &mut next)?;
            levels.push(next);
        }

        Ok(Self { levels })
    }
}

impl<T> ImagePyramid<T> {
    /// The images of the pyramid, finest first.
    pub fn levels(&self) -> &[Image<T, 1>] {
        &self.levels
    }

    /// The image at the given level, if present.
    pub fn level(&self, level: usize) -> Option<&Image<T, 1>> {
        self.levels.get(level)
    }

    /// The index of the coarsest level.
    pub fn max_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }
}

/// Scharr derivatives of every level of a gray pyramid.
///
/// Each level holds the (dx, dy) pair as a packed two channel image.
#[derive(Clone, Debug)]
pub struct DerivativePyramid {
    levels: Vec<Image<i16, 2>>,
}

impl DerivativePyramid {
    /// Compute the derivatives of all the levels of `pyramid`.
    pub fn from_pyramid(pyramid: &ImagePyramid<u8>) -> Result<Self, ImageError> {
        let levels = pyramid
            .levels()
            .iter()
            .map(|image| {
                let mut derivs = Image::<i16, 2>::from_size_val(image.size(), 0)?;
                scharr_derivatives(image, &mut derivs)?;
                Ok(derivs)
            })
            .collect::<Result<Vec<_>, ImageError>>()?;

        Ok(Self { levels })
    }

    /// The derivatives at the given level, if present.
    pub fn level(&self, level: usize) -> Option<&Image<i16, 2>> {
        self.levels.get(level)
    }

    /// The number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the pyramid has no level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
