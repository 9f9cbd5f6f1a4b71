use serde::{Deserialize, Serialize};

use stereo_image::{Image, ImageError, ImageSize};
use stereo_imgproc::parallel::{par_iter_rows_val, par_iter_rows_val_count};
use stereo_match::DisparityMap;

use crate::DepthError;

/// The encoding of a depth image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthEncoding {
    /// 32-bit float meters.
    #[default]
    Meters,
    /// 16-bit unsigned millimeters.
    Millimeters,
}

/// A depth image, zero meaning no valid depth.
#[derive(Debug, Clone, PartialEq)]
pub enum DepthImage {
    /// Depth in meters.
    Meters(Image<f32, 1>),
    /// Depth in millimeters.
    Millimeters(Image<u16, 1>),
}

impl DepthImage {
    /// The size of the depth image.
    pub fn size(&self) -> ImageSize {
        match self {
            DepthImage::Meters(d) => d.size(),
            DepthImage::Millimeters(d) => d.size(),
        }
    }

    /// The encoding of the depth image.
    pub fn encoding(&self) -> DepthEncoding {
        match self {
            DepthImage::Meters(_) => DepthEncoding::Meters,
            DepthImage::Millimeters(_) => DepthEncoding::Millimeters,
        }
    }
}

/// A depth sample type that can be read as meters.
pub trait DepthValue: Copy + Send + Sync {
    /// The depth in meters.
    fn to_meters(self) -> f32;
}

impl DepthValue for f32 {
    fn to_meters(self) -> f32 {
        self
    }
}

impl DepthValue for u16 {
    fn to_meters(self) -> f32 {
        self as f32 * 0.001
    }
}

// writes the millimeters of a depth in meters, returns true on overflow
#[inline]
fn meters_to_millimeters(meters: f32, dst: &mut u16) -> bool {
    let mm = meters * 1000.0;
    if mm > 0.0 && mm <= u16::MAX as f32 {
        *dst = mm as u16;
        false
    } else {
        *dst = 0;
        mm > u16::MAX as f32
    }
}

#[inline]
fn disparity_to_depth(disparity: f32, fx: f32, baseline: f32) -> f32 {
    if disparity > 0.0 {
        let depth = baseline * fx / disparity;
        if depth > 0.0 {
            return depth;
        }
    }
    0.0
}

fn warn_overflow(count: usize) {
    if count > 0 {
        log::warn!(
            "{count} depth values ignored because they are over the maximum depth allowed ({} mm)",
            u16::MAX
        );
    }
}

/// Convert a disparity image to a depth image.
///
/// `depth = baseline * fx / disparity` where the disparity is positive, zero
/// elsewhere. Fixed point disparities are divided by 16 first. Depths that do
/// not fit in 16-bit millimeters are set to zero and reported with a warning.
///
/// # Arguments
///
/// * `disparity` - The disparity image.
/// * `fx` - The horizontal focal length in pixels.
/// * `baseline` - The distance between the two cameras in meters.
/// * `encoding` - The encoding of the output depth.
///
/// # Example
///
/// ```
/// use stereo_depth::conversion::{depth_from_disparity, DepthEncoding, DepthImage};
/// use stereo_image::Image;
/// use stereo_match::DisparityMap;
///
/// let disparity = Image::<f32, 1>::new([2, 1].into(), vec![0.0, 10.0]).unwrap();
/// let depth =
///     depth_from_disparity(&DisparityMap::Float(disparity), 500.0, 0.1, DepthEncoding::Millimeters)
///         .unwrap();
///
/// assert_eq!(depth, DepthImage::Millimeters(Image::new([2, 1].into(), vec![0, 5000]).unwrap()));
/// ```
pub fn depth_from_disparity(
    disparity: &DisparityMap,
    fx: f32,
    baseline: f32,
    encoding: DepthEncoding,
) -> Result<DepthImage, DepthError> {
    let size = disparity.size();
    if size.area() == 0 {
        return Err(ImageError::EmptyImage.into());
    }

    let depth = match (disparity, encoding) {
        (DisparityMap::Float(d), DepthEncoding::Meters) => {
            let mut depth = Image::<f32, 1>::from_size_val(size, 0.0)?;
            par_iter_rows_val(d, &mut depth, |&s, dst| {
                *dst = disparity_to_depth(s, fx, baseline)
            });
            DepthImage::Meters(depth)
        }
        (DisparityMap::Fixed(d), DepthEncoding::Meters) => {
            let mut depth = Image::<f32, 1>::from_size_val(size, 0.0)?;
            par_iter_rows_val(d, &mut depth, |&s, dst| {
                *dst = disparity_to_depth(s as f32 / 16.0, fx, baseline)
            });
            DepthImage::Meters(depth)
        }
        (DisparityMap::Float(d), DepthEncoding::Millimeters) => {
            let mut depth = Image::<u16, 1>::from_size_val(size, 0)?;
            let overflow = par_iter_rows_val_count(d, &mut depth, |&s, dst| {
                meters_to_millimeters(disparity_to_depth(s, fx, baseline), dst)
            });
            warn_overflow(overflow);
            DepthImage::Millimeters(depth)
        }
        (DisparityMap::Fixed(d), DepthEncoding::Millimeters) => {
            let mut depth = Image::<u16, 1>::from_size_val(size, 0)?;
            let overflow = par_iter_rows_val_count(d, &mut depth, |&s, dst| {
                meters_to_millimeters(disparity_to_depth(s as f32 / 16.0, fx, baseline), dst)
            });
            warn_overflow(overflow);
            DepthImage::Millimeters(depth)
        }
    };

    Ok(depth)
}

/// Convert a depth image in meters to millimeters.
///
/// Depths are multiplied by 1000 and truncated. Values that do not fit in 16
/// bits are written as zero, counted and reported with a warning.
///
/// # Arguments
///
/// * `src` - The depth in meters.
/// * `dst` - The depth in millimeters, same size as `src`.
///
/// # Returns
///
/// The number of pixels over the maximum depth.
pub fn depth_to_millimeters(src: &Image<f32, 1>, dst: &mut Image<u16, 1>) -> Result<usize, DepthError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        )
        .into());
    }

    let overflow = par_iter_rows_val_count(src, dst, |&s, d| meters_to_millimeters(s, d));
    warn_overflow(overflow);

    Ok(overflow)
}

/// Convert a depth image in millimeters to meters.
pub fn depth_to_meters(src: &Image<u16, 1>, dst: &mut Image<f32, 1>) -> Result<(), DepthError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        )
        .into());
    }

    par_iter_rows_val(src, dst, |&s, d| *d = s as f32 / 1000.0);

    Ok(())
}

/// Sample the depth at a sub-pixel location, in meters.
///
/// The query is rounded to the closest pixel. With smoothing, the center
/// depth (weight 4) is averaged with its 8 neighbors, weighted 2 when
/// 4-connected and 1 when diagonal. Neighbors that are zero, not finite or
/// further than `max_z_error` from the center are ignored.
///
/// # Returns
///
/// The depth in meters, zero if the pixel is outside of the image or has no
/// valid depth.
pub fn get_depth<T: DepthValue>(
    depth: &Image<T, 1>,
    x: f32,
    y: f32,
    smoothing: bool,
    max_z_error: f32,
) -> Result<f32, DepthError> {
    if depth.is_empty() {
        return Err(ImageError::EmptyImage.into());
    }

    let (cols, rows) = (depth.cols() as i32, depth.rows() as i32);
    let u = (x + 0.5) as i32;
    let v = (y + 0.5) as i32;

    if u < 0 || u >= cols || v < 0 || v >= rows {
        log::debug!("depth query ({x}, {y}) outside of the image ({cols}, {rows})");
        return Ok(0.0);
    }

    let data = depth.as_slice();
    let at = |uu: i32, vv: i32| data[(vv * cols + uu) as usize].to_meters();

    let center = at(u, v);
    if center == 0.0 || !center.is_finite() {
        return Ok(0.0);
    }

    if !smoothing {
        return Ok(center);
    }

    let mut sum_weights = 4.0f32;
    let mut sum_depths = center * 4.0;
    for uu in (u - 1).max(0)..=(u + 1).min(cols - 1) {
        for vv in (v - 1).max(0)..=(v + 1).min(rows - 1) {
            if uu == u && vv == v {
                continue;
            }
            let d = at(uu, vv);
            if d != 0.0 && d.is_finite() && (d - center).abs() < max_z_error {
                let w = if uu == u || vv == v { 2.0 } else { 1.0 };
                sum_weights += w;
                sum_depths += d * w;
            }
        }
    }

    Ok(sum_depths / sum_weights)
}

/// Decimate a depth image by keeping one pixel every `decimation` pixels.
///
/// # Arguments
///
/// * `src` - The depth image.
/// * `dst` - The decimated image, of size `src / decimation`.
/// * `decimation` - The decimation factor. It must divide both dimensions.
pub fn decimate<T: Copy>(src: &Image<T, 1>, dst: &mut Image<T, 1>, decimation: usize) -> Result<(), DepthError> {
    if decimation == 0 || src.width() % decimation != 0 || src.height() % decimation != 0 {
        return Err(DepthError::InvalidDecimation(
            decimation,
            src.width(),
            src.height(),
        ));
    }

    let (width, height) = (src.width() / decimation, src.height() / decimation);
    if dst.width() != width || dst.height() != height {
        return Err(ImageError::InvalidImageSize(width, height, dst.width(), dst.height()).into());
    }

    let src_data = src.as_slice();
    let src_cols = src.cols();
    dst.as_slice_mut()
        .chunks_exact_mut(width.max(1))
        .enumerate()
        .for_each(|(j, row)| {
            row.iter_mut().enumerate().for_each(|(i, val)| {
                *val = src_data[j * decimation * src_cols + i * decimation];
            });
        });

    Ok(())
}
