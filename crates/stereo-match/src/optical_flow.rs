use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use stereo_image::{Image, ImageError, ImageSize};
use stereo_imgproc::pyramid::{DerivativePyramid, ImagePyramid};

use crate::{Correspondence, StereoError};

const W_BITS: i32 = 14;
const FLT_SCALE: f32 = 1.0 / (1 << 20) as f32;

/// Termination criteria of the iterative tracker.
///
/// At least one of the two criteria must be set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermCriteria {
    /// The maximum number of iterations per pyramid level, clamped to `[0, 100]`.
    pub max_count: Option<usize>,
    /// The minimum step length, clamped to `[0, 10]`.
    pub epsilon: Option<f64>,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_count: Some(30),
            epsilon: Some(0.01),
        }
    }
}

impl TermCriteria {
    /// Set the maximum number of iterations.
    pub fn with_max_count(mut self, max_count: Option<usize>) -> Self {
        self.max_count = max_count;
        self
    }

    /// Set the minimum step length.
    pub fn with_epsilon(mut self, epsilon: Option<f64>) -> Self {
        self.epsilon = epsilon;
        self
    }

    // (max count, squared epsilon)
    fn resolve(&self) -> Result<(usize, f64), StereoError> {
        if self.max_count.is_none() && self.epsilon.is_none() {
            return Err(StereoError::MissingTermCriteria);
        }
        let max_count = self.max_count.map_or(30, |c| c.min(100));
        let epsilon = self.epsilon.map_or(0.01, |e| e.clamp(0.0, 10.0));
        Ok((max_count, epsilon * epsilon))
    }
}

/// Flags of the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LkFlags {
    /// Start the search from the provided next points instead of the
    /// previous points.
    pub use_initial_flow: bool,
    /// Report the minimum eigenvalue of the spatial gradient matrix as the
    /// error instead of the mean absolute intensity difference.
    pub get_min_eigenvals: bool,
}

/// Parameters of the horizontally constrained pyramidal Lucas-Kanade tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LkStereoParams {
    /// The size of the integration window, larger than 2 in both dimensions.
    pub win_size: ImageSize,
    /// The coarsest pyramid level.
    pub max_level: usize,
    /// The termination criteria of the per level iterations.
    pub criteria: TermCriteria,
    /// The tracker flags.
    pub flags: LkFlags,
    /// Points whose spatial gradient matrix has a smaller minimum eigenvalue
    /// are rejected.
    pub min_eig_threshold: f64,
}

impl Default for LkStereoParams {
    fn default() -> Self {
        Self {
            win_size: ImageSize {
                width: 21,
                height: 21,
            },
            max_level: 3,
            criteria: TermCriteria::default(),
            flags: LkFlags::default(),
            min_eig_threshold: 1e-4,
        }
    }
}

impl LkStereoParams {
    /// Set the integration window size.
    pub fn with_win_size(mut self, win_size: ImageSize) -> Self {
        self.win_size = win_size;
        self
    }

    /// Set the coarsest pyramid level.
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set the termination criteria.
    pub fn with_criteria(mut self, criteria: TermCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Set the tracker flags.
    pub fn with_flags(mut self, flags: LkFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the minimum eigenvalue threshold.
    pub fn with_min_eig_threshold(mut self, min_eig_threshold: f64) -> Self {
        self.min_eig_threshold = min_eig_threshold;
        self
    }
}

/// Gray pyramid of the first image of the pair along with its derivatives.
#[derive(Clone, Debug)]
pub struct LkPyramid {
    images: ImagePyramid<u8>,
    derivatives: DerivativePyramid,
}

impl LkPyramid {
    /// Build the gray and derivative pyramids of an image.
    pub fn build(src: &Image<u8, 1>, win_size: ImageSize, max_level: usize) -> Result<Self, StereoError> {
        let images = ImagePyramid::build(src, win_size, max_level)?;
        let derivatives = DerivativePyramid::from_pyramid(&images)?;
        Ok(Self {
            images,
            derivatives,
        })
    }

    /// The gray pyramid.
    pub fn images(&self) -> &ImagePyramid<u8> {
        &self.images
    }

    /// The derivative pyramid.
    pub fn derivatives(&self) -> &DerivativePyramid {
        &self.derivatives
    }

    /// The index of the coarsest level.
    pub fn max_level(&self) -> usize {
        self.images.max_level()
    }
}

fn validate(
    num_points: usize,
    next_points: Option<&[[f32; 2]]>,
    params: &LkStereoParams,
) -> Result<(), StereoError> {
    if params.win_size.width <= 2 || params.win_size.height <= 2 {
        return Err(StereoError::InvalidWindowSize(
            params.win_size.width,
            params.win_size.height,
        ));
    }

    params.criteria.resolve()?;

    if params.flags.use_initial_flow {
        let n = next_points.map_or(0, |p| p.len());
        if n != num_points {
            return Err(StereoError::InitialPointsMismatch(num_points, n));
        }
    }

    Ok(())
}

/// Track points from the left to the right image of a rectified stereo pair.
///
/// Pyramidal Lucas-Kanade where the motion is restricted to the horizontal
/// axis: the vertical component of every update step is zero.
///
/// # Arguments
///
/// * `prev` - The left gray image.
/// * `next` - The right gray image, with the same size as `prev`.
/// * `prev_points` - The (x, y) points to track in `prev`.
/// * `next_points` - The initial estimates in `next`, used with
///   [`LkFlags::use_initial_flow`].
/// * `params` - The tracker parameters.
///
/// # Returns
///
/// One correspondence per input point. The error is the minimum eigenvalue
/// when [`LkFlags::get_min_eigenvals`] is set, otherwise the mean absolute
/// intensity difference of the windows.
pub fn calc_optical_flow_pyr_lk_stereo(
    prev: &Image<u8, 1>,
    next: &Image<u8, 1>,
    prev_points: &[[f32; 2]],
    next_points: Option<&[[f32; 2]]>,
    params: &LkStereoParams,
) -> Result<Vec<Correspondence>, StereoError> {
    validate(prev_points.len(), next_points, params)?;

    if prev_points.is_empty() {
        return Ok(Vec::new());
    }

    let prev_pyramid = LkPyramid::build(prev, params.win_size, params.max_level)?;
    let next_pyramid = ImagePyramid::build(next, params.win_size, prev_pyramid.max_level())?;

    calc_optical_flow_pyr_lk_stereo_pyramids(
        &prev_pyramid,
        &next_pyramid,
        prev_points,
        next_points,
        params,
    )
}

/// Track points from the left to the right image using precomputed pyramids.
///
/// See [`calc_optical_flow_pyr_lk_stereo`]. The number of levels used is the
/// smallest of `params.max_level` and the levels of both pyramids.
pub fn calc_optical_flow_pyr_lk_stereo_pyramids(
    prev: &LkPyramid,
    next: &ImagePyramid<u8>,
    prev_points: &[[f32; 2]],
    next_points: Option<&[[f32; 2]]>,
    params: &LkStereoParams,
) -> Result<Vec<Correspondence>, StereoError> {
    validate(prev_points.len(), next_points, params)?;

    if prev_points.is_empty() {
        return Ok(Vec::new());
    }

    let (max_count, epsilon) = params.criteria.resolve()?;

    let max_level = params
        .max_level
        .min(prev.max_level())
        .min(next.max_level());

    if prev.derivatives().len() != prev.images().levels().len() {
        return Err(StereoError::PyramidMismatch(
            prev.derivatives().len(),
            prev.images().levels().len(),
        ));
    }

    let mut levels = Vec::with_capacity(max_level + 1);
    for level in 0..=max_level {
        let (Some(i), Some(d), Some(j)) = (
            prev.images().level(level),
            prev.derivatives().level(level),
            next.level(level),
        ) else {
            return Err(StereoError::PyramidMismatch(prev.max_level(), next.max_level()));
        };
        if i.size() != j.size() {
            return Err(ImageError::InvalidImageSize(i.width(), i.height(), j.width(), j.height()).into());
        }
        levels.push(LevelImages { i, d, j });
    }

    let tracker = Tracker {
        levels,
        win_size: params.win_size,
        max_count,
        epsilon,
        flags: params.flags,
        min_eig_threshold: params.min_eig_threshold,
    };

    let use_initial = params.flags.use_initial_flow;
    let results = prev_points
        .par_iter()
        .enumerate()
        .map(|(idx, pt)| {
            let initial = match next_points {
                Some(p) if use_initial => p.get(idx).copied(),
                _ => None,
            };
            tracker.track(*pt, initial)
        })
        .collect::<Vec<_>>();

    log::debug!(
        "stereo lk: {}/{} points tracked over {} levels",
        results.iter().filter(|c| c.valid).count(),
        results.len(),
        max_level + 1
    );

    Ok(results)
}

struct LevelImages<'a> {
    i: &'a Image<u8, 1>,
    d: &'a Image<i16, 2>,
    j: &'a Image<u8, 1>,
}

struct Tracker<'a> {
    levels: Vec<LevelImages<'a>>,
    win_size: ImageSize,
    max_count: usize,
    epsilon: f64,
    flags: LkFlags,
    min_eig_threshold: f64,
}

#[inline]
fn descale(x: i32, n: i32) -> i32 {
    (x + (1 << (n - 1))) >> n
}

// fixed point bilinear weights summing to 1 << W_BITS
fn bilinear_weights(a: f32, b: f32) -> [i32; 4] {
    let scale = (1 << W_BITS) as f32;
    let iw00 = ((1.0 - a) * (1.0 - b) * scale).round_ties_even() as i32;
    let iw01 = (a * (1.0 - b) * scale).round_ties_even() as i32;
    let iw10 = ((1.0 - a) * b * scale).round_ties_even() as i32;
    let iw11 = (1 << W_BITS) - iw00 - iw01 - iw10;
    [iw00, iw01, iw10, iw11]
}

// pixel access replicating the border
#[inline]
fn at_u8(image: &Image<u8, 1>, x: i32, y: i32) -> i32 {
    let xx = x.clamp(0, image.cols() as i32 - 1) as usize;
    let yy = y.clamp(0, image.rows() as i32 - 1) as usize;
    image.as_slice()[yy * image.cols() + xx] as i32
}

#[inline]
fn at_i16x2(image: &Image<i16, 2>, x: i32, y: i32) -> [i32; 2] {
    let xx = x.clamp(0, image.cols() as i32 - 1) as usize;
    let yy = y.clamp(0, image.rows() as i32 - 1) as usize;
    let idx = 2 * (yy * image.cols() + xx);
    let data = image.as_slice();
    [data[idx] as i32, data[idx + 1] as i32]
}

// interpolated intensity scaled by 32
#[inline]
fn interp_u8(image: &Image<u8, 1>, x: i32, y: i32, w: &[i32; 4]) -> i32 {
    descale(
        at_u8(image, x, y) * w[0]
            + at_u8(image, x + 1, y) * w[1]
            + at_u8(image, x, y + 1) * w[2]
            + at_u8(image, x + 1, y + 1) * w[3],
        W_BITS - 5,
    )
}

impl Tracker<'_> {
    fn out_of_range(&self, ix: i32, iy: i32, cols: usize, rows: usize) -> bool {
        ix < -(self.win_size.width as i32)
            || ix >= cols as i32
            || iy < -(self.win_size.height as i32)
            || iy >= rows as i32
    }

    fn track(&self, pt: [f32; 2], initial: Option<[f32; 2]>) -> Correspondence {
        let (win_w, win_h) = (self.win_size.width, self.win_size.height);
        let half_win = [(win_w as f32 - 1.0) * 0.5, (win_h as f32 - 1.0) * 0.5];
        let area = win_w * win_h;
        let max_level = self.levels.len() - 1;

        let mut status = true;
        let mut err = 0.0f32;
        let mut next_out = pt;

        let mut i_win = vec![0i32; area];
        let mut d_win = vec![[0i32; 2]; area];

        for (level, imgs) in self.levels.iter().enumerate().rev() {
            let scale = 1.0 / (1 << level) as f32;
            let prev_pt = [pt[0] * scale, pt[1] * scale];

            let mut next_pt = if level == max_level {
                match initial {
                    Some(p) => [p[0] * scale, p[1] * scale],
                    None => prev_pt,
                }
            } else {
                [next_out[0] * 2.0, next_out[1] * 2.0]
            };
            next_out = next_pt;

            let (cols, rows) = (imgs.i.cols(), imgs.i.rows());

            let p = [prev_pt[0] - half_win[0], prev_pt[1] - half_win[1]];
            let (ipx, ipy) = (p[0].floor() as i32, p[1].floor() as i32);

            if self.out_of_range(ipx, ipy, cols, rows) {
                if level == 0 {
                    status = false;
                    err = 0.0;
                }
                continue;
            }

            let w = bilinear_weights(p[0] - ipx as f32, p[1] - ipy as f32);

            // window of the first image and its covariation matrix
            let (mut ia11, mut ia12, mut ia22) = (0f32, 0f32, 0f32);
            for y in 0..win_h {
                for x in 0..win_w {
                    let (sx, sy) = (ipx + x as i32, ipy + y as i32);
                    let ival = interp_u8(imgs.i, sx, sy, &w);

                    let d00 = at_i16x2(imgs.d, sx, sy);
                    let d01 = at_i16x2(imgs.d, sx + 1, sy);
                    let d10 = at_i16x2(imgs.d, sx, sy + 1);
                    let d11 = at_i16x2(imgs.d, sx + 1, sy + 1);
                    let ixval = descale(
                        d00[0] * w[0] + d01[0] * w[1] + d10[0] * w[2] + d11[0] * w[3],
                        W_BITS,
                    );
                    let iyval = descale(
                        d00[1] * w[0] + d01[1] * w[1] + d10[1] * w[2] + d11[1] * w[3],
                        W_BITS,
                    );

                    i_win[y * win_w + x] = ival;
                    d_win[y * win_w + x] = [ixval, iyval];

                    ia11 += (ixval * ixval) as f32;
                    ia12 += (ixval * iyval) as f32;
                    ia22 += (iyval * iyval) as f32;
                }
            }

            let a11 = ia11 * FLT_SCALE;
            let a12 = ia12 * FLT_SCALE;
            let a22 = ia22 * FLT_SCALE;

            let det = a11 * a22 - a12 * a12;
            let min_eig = (a22 + a11 - ((a11 - a22) * (a11 - a22) + 4.0 * a12 * a12).sqrt())
                / (2 * area) as f32;

            if self.flags.get_min_eigenvals {
                err = min_eig;
            }

            if (min_eig as f64) < self.min_eig_threshold || det < f32::EPSILON {
                if level == 0 {
                    status = false;
                }
                continue;
            }

            let inv_det = 1.0 / det;

            next_pt[0] -= half_win[0];
            next_pt[1] -= half_win[1];
            let mut prev_delta = [0.0f32; 2];

            for iter in 0..self.max_count {
                let (inx, iny) = (next_pt[0].floor() as i32, next_pt[1].floor() as i32);

                if self.out_of_range(inx, iny, cols, rows) {
                    if level == 0 {
                        status = false;
                    }
                    break;
                }

                let w = bilinear_weights(next_pt[0] - inx as f32, next_pt[1] - iny as f32);
                let (mut ib1, mut ib2) = (0f32, 0f32);
                for y in 0..win_h {
                    for x in 0..win_w {
                        let jval = interp_u8(imgs.j, inx + x as i32, iny + y as i32, &w);
                        let diff = jval - i_win[y * win_w + x];
                        let [dx, dy] = d_win[y * win_w + x];
                        ib1 += (diff * dx) as f32;
                        ib2 += (diff * dy) as f32;
                    }
                }

                let b1 = ib1 * FLT_SCALE;
                let b2 = ib2 * FLT_SCALE;

                // rectified pair, the vertical update is dropped
                let delta = [(a12 * b2 - a22 * b1) * inv_det, 0.0f32];

                next_pt[0] += delta[0];
                next_pt[1] += delta[1];
                next_out = [next_pt[0] + half_win[0], next_pt[1] + half_win[1]];

                let norm2 = (delta[0] as f64).powi(2) + (delta[1] as f64).powi(2);
                if norm2 <= self.epsilon {
                    break;
                }

                if iter > 0
                    && (delta[0] + prev_delta[0]).abs() < 0.01
                    && (delta[1] + prev_delta[1]).abs() < 0.01
                {
                    next_out[0] -= delta[0] * 0.5;
                    next_out[1] -= delta[1] * 0.5;
                    break;
                }
                prev_delta = delta;
            }

            if status && level == 0 && !self.flags.get_min_eigenvals {
                let np = [next_out[0] - half_win[0], next_out[1] - half_win[1]];
                let (inx, iny) = (np[0].floor() as i32, np[1].floor() as i32);

                if self.out_of_range(inx, iny, cols, rows) {
                    status = false;
                    continue;
                }

                let w = bilinear_weights(np[0] - inx as f32, np[1] - iny as f32);
                let mut errval = 0.0f32;
                for y in 0..win_h {
                    for x in 0..win_w {
                        let jval = interp_u8(imgs.j, inx + x as i32, iny + y as i32, &w);
                        errval += ((jval - i_win[y * win_w + x]) as f32).abs();
                    }
                }
                err = errval / (32 * area) as f32;
            }
        }

        Correspondence {
            left: pt,
            right: next_out,
            valid: status,
            error: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // smooth horizontal texture so that the gradients are well conditioned
    fn texture(width: usize, height: usize, shift: f32) -> Result<Image<u8, 1>, StereoError> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let u = x as f32 + shift;
                let v = y as f32;
                let val = 128.0 + 60.0 * (u * 0.3).sin() + 40.0 * (v * 0.25 + u * 0.1).cos();
                data.push(val.round().clamp(0.0, 255.0) as u8);
            }
        }
        Ok(Image::new([width, height].into(), data)?)
    }

    #[test]
    fn test_term_criteria_resolve() -> Result<(), StereoError> {
        assert_eq!(TermCriteria::default().resolve()?, (30, 0.01 * 0.01));

        let c = TermCriteria::default()
            .with_max_count(Some(500))
            .with_epsilon(None);
        assert_eq!(c.resolve()?, (100, 0.01 * 0.01));

        let c = TermCriteria::default()
            .with_max_count(None)
            .with_epsilon(Some(20.0));
        assert_eq!(c.resolve()?, (30, 100.0));

        let c = TermCriteria {
            max_count: None,
            epsilon: None,
        };
        assert_eq!(c.resolve(), Err(StereoError::MissingTermCriteria));

        Ok(())
    }

    #[test]
    fn test_bilinear_weights_sum() {
        for (a, b) in [(0.0, 0.0), (0.5, 0.5), (0.3, 0.9), (0.999, 0.001)] {
            let w = bilinear_weights(a, b);
            assert_eq!(w.iter().sum::<i32>(), 1 << W_BITS);
        }
        assert_eq!(bilinear_weights(0.0, 0.0), [1 << W_BITS, 0, 0, 0]);
    }

    #[test]
    fn test_descale() {
        assert_eq!(descale(255 << W_BITS, W_BITS - 5), 255 * 32);
        assert_eq!(descale(-(3 << W_BITS), W_BITS), -3);
    }

    #[test]
    fn test_invalid_params() -> Result<(), StereoError> {
        let image = Image::<u8, 1>::from_size_val([32, 32].into(), 0)?;
        let points = [[10.0, 10.0]];

        let params = LkStereoParams::default().with_win_size([2, 5].into());
        assert_eq!(
            calc_optical_flow_pyr_lk_stereo(&image, &image, &points, None, &params),
            Err(StereoError::InvalidWindowSize(2, 5))
        );

        let params = LkStereoParams::default().with_flags(LkFlags {
            use_initial_flow: true,
            get_min_eigenvals: false,
        });
        assert_eq!(
            calc_optical_flow_pyr_lk_stereo(&image, &image, &points, None, &params),
            Err(StereoError::InitialPointsMismatch(1, 0))
        );

        let params = LkStereoParams::default().with_criteria(TermCriteria {
            max_count: None,
            epsilon: None,
        });
        assert_eq!(
            calc_optical_flow_pyr_lk_stereo(&image, &image, &points, None, &params),
            Err(StereoError::MissingTermCriteria)
        );

        Ok(())
    }

    #[test]
    fn test_empty_points() -> Result<(), StereoError> {
        let image = Image::<u8, 1>::from_size_val([32, 32].into(), 0)?;
        let out =
            calc_optical_flow_pyr_lk_stereo(&image, &image, &[], None, &LkStereoParams::default())?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_flat_image_rejected() -> Result<(), StereoError> {
        let image = Image::<u8, 1>::from_size_val([64, 64].into(), 100)?;
        let params = LkStereoParams::default().with_flags(LkFlags {
            use_initial_flow: false,
            get_min_eigenvals: true,
        });

        let out = calc_optical_flow_pyr_lk_stereo(&image, &image, &[[32.0, 32.0]], None, &params)?;
        assert!(!out[0].valid);
        assert_eq!(out[0].error, Some(0.0));

        Ok(())
    }

    #[test]
    fn test_identical_images() -> Result<(), StereoError> {
        let image = texture(96, 64, 0.0)?;
        let params = LkStereoParams::default()
            .with_win_size([11, 11].into())
            .with_max_level(1);

        let out = calc_optical_flow_pyr_lk_stereo(&image, &image, &[[48.0, 32.0]], None, &params)?;

        assert!(out[0].valid);
        assert_relative_eq!(out[0].right[0], 48.0, epsilon = 1e-3);
        assert_eq!(out[0].right[1], 32.0);
        assert_relative_eq!(out[0].error.unwrap_or(f32::MAX), 0.0, epsilon = 1e-3);

        Ok(())
    }

    #[test]
    fn test_horizontal_shift() -> Result<(), StereoError> {
        let left = texture(96, 64, 0.0)?;
        // right(x) = left(x + 3), the match of x is x - 3
        let right = texture(96, 64, 3.0)?;

        let params = LkStereoParams::default()
            .with_win_size([15, 15].into())
            .with_max_level(2);

        let points = [[40.0, 30.0], [55.0, 25.0]];
        let out = calc_optical_flow_pyr_lk_stereo(&left, &right, &points, None, &params)?;

        for (c, p) in out.iter().zip(points.iter()) {
            assert!(c.valid);
            assert_relative_eq!(c.right[0], p[0] - 3.0, epsilon = 0.25);
            // the vertical coordinate never moves
            assert_eq!(c.right[1], p[1]);
        }

        Ok(())
    }

    #[test]
    fn test_initial_flow_converges() -> Result<(), StereoError> {
        let left = texture(96, 64, 0.0)?;
        let right = texture(96, 64, 3.0)?;

        let params = LkStereoParams::default()
            .with_win_size([15, 15].into())
            .with_max_level(0)
            .with_flags(LkFlags {
                use_initial_flow: true,
                get_min_eigenvals: false,
            });

        // seeds on both sides of the true match
        let points = [[40.0, 30.0], [55.0, 25.0]];
        let initial = [[37.5, 30.0], [51.0, 25.0]];
        let out =
            calc_optical_flow_pyr_lk_stereo(&left, &right, &points, Some(&initial[..]), &params)?;

        for (c, p) in out.iter().zip(points.iter()) {
            assert!(c.valid);
            assert_relative_eq!(c.right[0], p[0] - 3.0, epsilon = 0.05);
            assert_eq!(c.right[1], p[1]);
        }

        Ok(())
    }

    #[test]
    fn test_oscillating_steps_settle_halfway() -> Result<(), StereoError> {
        // the right ramp is twice as steep as the left one, every step
        // overshoots the match at x = 30 by the same distance
        let (width, height) = (64, 32);
        let mut left = Vec::with_capacity(width * height);
        let mut right = Vec::with_capacity(width * height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let bowl = (y - 16) * (y - 16);
                left.push((4 * (x - 32) + 128 + bowl).clamp(0, 255) as u8);
                right.push((8 * (x - 30) + 128 + bowl).clamp(0, 255) as u8);
            }
        }
        let left = Image::<u8, 1>::new([width, height].into(), left)?;
        let right = Image::<u8, 1>::new([width, height].into(), right)?;

        let params = LkStereoParams::default()
            .with_win_size([7, 7].into())
            .with_max_level(0);

        // 32 -> 28 -> 32, then half of the last step back
        let out = calc_optical_flow_pyr_lk_stereo(&left, &right, &[[32.0, 16.0]], None, &params)?;
        assert!(out[0].valid);
        assert_relative_eq!(out[0].right[0], 30.0, epsilon = 1e-4);
        assert_eq!(out[0].right[1], 16.0);

        Ok(())
    }
}
