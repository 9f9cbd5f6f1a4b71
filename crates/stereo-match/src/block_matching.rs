use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use stereo_image::{Image, ImageSize};
use stereo_imgproc::{
    crop::crop_image,
    interpolation::get_rect_sub_pix,
    metrics::{BlockMetric, BlockWindow},
    pyramid::ImagePyramid,
};

use crate::{Correspondence, StereoError};

/// Parameters of the pyramidal block matching search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMatchingParams {
    /// The size of the matching window. Even dimensions are grown by one.
    pub win_size: ImageSize,
    /// The coarsest pyramid level to start the search from.
    pub max_level: usize,
    /// The maximum number of sub-pixel refinement iterations.
    ///
    /// The refinement also never runs more iterations than the number of
    /// candidates scored at level 0, so a narrow final range refines less.
    pub iterations: usize,
    /// The smallest disparity to search, in pixels.
    pub min_disparity: i32,
    /// The largest disparity to search, in pixels.
    pub max_disparity: i32,
    /// The dissimilarity score used to compare windows.
    pub metric: BlockMetric,
}

impl Default for BlockMatchingParams {
    fn default() -> Self {
        Self {
            win_size: ImageSize {
                width: 6,
                height: 3,
            },
            max_level: 3,
            iterations: 5,
            min_disparity: 0,
            max_disparity: 64,
            metric: BlockMetric::Ssd,
        }
    }
}

impl BlockMatchingParams {
    /// Set the matching window size.
    pub fn with_win_size(mut self, win_size: ImageSize) -> Self {
        self.win_size = win_size;
        self
    }

    /// Set the coarsest pyramid level.
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set the maximum number of sub-pixel refinement iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the disparity search range.
    pub fn with_disparity_range(mut self, min_disparity: i32, max_disparity: i32) -> Self {
        self.min_disparity = min_disparity;
        self.max_disparity = max_disparity;
        self
    }

    /// Set the dissimilarity score.
    pub fn with_metric(mut self, metric: BlockMetric) -> Self {
        self.metric = metric;
        self
    }
}

// Best candidate of the search at one pyramid level.
#[derive(Debug, Clone, Copy)]
struct LevelMatch {
    index: i32,
    offset: i32,
    score: f32,
    second_best: Option<f32>,
}

#[derive(Debug, Default, Clone, Copy)]
struct MatchStats {
    candidates: usize,
    refined: usize,
    moved: usize,
    ambiguous: usize,
}

impl std::ops::Add for MatchStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            candidates: self.candidates + other.candidates,
            refined: self.refined + other.refined,
            moved: self.moved + other.moved,
            ambiguous: self.ambiguous + other.ambiguous,
        }
    }
}

fn odd(x: usize) -> usize {
    if x % 2 == 0 {
        x + 1
    } else {
        x
    }
}

// Narrow the right offsets `[local_max, local_min]` so that every candidate
// window and the column on each side of it stay inside a row of `cols` pixels.
fn fit_offsets(
    cx: i32,
    half_w: i32,
    cols: i32,
    mut local_max: i32,
    mut local_min: i32,
) -> (i32, i32) {
    let min_col = cx + local_max - half_w - 1;
    if min_col < 0 {
        local_max -= min_col;
    }
    let max_col = cx + local_min + half_w + 1;
    if max_col > cols - 1 {
        local_min -= max_col - (cols - 1);
    }
    if local_min < local_max {
        local_max = local_min;
    }
    (local_max, local_min)
}

// Outcome of the sub-pixel search around an integer match.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Refined {
    x: f32,
    score: f32,
    // the search left the one pixel neighbourhood of the seed
    rejected: bool,
}

// Half-step search of the best score around `seed`. The step is halved each
// time neither neighbour improves on the current score.
fn refine_subpixel<F>(
    seed: f32,
    seed_score: f32,
    iterations: usize,
    mut score_at: F,
) -> Result<Refined, StereoError>
where
    F: FnMut(f32) -> Result<f32, StereoError>,
{
    let mut xc = seed;
    let mut vc = seed_score;
    let mut step = 0.5f32;
    let mut cache: HashMap<u32, f32> = HashMap::new();

    let mut cached_score = |x: f32| -> Result<f32, StereoError> {
        if let Some(v) = cache.get(&x.to_bits()) {
            return Ok(*v);
        }
        let v = score_at(x)?;
        cache.insert(x.to_bits(), v);
        Ok(v)
    };

    for _ in 0..iterations {
        let x1 = xc - step;
        let x2 = xc + step;
        let v1 = cached_score(x1)?;
        let v2 = cached_score(x2)?;

        if v1 < vc && v1 < v2 {
            xc = x1;
            vc = v1;
        } else if v2 < vc && v2 < v1 {
            xc = x2;
            vc = v2;
        } else {
            step /= 2.0;
        }

        if (xc - seed).abs() > 1.0 {
            return Ok(Refined {
                x: xc,
                score: vc,
                rejected: true,
            });
        }
    }

    Ok(Refined {
        x: xc,
        score: vc,
        rejected: false,
    })
}

/// Find the correspondences of left image points in the right image of a
/// rectified stereo pair.
///
/// The disparity of every point is searched coarse to fine on a gaussian
/// pyramid, scoring every integer candidate of the active range with the
/// selected block metric and narrowing the range around the best candidate
/// before moving to the next finer level. At level 0 the best integer match is
/// refined to sub-pixel precision.
///
/// # Arguments
///
/// * `left` - The left gray image.
/// * `right` - The right gray image, with the same size as `left`.
/// * `left_points` - The (x, y) feature points in the left image.
/// * `params` - The search parameters.
///
/// # Returns
///
/// One correspondence per input point, in the same order.
///
/// # Errors
///
/// Fails if the images are empty or differ in size, or if the disparity range
/// is inverted.
pub fn calc_stereo_correspondences(
    left: &Image<u8, 1>,
    right: &Image<u8, 1>,
    left_points: &[[f32; 2]],
    params: &BlockMatchingParams,
) -> Result<Vec<Correspondence>, StereoError> {
    if left.size() != right.size() {
        return Err(stereo_image::ImageError::InvalidImageSize(
            left.width(),
            left.height(),
            right.width(),
            right.height(),
        )
        .into());
    }

    if params.min_disparity > params.max_disparity {
        return Err(StereoError::InvalidDisparityRange(
            params.min_disparity,
            params.max_disparity,
        ));
    }

    let win_size = ImageSize {
        width: odd(params.win_size.width),
        height: odd(params.win_size.height),
    };

    let left_pyramid = ImagePyramid::build(left, win_size, params.max_level)?;
    let right_pyramid = ImagePyramid::build(right, win_size, left_pyramid.max_level())?;

    let results = left_points
        .par_iter()
        .map(|pt| match_point(&left_pyramid, &right_pyramid, *pt, win_size, params))
        .collect::<Result<Vec<_>, StereoError>>()?;

    let stats = results
        .iter()
        .fold(MatchStats::default(), |acc, (_, s)| acc + *s);
    let valid = results.iter().filter(|(c, _)| c.valid).count();

    log::debug!(
        "block matching: {}/{} valid, sub-pixel moved {}/{}, ambiguous {}, candidates {}",
        valid,
        results.len(),
        stats.moved,
        stats.refined,
        stats.ambiguous,
        stats.candidates
    );

    Ok(results.into_iter().map(|(c, _)| c).collect())
}

fn match_point(
    left_pyramid: &ImagePyramid<u8>,
    right_pyramid: &ImagePyramid<u8>,
    pt: [f32; 2],
    win_size: ImageSize,
    params: &BlockMatchingParams,
) -> Result<(Correspondence, MatchStats), StereoError> {
    let half_w = ((win_size.width - 1) / 2) as i32;
    let half_h = ((win_size.height - 1) / 2) as i32;

    let mut left_win = Image::<u8, 1>::from_size_val(win_size, 0)?;
    let mut right_win = Image::<u8, 1>::from_size_val(win_size, 0)?;

    let mut stats = MatchStats::default();
    let mut tmp_min = params.min_disparity;
    let mut tmp_max = params.max_disparity;
    let mut best: Option<LevelMatch> = None;
    let mut level0_candidates = 0;

    for level in (0..=left_pyramid.max_level()).rev() {
        best = None;

        let (Some(left_img), Some(right_img)) =
            (left_pyramid.level(level), right_pyramid.level(level))
        else {
            continue;
        };

        let scale = 1i32 << level;
        let cx = (pt[0] / scale as f32) as i32;
        let cy = (pt[1] / scale as f32) as i32;
        let (cols, rows) = (left_img.cols() as i32, left_img.rows() as i32);

        // the sub-pixel refinement samples one extra column on both sides
        let pad = if level == 0 { 1 } else { 0 };
        if cx - half_w - pad < 0
            || cx + half_w + pad >= cols
            || cy - half_h < 0
            || cy + half_h >= rows
        {
            continue;
        }

        // right offsets are negative disparities
        let (local_max, local_min) =
            fit_offsets(cx, half_w, cols, -tmp_max / scale, -tmp_min / scale);

        crop_image(
            left_img,
            &mut left_win,
            (cx - half_w) as usize,
            (cy - half_h) as usize,
        )?;

        for (index, offset) in (local_max..=local_min).rev().enumerate() {
            let x0 = cx + offset - half_w;
            if x0 < 0 || x0 + win_size.width as i32 > cols {
                continue;
            }

            stats.candidates += 1;
            if level == 0 {
                level0_candidates += 1;
            }

            crop_image(right_img, &mut right_win, x0 as usize, (cy - half_h) as usize)?;
            let score = params
                .metric
                .score(BlockWindow::from(&left_win), BlockWindow::from(&right_win))?;

            best = match best {
                Some(b) if score >= b.score => Some(LevelMatch {
                    second_best: Some(b.second_best.map_or(score, |s| s.min(score))),
                    ..b
                }),
                prev => Some(LevelMatch {
                    index: index as i32,
                    offset,
                    score,
                    second_best: prev.map(|b| b.score),
                }),
            };
        }

        if let Some(b) = best {
            if level > 0 {
                let lvl = level as i32;
                tmp_max = tmp_min + (b.index + 1) * scale;
                tmp_max += tmp_max % lvl;
                tmp_max = tmp_max.min(params.max_disparity);

                tmp_min += (b.index - 1) * scale;
                tmp_min -= tmp_min % lvl;
                tmp_min = tmp_min.max(params.min_disparity);
            }
        }
    }

    let Some(best) = best else {
        return Ok((Correspondence::invalid(pt), stats));
    };

    if best.second_best == Some(best.score) {
        stats.ambiguous += 1;
    }

    let (Some(left_img), Some(right_img)) = (left_pyramid.level(0), right_pyramid.level(0)) else {
        return Ok((Correspondence::invalid(pt), stats));
    };

    // sub-pixel refinement
    stats.refined += 1;
    let seed = pt[0] + best.offset as f32;

    let mut left_win = Image::<f32, 1>::from_size_val(win_size, 0.0)?;
    let mut right_win = Image::<f32, 1>::from_size_val(win_size, 0.0)?;
    get_rect_sub_pix(left_img, pt, &mut left_win)?;

    let mut score_at = |x: f32| -> Result<f32, StereoError> {
        get_rect_sub_pix(right_img, [x, pt[1]], &mut right_win)?;
        Ok(params
            .metric
            .score(BlockWindow::from(&left_win), BlockWindow::from(&right_win))?)
    };

    let mut vc = best.score;
    if pt[0] != pt[0].trunc() {
        vc = score_at(seed)?;
    }

    let budget = params.iterations.min(level0_candidates);
    let refined = refine_subpixel(seed, vc, budget, score_at)?;
    if refined.rejected {
        return Ok((
            Correspondence {
                right: [refined.x, pt[1]],
                ..Correspondence::invalid(pt)
            },
            stats,
        ));
    }

    if refined.x != seed {
        stats.moved += 1;
    }

    Ok((
        Correspondence {
            left: pt,
            right: [refined.x, pt[1]],
            valid: true,
            error: Some(refined.score),
        },
        stats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // horizontally textured image, rows are identical
    fn textured(width: usize, height: usize, shift: usize) -> Result<Image<u8, 1>, StereoError> {
        let mut data = Vec::with_capacity(width * height);
        for _ in 0..height {
            for x in 0..width {
                let u = x + shift;
                data.push(((u * 37 + (u * u) % 23) % 251) as u8);
            }
        }
        Ok(Image::new([width, height].into(), data)?)
    }

    #[test]
    fn test_default_params() {
        let params = BlockMatchingParams::default()
            .with_metric(BlockMetric::Sad)
            .with_disparity_range(2, 10);
        assert_eq!(params.metric, BlockMetric::Sad);
        assert_eq!((params.min_disparity, params.max_disparity), (2, 10));
        assert_eq!(params.win_size.width, 6);
    }

    #[test]
    fn test_params_from_json() -> Result<(), serde_json::Error> {
        let json = r#"{
            "win_size": { "width": 9, "height": 5 },
            "max_level": 2,
            "iterations": 8,
            "min_disparity": 1,
            "max_disparity": 48,
            "metric": "Sad"
        }"#;
        let params: BlockMatchingParams = serde_json::from_str(json)?;

        assert_eq!(
            params,
            BlockMatchingParams::default()
                .with_win_size([9, 5].into())
                .with_max_level(2)
                .with_iterations(8)
                .with_disparity_range(1, 48)
                .with_metric(BlockMetric::Sad)
        );

        Ok(())
    }

    #[test]
    fn test_integer_shift_single_level() -> Result<(), StereoError> {
        let left = textured(48, 9, 0)?;
        // right(x) = left(x + 4), i.e. disparity 4
        let right = textured(48, 9, 4)?;

        let params = BlockMatchingParams::default()
            .with_win_size([5, 5].into())
            .with_max_level(0)
            .with_disparity_range(0, 10);

        let points = [[20.0, 4.0], [30.0, 4.0]];
        let matches = calc_stereo_correspondences(&left, &right, &points, &params)?;

        assert_eq!(matches.len(), 2);
        for m in matches.iter() {
            assert!(m.valid);
            assert_eq!(m.right, [m.left[0] - 4.0, 4.0]);
            assert_eq!(m.disparity(), 4.0);
            assert_eq!(m.error, Some(0.0));
        }

        Ok(())
    }

    #[test]
    fn test_point_off_image_is_invalid() -> Result<(), StereoError> {
        let left = textured(32, 16, 0)?;
        let right = left.clone();

        let params = BlockMatchingParams::default()
            .with_win_size([5, 5].into())
            .with_max_level(2);

        let points = [[0.0, 0.0], [31.0, 15.0]];
        let matches = calc_stereo_correspondences(&left, &right, &points, &params)?;

        assert!(matches.iter().all(|m| !m.valid));
        assert_eq!(matches[0], Correspondence::invalid([0.0, 0.0]));

        Ok(())
    }

    #[test]
    fn test_invalid_inputs() -> Result<(), StereoError> {
        let left = Image::<u8, 1>::from_size_val([16, 16].into(), 0)?;
        let right = Image::<u8, 1>::from_size_val([16, 8].into(), 0)?;
        let params = BlockMatchingParams::default();

        assert!(matches!(
            calc_stereo_correspondences(&left, &right, &[], &params),
            Err(StereoError::ImageError(_))
        ));

        let params = params.with_disparity_range(5, 1);
        assert_eq!(
            calc_stereo_correspondences(&left, &left, &[], &params),
            Err(StereoError::InvalidDisparityRange(5, 1))
        );

        Ok(())
    }

    #[test]
    fn test_border_points_wide_range() -> Result<(), StereoError> {
        let left = textured(48, 9, 0)?;
        let right = textured(48, 9, 4)?;

        let params = BlockMatchingParams::default()
            .with_win_size([5, 5].into())
            .with_max_level(0);

        // near the left border most of 0..40 falls off the right image
        let params = params.with_disparity_range(0, 40);
        let matches = calc_stereo_correspondences(&left, &right, &[[8.0, 4.0]], &params)?;
        assert!(matches[0].valid);
        assert_eq!(matches[0].right, [4.0, 4.0]);

        // near the right border the negative disparities are cut
        let params = params.with_disparity_range(-10, 10);
        let matches = calc_stereo_correspondences(&left, &right, &[[44.0, 4.0]], &params)?;
        assert!(matches[0].valid);
        assert_eq!(matches[0].right, [40.0, 4.0]);

        Ok(())
    }

    #[test]
    fn test_fit_offsets() {
        // already inside
        assert_eq!(fit_offsets(20, 2, 48, -10, 0), (-10, 0));
        // left side clamped to the first column with a margin
        assert_eq!(fit_offsets(8, 2, 48, -40, 0), (-5, 0));
        // right side clamped to the last column with a margin
        assert_eq!(fit_offsets(44, 2, 48, -10, 10), (-10, 0));
        // a range entirely past the border collapses to its nearest end
        assert_eq!(fit_offsets(8, 2, 48, -40, -20), (-20, -20));
    }

    #[test]
    fn test_refine_subpixel_converges() -> Result<(), StereoError> {
        let refined = refine_subpixel(10.0, 0.0625, 5, |x| Ok((x - 10.25) * (x - 10.25)))?;
        assert_eq!(
            refined,
            Refined {
                x: 10.25,
                score: 0.0,
                rejected: false
            }
        );
        Ok(())
    }

    #[test]
    fn test_refine_subpixel_rejects_far_minimum() -> Result<(), StereoError> {
        // the minimum is 3 px away, the search walks out of the seed pixel
        let score = |x: f32| Ok((x - 13.0) * (x - 13.0));

        let refined = refine_subpixel(10.0, 9.0, 5, score)?;
        assert!(refined.rejected);
        assert_eq!(refined.x, 11.5);

        // a smaller budget stops right on the one pixel limit
        let refined = refine_subpixel(10.0, 9.0, 2, score)?;
        assert!(!refined.rejected);
        assert_eq!((refined.x, refined.score), (11.0, 4.0));

        Ok(())
    }

    #[test]
    fn test_refine_subpixel_caches_scores() -> Result<(), StereoError> {
        let mut calls = 0;
        let refined = refine_subpixel(10.0, 0.0, 4, |_| {
            calls += 1;
            Ok(1.0)
        })?;

        // a flat score only halves the step, 4 iterations sample 8 distinct
        // positions
        assert_eq!(refined.x, 10.0);
        assert_eq!(calls, 8);

        Ok(())
    }

    #[test]
    fn test_odd_window() {
        assert_eq!(odd(6), 7);
        assert_eq!(odd(3), 3);
        assert_eq!(odd(0), 1);
    }
}
