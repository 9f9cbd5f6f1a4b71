use serde::{Deserialize, Serialize};

use stereo_image::Image;

/// Configuration of the registered depth hole filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleFillingConfig {
    /// Fill holes between vertical neighbors.
    pub vertical: bool,
    /// Fill holes between horizontal neighbors.
    pub horizontal: bool,
    /// Also bridge holes two pixels wide.
    pub double_holes: bool,
}

impl Default for HoleFillingConfig {
    fn default() -> Self {
        Self {
            vertical: true,
            horizontal: true,
            double_holes: false,
        }
    }
}

impl HoleFillingConfig {
    /// Enable or disable the vertical filling.
    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    /// Enable or disable the horizontal filling.
    pub fn with_horizontal(mut self, horizontal: bool) -> Self {
        self.horizontal = horizontal;
        self
    }

    /// Enable or disable the filling of two pixels wide holes.
    pub fn with_double_holes(mut self, double_holes: bool) -> Self {
        self.double_holes = double_holes;
        self
    }
}

// relative tolerance of 1% of the mean of the two anchors
#[inline]
fn tolerance(a: i32, c: i32) -> i32 {
    (0.01 * ((a + c) / 2) as f64) as i32
}

// b is a hole or a spike above both anchors
#[inline]
fn is_fillable(b: i32, a: i32, c: i32, err: i32) -> bool {
    b == 0 || (b > a + err && b > c + err)
}

// fills data[ib] from the anchors data[ia] and data[ic]
fn fill_single(data: &mut [u16], ia: usize, ib: usize, ic: usize) -> bool {
    let (a, b, c) = (data[ia] as i32, data[ib] as i32, data[ic] as i32);
    if a == 0 || c == 0 {
        return false;
    }

    let err = tolerance(a, c);
    if is_fillable(b, a, c, err) && (a - c).abs() <= err {
        data[ib] = ((a + c) / 2) as u16;
        return true;
    }

    false
}

// bridges data[ib] and data[ic] from the anchors data[ia] and data[id]
fn fill_double(data: &mut [u16], ia: usize, ib: usize, ic: usize, id: usize) -> bool {
    let (a, b, c, d) = (
        data[ia] as i32,
        data[ib] as i32,
        data[ic] as i32,
        data[id] as i32,
    );
    if a == 0 || d == 0 || (b != 0 && c != 0) {
        return false;
    }

    let err = tolerance(a, d);
    if is_fillable(b, a, d, err) && is_fillable(c, a, d, err) && (a - d).abs() <= err {
        let tmp = (a - d).abs() / 4;
        let low = a.min(d);
        data[ib] = (low + tmp) as u16;
        data[ic] = (low + 3 * tmp) as u16;
        return true;
    }

    false
}

/// Fill small holes of a registered depth image in place.
///
/// Registration leaves one or two pixel gaps where the depth and color
/// pixels do not align. A pixel is filled with the mean of its two neighbors
/// when it is zero, or above both neighbors by more than 1%, and the
/// neighbors agree within 1% of their mean. With `double_holes`, gaps of two
/// pixels are bridged linearly from the pixels around them.
///
/// The image is scanned column by column and filled values are visible to
/// the following pixels. Vertical neighbors are tried first. When the
/// horizontal filling is disabled the rows just filled are skipped.
///
/// # Arguments
///
/// * `depth` - The registered depth in millimeters.
/// * `config` - Which neighbors to use.
pub fn fill_registered_depth_holes(depth: &mut Image<u16, 1>, config: &HoleFillingConfig) {
    let margin = if config.double_holes { 2 } else { 1 };
    let (cols, rows) = (depth.cols(), depth.rows());
    let data = depth.as_slice_mut();
    let idx = |x: usize, y: usize| y * cols + x;

    let mut filled = 0usize;
    for x in 1..cols.saturating_sub(margin) {
        let mut y = 1;
        while y < rows.saturating_sub(margin) {
            let mut set = false;

            if config.vertical {
                if fill_single(data, idx(x, y - 1), idx(x, y), idx(x, y + 1)) {
                    set = true;
                    if !config.horizontal {
                        y += 1;
                    }
                } else if config.double_holes
                    && fill_double(
                        data,
                        idx(x, y - 1),
                        idx(x, y),
                        idx(x, y + 1),
                        idx(x, y + 2),
                    )
                {
                    set = true;
                    if !config.horizontal {
                        y += 2;
                    }
                }
            }

            if !set && config.horizontal {
                set = fill_single(data, idx(x - 1, y), idx(x, y), idx(x + 1, y))
                    || (config.double_holes
                        && fill_double(
                            data,
                            idx(x - 1, y),
                            idx(x, y),
                            idx(x + 1, y),
                            idx(x + 2, y),
                        ));
            }

            filled += set as usize;
            y += 1;
        }
    }

    log::debug!("filled {filled} depth holes");
}
