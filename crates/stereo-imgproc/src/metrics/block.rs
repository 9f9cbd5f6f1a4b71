use serde::{Deserialize, Serialize};
use stereo_image::{Image, ImageError, ImageSize};

/// A sample window to be scored.
///
/// Both windows of a comparison must share the same variant and size.
#[derive(Clone, Copy, Debug)]
pub enum BlockWindow<'a> {
    /// 8-bit single channel intensity.
    Gray8(&'a Image<u8, 1>),
    /// 32-bit floating point single channel.
    Float32(&'a Image<f32, 1>),
    /// Packed two component 16-bit samples. The intensity of a pixel is the
    /// average of both components.
    PackedI16(&'a Image<i16, 2>),
}

impl BlockWindow<'_> {
    /// The size of the window in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            BlockWindow::Gray8(w) => w.size(),
            BlockWindow::Float32(w) => w.size(),
            BlockWindow::PackedI16(w) => w.size(),
        }
    }

    /// Name of the sample encoding of the window.
    pub fn encoding(&self) -> &'static str {
        match self {
            BlockWindow::Gray8(_) => "u8",
            BlockWindow::Float32(_) => "f32",
            BlockWindow::PackedI16(_) => "i16x2",
        }
    }
}

impl<'a> From<&'a Image<u8, 1>> for BlockWindow<'a> {
    fn from(image: &'a Image<u8, 1>) -> Self {
        BlockWindow::Gray8(image)
    }
}

impl<'a> From<&'a Image<f32, 1>> for BlockWindow<'a> {
    fn from(image: &'a Image<f32, 1>) -> Self {
        BlockWindow::Float32(image)
    }
}

impl<'a> From<&'a Image<i16, 2>> for BlockWindow<'a> {
    fn from(image: &'a Image<i16, 2>) -> Self {
        BlockWindow::PackedI16(image)
    }
}

/// The dissimilarity score used to compare two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockMetric {
    /// Sum of squared differences.
    #[default]
    Ssd,
    /// Sum of absolute differences.
    Sad,
}

impl BlockMetric {
    /// Score two windows with the selected metric.
    pub fn score(&self, left: BlockWindow, right: BlockWindow) -> Result<f32, ImageError> {
        match self {
            BlockMetric::Ssd => ssd(left, right),
            BlockMetric::Sad => sad(left, right),
        }
    }
}

fn accumulate(
    left: BlockWindow,
    right: BlockWindow,
    f: impl Fn(f32) -> f32,
) -> Result<f32, ImageError> {
    let (lsize, rsize) = (left.size(), right.size());
    if lsize != rsize {
        return Err(ImageError::InvalidImageSize(
            lsize.width,
            lsize.height,
            rsize.width,
            rsize.height,
        ));
    }

    let score = match (left, right) {
        (BlockWindow::Gray8(l), BlockWindow::Gray8(r)) => l
            .as_slice()
            .iter()
            .zip(r.as_slice())
            .fold(0f32, |acc, (&a, &b)| acc + f(a as f32 - b as f32)),
        (BlockWindow::Float32(l), BlockWindow::Float32(r)) => l
            .as_slice()
            .iter()
            .zip(r.as_slice())
            .fold(0f32, |acc, (&a, &b)| acc + f(a - b)),
        (BlockWindow::PackedI16(l), BlockWindow::PackedI16(r)) => l
            .as_slice()
            .chunks_exact(2)
            .zip(r.as_slice().chunks_exact(2))
            .fold(0f32, |acc, (a, b)| {
                let sa = a[0] as f32 * 0.5 + a[1] as f32 * 0.5;
                let sb = b[0] as f32 * 0.5 + b[1] as f32 * 0.5;
                acc + f(sa - sb)
            }),
        _ => {
            return Err(ImageError::MismatchedEncoding(
                left.encoding(),
                right.encoding(),
            ))
        }
    };

    Ok(score)
}

/// Compute the sum of squared differences between two windows.
///
/// $ SSD(a, b) = \sum_{i=1}^{N} (a_i - b_i)^2 $
///
/// # Arguments
///
/// * `left` - The first window.
/// * `right` - The second window, same size and encoding as `left`.
///
/// # Returns
///
/// The non negative dissimilarity score.
///
/// # Example
///
/// ```
/// use stereo_image::{Image, ImageSize};
/// use stereo_imgproc::metrics::ssd;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let a = Image::<u8, 1>::new(size, vec![10, 20]).unwrap();
/// let b = Image::<u8, 1>::new(size, vec![12, 17]).unwrap();
///
/// assert_eq!(ssd((&a).into(), (&b).into()).unwrap(), 13.0);
/// ```
///
/// # Errors
///
/// Returns an error if the windows differ in size or sample encoding.
pub fn ssd(left: BlockWindow, right: BlockWindow) -> Result<f32, ImageError> {
    accumulate(left, right, |d| d * d)
}

/// Compute the sum of absolute differences between two windows.
///
/// $ SAD(a, b) = \sum_{i=1}^{N} |a_i - b_i| $
///
/// # Errors
///
/// Returns an error if the windows differ in size or sample encoding.
pub fn sad(left: BlockWindow, right: BlockWindow) -> Result<f32, ImageError> {
    accumulate(left, right, |d| d.abs())
}
