/// A match between a point of the left image and a point of the right image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// The (x, y) feature point in the left image.
    pub left: [f32; 2],
    /// The (x, y) matched point in the right image.
    pub right: [f32; 2],
    /// Whether the match was found.
    pub valid: bool,
    /// The matching error of the search that produced the correspondence.
    pub error: Option<f32>,
}

impl Correspondence {
    /// Create a correspondence for a point that could not be matched.
    pub fn invalid(left: [f32; 2]) -> Self {
        Self {
            left,
            right: [0.0, 0.0],
            valid: false,
            error: None,
        }
    }

    /// The horizontal offset between the left and the right point.
    pub fn disparity(&self) -> f32 {
        self.left[0] - self.right[0]
    }
}
