//! Pixel interpolation methods.
//!
//! Sub-pixel sampling used by the stereo matchers when refining a
//! correspondence beyond the integer grid. Samples outside of the image
//! replicate the closest border pixel.

mod bilinear;
mod rect_sub_pix;

pub use bilinear::bilinear_interpolation;
pub use rect_sub_pix::get_rect_sub_pix;
