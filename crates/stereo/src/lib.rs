#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use stereo_image as image;

#[doc(inline)]
pub use stereo_imgproc as imgproc;

#[doc(inline)]
pub use stereo_match as matching;

#[doc(inline)]
pub use stereo_depth as depth;
